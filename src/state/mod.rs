pub mod app_settings;
pub mod app_state;
pub mod enrichment;
pub mod highlight;
pub mod insights;
pub mod messages;
pub mod network;
pub mod refresher;
pub mod schedule_sync;

#[cfg(test)]
pub mod fakes;
