use chrono::NaiveDate;
use log::debug;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::interval;

/// Emitted by a running [`PollTimer`] for the date it was started on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTick {
    pub date: NaiveDate,
}

/// Repeating live-score poll for one date.
///
/// Owns its task: dropping the timer (or calling `cancel`) aborts it, so a
/// date change or teardown can never leave a stray poller behind.
#[derive(Debug)]
pub struct PollTimer {
    date: NaiveDate,
    handle: JoinHandle<()>,
}

impl PollTimer {
    pub fn start(date: NaiveDate, every: Duration, ticks: mpsc::Sender<PollTick>) -> Self {
        debug!("starting live poll for {date} every {}s", every.as_secs());
        let handle = tokio::spawn(async move {
            let mut poll_interval = interval(every);
            // Skip the immediate first tick; the explicit fetch already ran.
            poll_interval.tick().await;

            loop {
                poll_interval.tick().await;
                if ticks.send(PollTick { date }).await.is_err() {
                    break;
                }
            }
        });
        Self { date, handle }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn cancel(self) {
        debug!("stopping live poll for {}", self.date);
    }
}

impl Drop for PollTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
