//! Schedule list for the selected date, with live polling.
//!
//! Every fetch is issued as a [`FetchTicket`] stamped with the generation
//! current at issue time. A result is applied only if no newer fetch has been
//! issued since, so a slow answer for an old date can never overwrite the
//! current selection.
use crate::state::refresher::{PollTick, PollTimer};
use chrono::{Days, NaiveDate};
use log::{debug, warn};
use puck_api::feeds::ScheduleFeed;
use puck_api::{ApiError, ApiResult, GameSummary};
use std::time::Duration;
use tokio::sync::mpsc;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// User initiated: clears the list up front and surfaces failures.
    Explicit,
    /// Background poll: failures are swallowed and the list is kept.
    Silent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub date: NaiveDate,
    pub generation: u64,
    pub mode: FetchMode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyncPhase {
    #[default]
    Idle,
    Fetching,
    Settled { live: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    /// List replaced wholesale.
    Replaced { live: bool },
    /// Explicit fetch failed; list left empty and the error recorded.
    Cleared(ApiError),
    /// Silent poll failed; nothing changed.
    Swallowed(ApiError),
    /// A newer fetch was issued after this one; result dropped.
    Stale,
}

#[derive(Debug)]
pub struct ScheduleSync {
    date: NaiveDate,
    games: Vec<GameSummary>,
    generation: u64,
    phase: SyncPhase,
    error: Option<ApiError>,
    /// Generation of the silent fetch still awaiting its result.
    silent_in_flight: Option<u64>,
    poll_interval: Duration,
    ticks: mpsc::Sender<PollTick>,
    timer: Option<PollTimer>,
}

impl ScheduleSync {
    pub fn new(date: NaiveDate, poll_interval: Duration, ticks: mpsc::Sender<PollTick>) -> Self {
        Self {
            date,
            games: Vec::new(),
            generation: 0,
            phase: SyncPhase::Idle,
            error: None,
            silent_in_flight: None,
            poll_interval,
            ticks,
            timer: None,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn games(&self) -> &[GameSummary] {
        &self.games
    }

    pub fn game(&self, game_id: i64) -> Option<&GameSummary> {
        self.games.iter().find(|g| g.id == game_id)
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    pub fn error(&self) -> Option<&ApiError> {
        self.error.as_ref()
    }

    pub fn is_polling(&self) -> bool {
        self.timer.is_some()
    }

    /// Switch to `date` and issue an explicit fetch for it.
    pub fn select_date(&mut self, date: NaiveDate) -> FetchTicket {
        if date != self.date {
            debug!("schedule date {} -> {date}", self.date);
        }
        self.date = date;
        self.issue_explicit()
    }

    /// Explicit re-fetch of the current date.
    pub fn refresh(&mut self) -> FetchTicket {
        self.issue_explicit()
    }

    /// Move the selection by whole days, forwards or back.
    pub fn step_date(&mut self, days: i64) -> FetchTicket {
        let offset = Days::new(days.unsigned_abs());
        let target = if days >= 0 {
            self.date.checked_add_days(offset)
        } else {
            self.date.checked_sub_days(offset)
        };
        self.select_date(target.unwrap_or(self.date))
    }

    /// A timer tick. Issues a silent fetch only while the current date is
    /// live, the tick belongs to it and no other fetch is outstanding.
    pub fn poll(&mut self, tick: PollTick) -> Option<FetchTicket> {
        let armed_for = self.timer.as_ref().map(PollTimer::date);
        if armed_for != Some(tick.date) || tick.date != self.date {
            debug!("ignoring poll tick for {}", tick.date);
            return None;
        }
        if self.phase != (SyncPhase::Settled { live: true }) {
            return None;
        }
        if let Some(generation) = self.silent_in_flight {
            debug!("skipping poll for {}: gen {generation} still in flight", self.date);
            return None;
        }
        let ticket = self.issue(FetchMode::Silent);
        self.silent_in_flight = Some(ticket.generation);
        Some(ticket)
    }

    /// Apply a resolved fetch.
    pub fn apply(&mut self, ticket: FetchTicket, result: ApiResult<Vec<GameSummary>>) -> ApplyOutcome {
        if self.silent_in_flight == Some(ticket.generation) {
            self.silent_in_flight = None;
        }
        if ticket.generation != self.generation || ticket.date != self.date {
            debug!(
                "dropping stale schedule for {} (gen {} < {})",
                ticket.date, ticket.generation, self.generation
            );
            return ApplyOutcome::Stale;
        }

        match (result, ticket.mode) {
            (Ok(games), _) => {
                let live = games.iter().any(GameSummary::is_live);
                debug!("schedule for {}: {} games, live={live}", self.date, games.len());
                self.games = games;
                self.error = None;
                self.phase = SyncPhase::Settled { live };
                self.schedule_poll(live);
                ApplyOutcome::Replaced { live }
            }
            (Err(err), FetchMode::Explicit) => {
                self.games.clear();
                self.error = Some(err.clone());
                self.phase = SyncPhase::Idle;
                self.cancel_poll();
                ApplyOutcome::Cleared(err)
            }
            (Err(err), FetchMode::Silent) => {
                warn!("live poll for {} failed, keeping last scores: {err}", self.date);
                ApplyOutcome::Swallowed(err)
            }
        }
    }

    /// Stop polling and make every in-flight fetch stale.
    pub fn teardown(&mut self) {
        self.cancel_poll();
        self.silent_in_flight = None;
        self.generation += 1;
        self.phase = SyncPhase::Idle;
    }

    /// Run one explicit fetch for `date` against `feed` and apply it.
    pub async fn fetch(
        &mut self,
        feed: &dyn ScheduleFeed,
        date: NaiveDate,
    ) -> ApiResult<Vec<GameSummary>> {
        let ticket = self.select_date(date);
        let result = feed.games_on(date).await;
        match self.apply(ticket, result) {
            ApplyOutcome::Cleared(err) | ApplyOutcome::Swallowed(err) => Err(err),
            ApplyOutcome::Replaced { .. } | ApplyOutcome::Stale => Ok(self.games.clone()),
        }
    }

    fn issue_explicit(&mut self) -> FetchTicket {
        self.cancel_poll();
        self.silent_in_flight = None;
        self.games.clear();
        self.error = None;
        self.phase = SyncPhase::Fetching;
        self.issue(FetchMode::Explicit)
    }

    fn issue(&mut self, mode: FetchMode) -> FetchTicket {
        self.generation += 1;
        FetchTicket { date: self.date, generation: self.generation, mode }
    }

    fn schedule_poll(&mut self, live: bool) {
        if !live {
            self.cancel_poll();
            return;
        }
        if self.timer.as_ref().map(PollTimer::date) != Some(self.date) {
            self.cancel_poll();
            self.timer = Some(PollTimer::start(self.date, self.poll_interval, self.ticks.clone()));
        }
    }

    fn cancel_poll(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
    }
}

impl Drop for ScheduleSync {
    fn drop(&mut self) {
        self.cancel_poll();
    }
}
