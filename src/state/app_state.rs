use crate::app::MenuItem;
use crate::state::enrichment::PageState;
use crate::state::refresher::PollTick;
use crate::state::schedule_sync::ScheduleSync;
use chrono::NaiveDate;
use log::debug;
use puck_api::feeds::InsightRequest;
use puck_api::{ApiError, ApiResult, DivisionStandings, GameDetail, GameSummary, VideoRef};
use std::time::Duration;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// Game detail state
// ---------------------------------------------------------------------------

/// A detail request to issue for the selected game.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailRequest {
    pub game_id: i64,
    pub generation: u64,
    /// Set when a highlight lookup should go out alongside the detail.
    pub highlight: Option<(GameSummary, u64)>,
}

#[derive(Debug, Default)]
pub struct GameDetailState {
    pub selected: Option<GameSummary>,
    pub detail: Option<GameDetail>,
    pub highlight: Option<VideoRef>,
    /// Plain-text summary; `None` hides the panel.
    pub insights: Option<String>,
    pub loading: bool,
    pub error: Option<ApiError>,
    pub scroll_offset: u16,
    /// One insights request per selection.
    insights_requested: bool,
    /// Bumped on every detail request.
    generation: u64,
    /// Bumped on every select / deselect.
    selection: u64,
}

impl GameDetailState {
    pub fn selected_id(&self) -> Option<i64> {
        self.selected.as_ref().map(|g| g.id)
    }

    /// Select `game`, or deselect it if it is already selected.
    pub fn toggle(&mut self, game: &GameSummary) -> Option<DetailRequest> {
        if self.selected_id() == Some(game.id) {
            self.deselect();
            return None;
        }
        self.selection += 1;
        self.selected = Some(game.clone());
        self.highlight = None;
        self.insights = None;
        self.insights_requested = false;
        self.scroll_offset = 0;
        let mut request = self.request_detail(game.id);
        if game.state.is_finished() {
            request.highlight = Some((game.clone(), self.selection));
        }
        Some(request)
    }

    pub fn deselect(&mut self) {
        if let Some(id) = self.selected_id() {
            debug!("deselecting game {id}");
        }
        self.selection += 1;
        self.generation += 1;
        self.selected = None;
        self.detail = None;
        self.highlight = None;
        self.insights = None;
        self.insights_requested = false;
        self.scroll_offset = 0;
        self.loading = false;
        self.error = None;
    }

    /// The schedule list was replaced: drop the detail and re-request it if
    /// the game is still listed, otherwise deselect.
    pub fn on_schedule_replaced(&mut self, games: &[GameSummary]) -> Option<DetailRequest> {
        let id = self.selected_id()?;
        let Some(game) = games.iter().find(|g| g.id == id) else {
            self.deselect();
            return None;
        };
        let finished_now = game.state.is_finished()
            && !self.selected.as_ref().is_some_and(|g| g.state.is_finished());
        self.selected = Some(game.clone());
        let mut request = self.request_detail(id);
        if finished_now {
            request.highlight = Some((game.clone(), self.selection));
        }
        Some(request)
    }

    pub fn on_detail(&mut self, game_id: i64, generation: u64, result: ApiResult<GameDetail>) -> bool {
        if generation != self.generation || self.selected_id() != Some(game_id) {
            debug!("dropping stale detail for game {game_id}");
            return false;
        }
        self.loading = false;
        match result {
            Ok(detail) => {
                self.detail = Some(detail);
                self.error = None;
            }
            Err(err) => {
                self.detail = None;
                self.error = Some(err);
            }
        }
        true
    }

    pub fn on_highlight(&mut self, game_id: i64, selection: u64, video: Option<VideoRef>) -> bool {
        if selection != self.selection || self.selected_id() != Some(game_id) {
            return false;
        }
        self.highlight = video;
        true
    }

    /// Claim the insights request for the current selection once its detail
    /// has loaded. Games that have not started yet are skipped.
    pub fn insight_request(&mut self) -> Option<(InsightRequest, u64)> {
        if self.insights_requested {
            return None;
        }
        let game = self.selected.as_ref()?;
        if !game.state.is_live() && !game.state.is_finished() {
            return None;
        }
        let detail = self.detail.as_ref()?;
        self.insights_requested = true;
        Some((InsightRequest::new(game, detail), self.selection))
    }

    pub fn on_insights(&mut self, game_id: i64, selection: u64, insights: Option<String>) -> bool {
        if selection != self.selection || self.selected_id() != Some(game_id) {
            return false;
        }
        self.insights = insights;
        true
    }

    fn request_detail(&mut self, game_id: i64) -> DetailRequest {
        self.generation += 1;
        self.detail = None;
        self.error = None;
        self.loading = true;
        DetailRequest { game_id, generation: self.generation, highlight: None }
    }
}

// ---------------------------------------------------------------------------
// News session state
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct NewsState {
    pub topic: String,
    pub page: Option<PageState>,
    pub loading: bool,
    pub loading_more: bool,
    pub error: Option<ApiError>,
    generation: u64,
}

impl NewsState {
    /// Start a new session for `topic`; returns its generation.
    pub fn start(&mut self, topic: &str) -> u64 {
        self.generation += 1;
        self.topic = topic.to_owned();
        self.page = None;
        self.loading = true;
        self.loading_more = false;
        self.error = None;
        self.generation
    }

    /// Claim the next page load. Refused while anything is in flight or
    /// nothing is left.
    pub fn request_more(&mut self) -> Option<(PageState, u64)> {
        if self.loading || self.loading_more {
            return None;
        }
        let page = self.page.as_ref().filter(|p| p.has_more())?.clone();
        self.loading_more = true;
        Some((page, self.generation))
    }

    pub fn on_loaded(&mut self, generation: u64, result: ApiResult<PageState>) -> bool {
        if generation != self.generation {
            return false;
        }
        self.loading = false;
        match result {
            Ok(page) => {
                self.page = Some(page);
                self.error = None;
            }
            Err(err) => {
                self.page = None;
                self.error = Some(err);
            }
        }
        true
    }

    /// A failed page leaves what is already shown in place.
    pub fn on_more_loaded(&mut self, generation: u64, result: ApiResult<PageState>) -> bool {
        if generation != self.generation {
            return false;
        }
        self.loading_more = false;
        match result {
            Ok(page) => {
                self.page = Some(page);
                self.error = None;
            }
            Err(err) => self.error = Some(err),
        }
        true
    }

    /// False after a quota or credential failure.
    pub fn can_retry(&self) -> bool {
        self.error.as_ref().is_none_or(ApiError::is_retryable)
    }
}

// ---------------------------------------------------------------------------
// Standings state
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct StandingsState {
    pub divisions: Vec<DivisionStandings>,
    pub loading: bool,
    pub error: Option<ApiError>,
    pub scroll_offset: u16,
    loaded: bool,
    generation: u64,
}

impl StandingsState {
    /// True until the first load has been issued.
    pub fn needs_load(&self) -> bool {
        !self.loaded && !self.loading
    }

    pub fn start(&mut self) -> u64 {
        self.generation += 1;
        self.loading = true;
        self.error = None;
        self.generation
    }

    /// A failed reload keeps the last table.
    pub fn on_loaded(&mut self, generation: u64, result: ApiResult<Vec<DivisionStandings>>) -> bool {
        if generation != self.generation {
            return false;
        }
        self.loading = false;
        self.loaded = true;
        match result {
            Ok(divisions) => {
                self.divisions = divisions;
                self.error = None;
            }
            Err(err) => self.error = Some(err),
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AppState {
    pub schedule: ScheduleSync,
    pub game_detail: GameDetailState,
    pub news: NewsState,
    pub standings: StandingsState,
    pub active_tab: MenuItem,
    pub previous_tab: MenuItem,
    /// Highlighted row in the scores table.
    pub scores_cursor: usize,
    /// Highlighted story in the news list.
    pub news_cursor: usize,
    /// Topic being typed on the news tab.
    pub topic_input: Option<String>,
    pub show_logs: bool,
    pub last_error: Option<String>,
    /// One-off message, cleared by the next key press.
    pub notice: Option<String>,
}

impl AppState {
    pub fn new(date: NaiveDate, poll_interval: Duration, ticks: mpsc::Sender<PollTick>) -> Self {
        Self {
            schedule: ScheduleSync::new(date, poll_interval, ticks),
            game_detail: GameDetailState::default(),
            news: NewsState::default(),
            standings: StandingsState::default(),
            active_tab: MenuItem::default(),
            previous_tab: MenuItem::default(),
            scores_cursor: 0,
            news_cursor: 0,
            topic_input: None,
            show_logs: false,
            last_error: None,
            notice: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::enrichment::EnrichmentPager;
    use crate::state::fakes::FakeSummarizer;
    use puck_api::{GameState, RawFeedItem};

    fn game(id: i64, state: GameState) -> GameSummary {
        GameSummary { id, state, ..Default::default() }
    }

    #[test]
    fn selecting_twice_deselects() {
        let mut state = GameDetailState::default();
        let g = game(1, GameState::Live);
        let request = state.toggle(&g).unwrap();
        assert_eq!(request.game_id, 1);
        assert!(request.highlight.is_none());
        assert!(state.toggle(&g).is_none());
        assert_eq!(state.selected_id(), None);
        assert!(!state.on_detail(1, request.generation, Ok(GameDetail::default())));
    }

    #[test]
    fn finished_game_requests_highlight() {
        let mut state = GameDetailState::default();
        let request = state.toggle(&game(2, GameState::Final)).unwrap();
        let (for_game, selection) = request.highlight.unwrap();
        assert_eq!(for_game.id, 2);
        assert!(state.on_highlight(2, selection, Some(VideoRef { video_id: "v".into() })));
        assert!(state.highlight.is_some());
    }

    #[test]
    fn stale_detail_is_dropped() {
        let mut state = GameDetailState::default();
        let first = state.toggle(&game(1, GameState::Live)).unwrap();
        let second = state.toggle(&game(2, GameState::Live)).unwrap();
        assert!(!state.on_detail(1, first.generation, Ok(GameDetail { game_id: 1, ..Default::default() })));
        assert!(state.on_detail(2, second.generation, Ok(GameDetail { game_id: 2, ..Default::default() })));
        assert_eq!(state.detail.as_ref().map(|d| d.game_id), Some(2));
    }

    #[test]
    fn schedule_replace_rerequests_or_deselects() {
        let mut state = GameDetailState::default();
        let first = state.toggle(&game(1, GameState::Live)).unwrap();
        state.on_detail(1, first.generation, Ok(GameDetail::default()));

        let again = state.on_schedule_replaced(&[game(1, GameState::Live)]).unwrap();
        assert!(state.detail.is_none());
        assert!(again.generation > first.generation);
        assert!(again.highlight.is_none());

        let gone = state.on_schedule_replaced(&[game(9, GameState::Live)]);
        assert!(gone.is_none());
        assert_eq!(state.selected_id(), None);
    }

    #[test]
    fn game_going_final_triggers_highlight_once() {
        let mut state = GameDetailState::default();
        state.toggle(&game(1, GameState::Critical));
        let finished = state.on_schedule_replaced(&[game(1, GameState::Final)]).unwrap();
        assert!(finished.highlight.is_some());
        let later = state.on_schedule_replaced(&[game(1, GameState::Official)]).unwrap();
        assert!(later.highlight.is_none());
    }

    #[test]
    fn insights_requested_once_per_selection_after_detail() {
        let mut state = GameDetailState::default();
        let g = game(3, GameState::Live);
        let first = state.toggle(&g).unwrap();
        assert!(state.insight_request().is_none(), "detail not loaded yet");

        state.on_detail(3, first.generation, Ok(GameDetail { game_id: 3, ..Default::default() }));
        let (request, selection) = state.insight_request().unwrap();
        assert!(request.prompt().starts_with("Summarize:"));
        assert!(state.insight_request().is_none());

        // A live refresh re-requests the detail but not the insights.
        let again = state.on_schedule_replaced(&[g]).unwrap();
        state.on_detail(3, again.generation, Ok(GameDetail { game_id: 3, ..Default::default() }));
        assert!(state.insight_request().is_none());

        assert!(state.on_insights(3, selection, Some("- close game".into())));
        assert_eq!(state.insights.as_deref(), Some("- close game"));
    }

    #[test]
    fn insights_failure_hides_panel_and_stale_answers_drop() {
        let mut state = GameDetailState::default();
        let first = state.toggle(&game(4, GameState::Final)).unwrap();
        state.on_detail(4, first.generation, Ok(GameDetail::default()));
        let (_, old_selection) = state.insight_request().unwrap();
        assert!(state.on_insights(4, old_selection, None));
        assert_eq!(state.insights, None);

        state.deselect();
        let second = state.toggle(&game(4, GameState::Final)).unwrap();
        state.on_detail(4, second.generation, Ok(GameDetail::default()));
        let (_, selection) = state.insight_request().unwrap();
        assert_ne!(selection, old_selection);
        assert!(!state.on_insights(4, old_selection, Some("late".into())));
        assert_eq!(state.insights, None);
    }

    #[test]
    fn scheduled_games_get_no_insights() {
        let mut state = GameDetailState::default();
        let request = state.toggle(&game(5, GameState::Scheduled)).unwrap();
        state.on_detail(5, request.generation, Ok(GameDetail::default()));
        assert!(state.insight_request().is_none());
    }

    #[test]
    fn standings_reload_failure_keeps_table() {
        let mut standings = StandingsState::default();
        assert!(standings.needs_load());
        let first = standings.start();
        assert!(!standings.needs_load());
        let table = vec![DivisionStandings { division: "Pacific".into(), ..Default::default() }];
        assert!(standings.on_loaded(first, Ok(table)));

        let stale = standings.start();
        let fresh = standings.start();
        assert!(!standings.on_loaded(stale, Ok(Vec::new())));
        assert!(standings.on_loaded(fresh, Err(ApiError::Http { status: 502, url: "u".into() })));
        assert_eq!(standings.divisions.len(), 1);
        assert!(standings.error.is_some());
        assert!(!standings.needs_load());
    }

    fn items(n: usize) -> Vec<RawFeedItem> {
        (0..n)
            .map(|i| RawFeedItem { title: format!("t{i}"), source: "ESPN".into(), ..Default::default() })
            .collect()
    }

    #[tokio::test]
    async fn news_more_failure_keeps_page_and_flags_quota() {
        let pager = EnrichmentPager::new(["ESPN"], 6);
        let summarizer = FakeSummarizer::default();
        let mut news = NewsState::default();

        let generation = news.start("NHL");
        assert!(news.request_more().is_none(), "initial load in flight");
        let page = pager.initialize(items(14), &summarizer).await;
        assert!(news.on_loaded(generation, page));

        let (page, generation) = news.request_more().unwrap();
        assert!(news.request_more().is_none(), "one load-more at a time");
        summarizer.fail_with(ApiError::QuotaExceeded("limit".into()));
        let result = pager.load_more(&page, &summarizer).await;
        assert!(news.on_more_loaded(generation, result));

        assert_eq!(news.page.as_ref().map(|p| p.displayed().len()), Some(6));
        assert!(!news.can_retry());
        assert!(news.request_more().is_some());
    }

    #[tokio::test]
    async fn results_from_previous_session_are_dropped() {
        let pager = EnrichmentPager::new(["ESPN"], 6);
        let summarizer = FakeSummarizer::default();
        let mut news = NewsState::default();

        let old = news.start("NHL");
        let fresh = news.start("trades");
        let late = pager.initialize(items(3), &summarizer).await;
        assert!(!news.on_loaded(old, late));
        assert!(news.loading);

        let page = pager.initialize(items(2), &summarizer).await;
        assert!(news.on_loaded(fresh, page));
        assert_eq!(news.topic, "trades");
        assert_eq!(news.page.as_ref().map(|p| p.displayed().len()), Some(2));
    }
}
