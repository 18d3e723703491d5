use crate::state::enrichment::PageState;
use crate::state::schedule_sync::FetchTicket;
use crossterm::event::KeyEvent;
use puck_api::feeds::InsightRequest;
use puck_api::{ApiResult, DivisionStandings, GameDetail, GameSummary, VideoRef};

#[derive(Debug, Clone)]
pub enum NetworkRequest {
    LoadSchedule { ticket: FetchTicket },
    LoadGameDetail { game_id: i64, generation: u64 },
    /// Only issued for finished games.
    LoadHighlight { game: GameSummary, selection: u64 },
    LoadInsights { game_id: i64, selection: u64, request: InsightRequest },
    LoadNews { topic: String, generation: u64 },
    LoadMoreNews { page: PageState, generation: u64 },
    LoadStandings { generation: u64 },
}

#[derive(Debug)]
pub enum NetworkResponse {
    ScheduleLoaded { ticket: FetchTicket, result: ApiResult<Vec<GameSummary>> },
    GameDetailLoaded { game_id: i64, generation: u64, result: ApiResult<GameDetail> },
    HighlightResolved { game_id: i64, selection: u64, video: Option<VideoRef> },
    InsightsResolved { game_id: i64, selection: u64, insights: Option<String> },
    NewsLoaded { generation: u64, result: ApiResult<PageState> },
    MoreNewsLoaded { generation: u64, result: ApiResult<PageState> },
    StandingsLoaded { generation: u64, result: ApiResult<Vec<DivisionStandings>> },
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    AppStarted,
    KeyPressed(KeyEvent),
    Resize,
}
