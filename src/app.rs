use crate::state::app_settings::AppSettings;
use crate::state::app_state::{AppState, DetailRequest};
use crate::state::messages::{NetworkRequest, NetworkResponse};
use crate::state::refresher::PollTick;
use crate::state::schedule_sync::ApplyOutcome;
use chrono::NaiveDate;
use log::error;
use tokio::sync::mpsc;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum MenuItem {
    #[default]
    Scores,
    GameDetail,
    News,
    Standings,
    Help,
}

pub struct App {
    pub settings: AppSettings,
    pub state: AppState,
}

impl App {
    pub fn new(settings: AppSettings, today: NaiveDate, ticks: mpsc::Sender<PollTick>) -> Self {
        let state = AppState::new(today, settings.poll_interval, ticks);
        Self { settings, state }
    }

    /// Initial load of the selected date.
    pub fn start(&mut self) -> Vec<NetworkRequest> {
        self.refresh_schedule()
    }

    // -----------------------------------------------------------------------
    // Tabs
    // -----------------------------------------------------------------------

    /// Switch tabs. News and standings load the first time they are opened.
    pub fn update_tab(&mut self, next: MenuItem) -> Vec<NetworkRequest> {
        if self.state.active_tab != next {
            self.state.previous_tab = self.state.active_tab;
            self.state.active_tab = next;
        }
        match next {
            MenuItem::News if self.state.news.page.is_none() && !self.state.news.loading => {
                self.start_news(None)
            }
            MenuItem::Standings if self.state.standings.needs_load() => self.load_standings(),
            _ => Vec::new(),
        }
    }

    pub fn exit_help(&mut self) {
        self.state.active_tab = match self.state.previous_tab {
            MenuItem::Help => MenuItem::Scores,
            previous => previous,
        };
    }

    pub fn toggle_show_logs(&mut self) {
        self.state.show_logs = !self.state.show_logs;
    }

    pub fn toggle_full_screen(&mut self) {
        self.settings.full_screen = !self.settings.full_screen;
    }

    // -----------------------------------------------------------------------
    // Schedule navigation
    // -----------------------------------------------------------------------

    pub fn select_date(&mut self, date: NaiveDate) -> Vec<NetworkRequest> {
        if date != self.state.schedule.date() {
            self.state.game_detail.deselect();
        }
        self.update_tab(MenuItem::Scores);
        self.state.scores_cursor = 0;
        let ticket = self.state.schedule.select_date(date);
        vec![NetworkRequest::LoadSchedule { ticket }]
    }

    pub fn step_date(&mut self, days: i64) -> Vec<NetworkRequest> {
        self.state.game_detail.deselect();
        self.update_tab(MenuItem::Scores);
        self.state.scores_cursor = 0;
        let ticket = self.state.schedule.step_date(days);
        vec![NetworkRequest::LoadSchedule { ticket }]
    }

    pub fn refresh_schedule(&mut self) -> Vec<NetworkRequest> {
        let ticket = self.state.schedule.refresh();
        vec![NetworkRequest::LoadSchedule { ticket }]
    }

    pub fn on_poll_tick(&mut self, tick: PollTick) -> Vec<NetworkRequest> {
        self.state
            .schedule
            .poll(tick)
            .map(|ticket| NetworkRequest::LoadSchedule { ticket })
            .into_iter()
            .collect()
    }

    pub fn move_scores_cursor(&mut self, delta: isize) {
        let len = self.state.schedule.games().len();
        self.state.scores_cursor = step_index(self.state.scores_cursor, delta, len);
    }

    pub fn game_at_cursor(&self) -> Option<i64> {
        self.state
            .schedule
            .games()
            .get(self.state.scores_cursor)
            .map(|g| g.id)
    }

    // -----------------------------------------------------------------------
    // Game detail
    // -----------------------------------------------------------------------

    pub fn toggle_game(&mut self, game_id: i64) -> Vec<NetworkRequest> {
        let Some(game) = self.state.schedule.game(game_id).cloned() else {
            self.state.notice = Some(format!(
                "No game {game_id} on {}.",
                self.state.schedule.date()
            ));
            return Vec::new();
        };
        match self.state.game_detail.toggle(&game) {
            Some(request) => {
                self.update_tab(MenuItem::GameDetail);
                detail_requests(request)
            }
            None => {
                self.update_tab(MenuItem::Scores);
                Vec::new()
            }
        }
    }

    pub fn close_game(&mut self) {
        self.state.game_detail.deselect();
        self.update_tab(MenuItem::Scores);
    }

    pub fn scroll_detail(&mut self, delta: i16) {
        let detail = &mut self.state.game_detail;
        detail.scroll_offset = detail.scroll_offset.saturating_add_signed(delta);
    }

    // -----------------------------------------------------------------------
    // News
    // -----------------------------------------------------------------------

    pub fn start_news(&mut self, topic: Option<String>) -> Vec<NetworkRequest> {
        let topic = topic
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| self.settings.topic.clone());
        let generation = self.state.news.start(&topic);
        self.state.news_cursor = 0;
        self.update_tab(MenuItem::News);
        vec![NetworkRequest::LoadNews { topic, generation }]
    }

    pub fn more_news(&mut self) -> Vec<NetworkRequest> {
        let news = &self.state.news;
        if news.page.is_none() && !news.loading {
            return self.start_news(None);
        }
        match self.state.news.request_more() {
            Some((page, generation)) => vec![NetworkRequest::LoadMoreNews { page, generation }],
            None => {
                let news = &self.state.news;
                let notice = if news.loading || news.loading_more {
                    "Still loading..."
                } else {
                    "No more stories."
                };
                self.state.notice = Some(notice.to_string());
                Vec::new()
            }
        }
    }

    pub fn move_news_cursor(&mut self, delta: isize) {
        let len = self.state.news.page.as_ref().map_or(0, |p| p.displayed().len());
        self.state.news_cursor = step_index(self.state.news_cursor, delta, len);
    }

    pub fn begin_topic_input(&mut self) {
        self.state.topic_input = Some(String::new());
    }

    pub fn cancel_topic_input(&mut self) {
        self.state.topic_input = None;
    }

    /// Start a session for the typed topic; an empty line uses the default.
    pub fn submit_topic(&mut self) -> Vec<NetworkRequest> {
        let topic = self.state.topic_input.take();
        self.start_news(topic)
    }

    // -----------------------------------------------------------------------
    // Standings
    // -----------------------------------------------------------------------

    pub fn load_standings(&mut self) -> Vec<NetworkRequest> {
        let generation = self.state.standings.start();
        vec![NetworkRequest::LoadStandings { generation }]
    }

    pub fn scroll_standings(&mut self, delta: i16) {
        let standings = &mut self.state.standings;
        standings.scroll_offset = standings.scroll_offset.saturating_add_signed(delta);
    }

    // -----------------------------------------------------------------------
    // Network responses. Returns follow-up requests and whether to redraw.
    // -----------------------------------------------------------------------

    pub fn on_network_response(&mut self, response: NetworkResponse) -> (Vec<NetworkRequest>, bool) {
        match response {
            NetworkResponse::ScheduleLoaded { ticket, result } => {
                match self.state.schedule.apply(ticket, result) {
                    ApplyOutcome::Replaced { .. } => {
                        self.state.last_error = None;
                        let len = self.state.schedule.games().len();
                        self.state.scores_cursor = self.state.scores_cursor.min(len.saturating_sub(1));
                        let follow_up = self
                            .state
                            .game_detail
                            .on_schedule_replaced(self.state.schedule.games())
                            .map(detail_requests)
                            .unwrap_or_default();
                        (follow_up, true)
                    }
                    ApplyOutcome::Cleared(err) => {
                        error!("schedule load failed: {err}");
                        self.state.game_detail.deselect();
                        self.state.scores_cursor = 0;
                        self.state.last_error = Some(err.user_message());
                        (Vec::new(), true)
                    }
                    ApplyOutcome::Swallowed(_) | ApplyOutcome::Stale => (Vec::new(), false),
                }
            }
            NetworkResponse::GameDetailLoaded { game_id, generation, result } => {
                if let Err(err) = &result {
                    error!("game detail for {game_id} failed: {err}");
                }
                let applied = self.state.game_detail.on_detail(game_id, generation, result);
                let follow_up = self
                    .state
                    .game_detail
                    .insight_request()
                    .map(|(request, selection)| NetworkRequest::LoadInsights { game_id, selection, request })
                    .into_iter()
                    .collect();
                (follow_up, applied)
            }
            NetworkResponse::HighlightResolved { game_id, selection, video } => {
                let found = video.is_some();
                let applied = self.state.game_detail.on_highlight(game_id, selection, video);
                (Vec::new(), applied && found)
            }
            NetworkResponse::InsightsResolved { game_id, selection, insights } => {
                let applied = self.state.game_detail.on_insights(game_id, selection, insights);
                (Vec::new(), applied)
            }
            NetworkResponse::NewsLoaded { generation, result } => {
                if let Err(err) = &result {
                    error!("news load failed: {err}");
                }
                (Vec::new(), self.state.news.on_loaded(generation, result))
            }
            NetworkResponse::MoreNewsLoaded { generation, result } => {
                if let Err(err) = &result {
                    error!("news page failed: {err}");
                }
                (Vec::new(), self.state.news.on_more_loaded(generation, result))
            }
            NetworkResponse::StandingsLoaded { generation, result } => {
                if let Err(err) = &result {
                    error!("standings load failed: {err}");
                }
                (Vec::new(), self.state.standings.on_loaded(generation, result))
            }
        }
    }
}

fn detail_requests(request: DetailRequest) -> Vec<NetworkRequest> {
    let mut requests = vec![NetworkRequest::LoadGameDetail {
        game_id: request.game_id,
        generation: request.generation,
    }];
    if let Some((game, selection)) = request.highlight {
        requests.push(NetworkRequest::LoadHighlight { game, selection });
    }
    requests
}

/// Move `index` by `delta` within `0..len`, clamping at both ends.
fn step_index(index: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    index.saturating_add_signed(delta).min(len - 1)
}
