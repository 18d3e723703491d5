use crate::app::{App, MenuItem};
use crate::state::messages::NetworkRequest;
use chrono::Local;
use crossterm::event::KeyCode::Char;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Key reference shown on the help tab.
pub const HELP: &[(&str, &str)] = &[
    ("1 2 3 4", "Scores, Game, News, Standings"),
    ("? / Esc", "open / close this help"),
    ("h l  ← →", "previous / next day"),
    ("t", "jump back to today"),
    ("r", "reload the current tab"),
    ("j k  ↑ ↓", "move or scroll"),
    ("Enter", "show or hide the highlighted game"),
    ("Esc", "close the game"),
    ("n", "reload news for the default topic"),
    ("/", "type a news topic, Enter to load"),
    ("m", "load more stories"),
    ("f", "full screen"),
    ("\"", "show logs"),
    ("q", "quit"),
];

/// What the main loop should do after a key press.
#[derive(Debug, Default)]
pub struct Dispatch {
    pub requests: Vec<NetworkRequest>,
    pub quit: bool,
}

pub fn handle_key_bindings(key_event: KeyEvent, app: &mut App) -> Dispatch {
    let mut dispatch = Dispatch::default();
    app.state.notice = None;

    if key_event.code == Char('c') && key_event.modifiers.contains(KeyModifiers::CONTROL) {
        dispatch.quit = true;
        return dispatch;
    }

    if let Some(topic) = app.state.topic_input.as_mut() {
        match key_event.code {
            KeyCode::Enter => dispatch.requests = app.submit_topic(),
            KeyCode::Esc => app.cancel_topic_input(),
            KeyCode::Backspace => {
                topic.pop();
            }
            Char(c) => topic.push(c),
            _ => {}
        }
        return dispatch;
    }

    match (app.state.active_tab, key_event.code, key_event.modifiers) {
        (_, Char('q'), _) => dispatch.quit = true,

        // Tab switching
        (_, Char('1'), _) => dispatch.requests = app.update_tab(MenuItem::Scores),
        (_, Char('2'), _) => dispatch.requests = app.update_tab(MenuItem::GameDetail),
        (_, Char('3'), _) => dispatch.requests = app.update_tab(MenuItem::News),
        (_, Char('4'), _) => dispatch.requests = app.update_tab(MenuItem::Standings),
        (_, Char('?'), _) => dispatch.requests = app.update_tab(MenuItem::Help),
        (MenuItem::Help, KeyCode::Esc, _) => app.exit_help(),

        // Scores
        (MenuItem::Scores, Char('j') | KeyCode::Down, _) => app.move_scores_cursor(1),
        (MenuItem::Scores, Char('k') | KeyCode::Up, _) => app.move_scores_cursor(-1),
        (MenuItem::Scores, KeyCode::Enter, _) => {
            if let Some(game_id) = app.game_at_cursor() {
                dispatch.requests = app.toggle_game(game_id);
            }
        }

        // Game detail
        (MenuItem::GameDetail, Char('j') | KeyCode::Down, _) => app.scroll_detail(1),
        (MenuItem::GameDetail, Char('k') | KeyCode::Up, _) => app.scroll_detail(-1),
        (MenuItem::GameDetail, KeyCode::Esc, _) => app.close_game(),

        // Date navigation works from the scores and game tabs
        (MenuItem::Scores | MenuItem::GameDetail, Char('h') | KeyCode::Left, _) => {
            dispatch.requests = app.step_date(-1)
        }
        (MenuItem::Scores | MenuItem::GameDetail, Char('l') | KeyCode::Right, _) => {
            dispatch.requests = app.step_date(1)
        }
        (MenuItem::Scores | MenuItem::GameDetail, Char('t'), _) => {
            dispatch.requests = app.select_date(Local::now().date_naive())
        }
        (MenuItem::Scores | MenuItem::GameDetail, Char('r'), _) => {
            dispatch.requests = app.refresh_schedule()
        }

        // News
        (MenuItem::News, Char('j') | KeyCode::Down, _) => app.move_news_cursor(1),
        (MenuItem::News, Char('k') | KeyCode::Up, _) => app.move_news_cursor(-1),
        (MenuItem::News, Char('m'), _) => dispatch.requests = app.more_news(),
        (MenuItem::News, Char('n') | Char('r'), _) => dispatch.requests = app.start_news(None),
        (MenuItem::News, Char('/'), _) => app.begin_topic_input(),

        // Standings
        (MenuItem::Standings, Char('j') | KeyCode::Down, _) => app.scroll_standings(1),
        (MenuItem::Standings, Char('k') | KeyCode::Up, _) => app.scroll_standings(-1),
        (MenuItem::Standings, Char('r'), _) => dispatch.requests = app.load_standings(),

        // Global
        (_, Char('f'), _) => app.toggle_full_screen(),
        (_, Char('"'), _) => app.toggle_show_logs(),

        _ => {}
    }
    dispatch
}
