mod app;
mod cli;
mod draw;
mod keys;
mod state;
mod ui;

use crate::app::App;
use crate::cli::{Cli, Mode};
use crate::state::app_settings::AppSettings;
use crate::state::enrichment::EnrichmentPager;
use crate::state::messages::{NetworkRequest, NetworkResponse, UiEvent};
use crate::state::network::{Feeds, NetworkWorker};
use crate::state::refresher::PollTick;
use crate::state::schedule_sync::ScheduleSync;
use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::Parser;
use crossterm::event::{self as crossterm_event, Event};
use crossterm::{cursor, execute, terminal};
use log::error;
use puck_api::feeds::{ContentFeed, GameDetailFeed, StandingsFeed};
use std::io::Stdout;
use std::{io, panic};
use tokio::sync::mpsc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use tui::{Terminal, backend::CrosstermBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    better_panic::install();

    let cli = Cli::parse();
    let settings = AppSettings::load(&cli.options);

    let Some(mode) = cli.command else {
        return run_interactive(settings).await;
    };

    init_logging(&settings);
    match mode {
        Mode::Scores { date } => print_scores(&settings, date).await,
        Mode::Game { id } => print_game(&settings, id).await,
        Mode::News { topic, pages } => print_news(&settings, topic, pages).await,
        Mode::Standings => print_standings(&settings).await,
    }
}

/// One-shot logging goes to stderr so stdout carries only JSON.
fn init_logging(settings: &AppSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_level.to_string().to_lowercase()));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

// ---------------------------------------------------------------------------
// Interactive mode
// ---------------------------------------------------------------------------

async fn run_interactive(settings: AppSettings) -> anyhow::Result<()> {
    let backend = CrosstermBackend::new(io::stdout());
    let terminal = Terminal::new(backend)?;

    setup_panic_hook();
    setup_terminal()?;

    tui_logger::init_logger(settings.log_level)?;
    tui_logger::set_default_level(settings.log_level);

    let feeds = Feeds::from_settings(&settings);
    let pager = EnrichmentPager::new(&settings.trusted_sources, settings.page_size);

    let (ui_event_tx, ui_event_rx) = mpsc::channel::<UiEvent>(100);
    let (network_req_tx, network_req_rx) = mpsc::channel::<NetworkRequest>(100);
    let (network_resp_tx, network_resp_rx) = mpsc::channel::<NetworkResponse>(100);
    let (poll_tx, poll_rx) = mpsc::channel::<PollTick>(8);

    let mut app = App::new(settings, Local::now().date_naive(), poll_tx);

    // Input handler thread
    let input_handler = tokio::spawn(input_handler_task(ui_event_tx.clone()));

    // Network thread
    let network_worker = NetworkWorker::new(feeds, pager, network_req_rx, network_resp_tx);
    let network_task = tokio::spawn(network_worker.run());

    let _ = ui_event_tx.send(UiEvent::AppStarted).await;

    main_ui_loop(terminal, &mut app, ui_event_rx, network_req_tx, network_resp_rx, poll_rx).await;

    app.state.schedule.teardown();
    input_handler.abort();
    network_task.abort();

    cleanup_terminal()?;
    Ok(())
}

async fn main_ui_loop(
    mut terminal: Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    mut ui_events: mpsc::Receiver<UiEvent>,
    network_requests: mpsc::Sender<NetworkRequest>,
    mut network_responses: mpsc::Receiver<NetworkResponse>,
    mut poll_ticks: mpsc::Receiver<PollTick>,
) {
    loop {
        tokio::select! {
            Some(ui_event) = ui_events.recv() => {
                let requests = match ui_event {
                    UiEvent::AppStarted => app.start(),
                    UiEvent::KeyPressed(key_event) => {
                        let dispatch = keys::handle_key_bindings(key_event, app);
                        if dispatch.quit {
                            break;
                        }
                        dispatch.requests
                    }
                    UiEvent::Resize => Vec::new(),
                };
                draw::draw(&mut terminal, app);
                send_all(&network_requests, requests).await;
            }

            Some(response) = network_responses.recv() => {
                let (requests, should_redraw) = app.on_network_response(response);
                if should_redraw {
                    draw::draw(&mut terminal, app);
                }
                send_all(&network_requests, requests).await;
            }

            Some(tick) = poll_ticks.recv() => {
                let requests = app.on_poll_tick(tick);
                send_all(&network_requests, requests).await;
            }
        }
    }
}

async fn send_all(network_requests: &mpsc::Sender<NetworkRequest>, requests: Vec<NetworkRequest>) {
    for request in requests {
        if let Err(e) = network_requests.send(request).await {
            error!("Failed to queue network request: {e}");
        }
    }
}

async fn input_handler_task(ui_events: mpsc::Sender<UiEvent>) {
    loop {
        if let Ok(event) = crossterm_event::read() {
            let ui_event = match event {
                Event::Key(key_event) => Some(UiEvent::KeyPressed(key_event)),
                Event::Resize(_, _) => Some(UiEvent::Resize),
                _ => None,
            };

            if let Some(ui_event) = ui_event
                && ui_events.send(ui_event).await.is_err()
            {
                break;
            }
        }
    }
}

fn setup_terminal() -> io::Result<()> {
    let mut stdout = io::stdout();
    execute!(stdout, cursor::Hide)?;
    execute!(stdout, terminal::EnterAlternateScreen)?;
    execute!(stdout, terminal::Clear(terminal::ClearType::All))?;
    terminal::enable_raw_mode()
}

pub fn cleanup_terminal() -> io::Result<()> {
    let mut stdout = io::stdout();
    execute!(stdout, cursor::MoveTo(0, 0))?;
    execute!(stdout, terminal::Clear(terminal::ClearType::All))?;
    execute!(stdout, terminal::LeaveAlternateScreen)?;
    execute!(stdout, cursor::Show)?;
    terminal::disable_raw_mode()
}

fn setup_panic_hook() {
    panic::set_hook(Box::new(|panic_info| {
        let _ = cleanup_terminal();
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));
}

// ---------------------------------------------------------------------------
// One-shot commands. Each prints pretty JSON on stdout.
// ---------------------------------------------------------------------------

async fn print_scores(settings: &AppSettings, date: Option<NaiveDate>) -> anyhow::Result<()> {
    let feeds = Feeds::from_settings(settings);
    let date = date.unwrap_or_else(|| Local::now().date_naive());
    let (ticks, _) = mpsc::channel(1);
    let mut sync = ScheduleSync::new(date, settings.poll_interval, ticks);

    let games = sync
        .fetch(feeds.schedule.as_ref(), date)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))
        .with_context(|| format!("loading scores for {date}"))?;
    sync.teardown();

    println!("{}", serde_json::to_string_pretty(&games)?);
    Ok(())
}

async fn print_game(settings: &AppSettings, game_id: i64) -> anyhow::Result<()> {
    let feeds = Feeds::from_settings(settings);
    let detail = feeds
        .detail
        .game_detail(game_id)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))
        .with_context(|| format!("loading game {game_id}"))?;

    println!("{}", serde_json::to_string_pretty(&detail)?);
    Ok(())
}

async fn print_news(settings: &AppSettings, topic: Option<String>, pages: usize) -> anyhow::Result<()> {
    let feeds = Feeds::from_settings(settings);
    let pager = EnrichmentPager::new(&settings.trusted_sources, settings.page_size);
    let topic = topic.unwrap_or_else(|| settings.topic.clone());

    let items = feeds
        .content
        .items(&topic)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))
        .with_context(|| format!("loading news for {topic:?}"))?;
    let mut page = pager
        .initialize(items, feeds.summarizer.as_ref())
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    for _ in 1..pages.max(1) {
        if !page.has_more() {
            break;
        }
        match pager.load_more(&page, feeds.summarizer.as_ref()).await {
            Ok(next) => page = next,
            Err(e) => {
                error!("stopping after page {}: {e}", page.current_page());
                break;
            }
        }
    }

    println!("{}", serde_json::to_string_pretty(page.displayed())?);
    Ok(())
}

async fn print_standings(settings: &AppSettings) -> anyhow::Result<()> {
    let feeds = Feeds::from_settings(settings);
    let divisions = feeds
        .standings
        .standings()
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))
        .context("loading standings")?;

    println!("{}", serde_json::to_string_pretty(&divisions)?);
    Ok(())
}
