use tui::backend::Backend;
use tui::layout::{Alignment, Constraint, Layout, Rect};
use tui::style::{Color, Modifier, Style};
use tui::text::{Line, Span, Text};
use tui::widgets::{
    Block, BorderType, Borders, Cell, List, ListItem, ListState, Paragraph, Row, Table, TableState,
    Tabs, Wrap,
};
use tui::{Frame, Terminal};
use tui_logger::TuiLoggerWidget;

use crate::app::{App, MenuItem};
use crate::keys::HELP;
use crate::state::app_state::{GameDetailState, StandingsState};
use crate::state::schedule_sync::{ScheduleSync, SyncPhase};
use crate::ui::layout::LayoutAreas;
use chrono::Local;
use log::error;
use puck_api::{
    DivisionStandings, EnrichedItem, GameDetail, GameSummary, PlayerStat, PlayerStatsGroup,
    RosterPlayer, TeamStat, period_label,
};

static TABS: &[&str; 4] = &["Scores", "Game", "News", "Standings"];

pub fn draw<B>(terminal: &mut Terminal<B>, app: &mut App)
where
    B: Backend,
{
    let current_size = terminal.size().unwrap_or_default();
    if current_size.width <= 10 || current_size.height <= 10 {
        return;
    }

    let mut layout = LayoutAreas::new(current_size);

    let result = terminal.draw(|f| {
        layout.update(f.area(), app.settings.full_screen, app.state.show_logs);

        if !app.settings.full_screen {
            draw_tabs(f, layout.tab_bar, app);
        }

        match app.state.active_tab {
            MenuItem::Scores => draw_scores(f, layout.main, app),
            MenuItem::GameDetail => draw_game_detail(f, layout.main, &app.state.game_detail),
            MenuItem::News => draw_news(f, layout.main, app),
            MenuItem::Standings => draw_standings(f, layout.main, &app.state.standings),
            MenuItem::Help => draw_help(f, layout.main),
        }

        if app.state.show_logs {
            draw_logs(f, layout.logs);
        }
        draw_status(f, layout.status, app);
    });
    if let Err(e) = result {
        error!("Failed to draw frame: {e}");
    }
}

pub fn default_border<'a>(color: Color) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
}

fn placeholder(f: &mut Frame, area: Rect, msg: &str) {
    f.render_widget(
        Paragraph::new(msg.to_owned())
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        area,
    );
}

fn header_row<'a>(titles: &[&'a str]) -> Row<'a> {
    Row::new(titles.iter().map(|t| Cell::from(*t)))
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD))
}

fn right(text: String) -> Cell<'static> {
    Cell::from(Line::from(text).alignment(Alignment::Right))
}

fn draw_tabs(f: &mut Frame, tab_bar: [Rect; 2], app: &App) {
    let style = Style::default().fg(Color::White);
    let border_type = BorderType::Rounded;

    let tab_index = match app.state.active_tab {
        MenuItem::Scores => 0,
        MenuItem::GameDetail => 1,
        MenuItem::News => 2,
        MenuItem::Standings => 3,
        MenuItem::Help => 0,
    };

    let titles: Vec<Line> = TABS.iter().map(|t| Line::from(*t)).collect();
    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::LEFT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .highlight_style(Style::default().add_modifier(Modifier::UNDERLINED))
        .select(tab_index)
        .style(style);
    f.render_widget(tabs, tab_bar[0]);

    let help = Paragraph::new("Help: ? ")
        .alignment(Alignment::Right)
        .block(
            Block::default()
                .borders(Borders::RIGHT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .style(style);
    f.render_widget(help, tab_bar[1]);
}

// ---------------------------------------------------------------------------
// Scores
// ---------------------------------------------------------------------------

fn schedule_status(sync: &ScheduleSync) -> &'static str {
    match sync.phase() {
        SyncPhase::Fetching => "(loading...)",
        SyncPhase::Settled { live: true } if sync.is_polling() => "(live, updating)",
        SyncPhase::Settled { live: true } => "(live)",
        _ => "",
    }
}

fn draw_scores(f: &mut Frame, area: Rect, app: &App) {
    let sync = &app.state.schedule;
    let title = format!(" Scores {} {}", sync.date().format("%a %b %-d, %Y"), schedule_status(sync));
    let block = default_border(Color::White).title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    if sync.phase() == SyncPhase::Fetching {
        placeholder(f, inner, "Loading games...");
        return;
    }
    if sync.games().is_empty() {
        let msg = match sync.error() {
            Some(err) => err.user_message(),
            None => "No games scheduled.".to_string(),
        };
        placeholder(f, inner, &msg);
        return;
    }

    let open = app.state.game_detail.selected_id();
    let rows: Vec<Row> = sync
        .games()
        .iter()
        .map(|game| game_row(game, open == Some(game.id)))
        .collect();
    let table = Table::new(
        rows,
        [
            Constraint::Length(5),
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Length(3),
            Constraint::Length(10),
            Constraint::Fill(1),
        ],
    )
    .header(header_row(&["Away", "", "Home", "", "Status", "Venue"]))
    .row_highlight_style(Style::default().bg(Color::DarkGray))
    .highlight_symbol("> ");

    let mut state = TableState::default().with_selected(Some(app.state.scores_cursor));
    f.render_stateful_widget(table, inner, &mut state);
}

fn game_row(game: &GameSummary, open: bool) -> Row<'static> {
    let started = game.state.is_live() || game.state.is_finished();
    let score = |s: u16| if started { s.to_string() } else { String::new() };
    let status = match game.start_time {
        Some(start) if !started => start.with_timezone(&Local).format("%-I:%M %p").to_string(),
        _ => game.state.label().to_string(),
    };
    let status_style = if game.state.is_live() {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    let row = Row::new(vec![
        Cell::from(game.away.abbrev.clone()),
        right(score(game.away.score)),
        Cell::from(game.home.abbrev.clone()),
        right(score(game.home.score)),
        Cell::from(status).style(status_style),
        Cell::from(game.venue.clone()),
    ]);
    if open {
        row.style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    } else {
        row
    }
}

// ---------------------------------------------------------------------------
// Game detail
// ---------------------------------------------------------------------------

fn draw_game_detail(f: &mut Frame, area: Rect, state: &GameDetailState) {
    let Some(game) = &state.selected else {
        let block = default_border(Color::White).title(" Game ");
        let inner = block.inner(area);
        f.render_widget(block, area);
        placeholder(f, inner, "No game selected. Pick one on the Scores tab and press Enter.");
        return;
    };

    let block = default_border(Color::White).title(format!(" {} ({}) ", game.matchup(), game.state.label()));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let dim = Style::default().fg(Color::DarkGray);
    let mut header = vec![
        Line::from(vec![
            Span::styled(format!("{:<4}", game.away.abbrev), Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(game.away.logo_url(), dim),
        ]),
        Line::from(vec![
            Span::styled(format!("{:<4}", game.home.abbrev), Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(game.home.logo_url(), dim),
        ]),
    ];
    if let Some(video) = &state.highlight {
        header.push(Line::from(vec![
            Span::styled("Highlights ", Style::default().fg(Color::Red)),
            Span::raw(video.watch_url()),
        ]));
    }

    let insights: Vec<Line> = state
        .insights
        .as_deref()
        .map(|text| {
            text.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(|l| Line::from(l.to_owned()))
                .collect()
        })
        .unwrap_or_default();
    let insights_height = if insights.is_empty() { 0 } else { insights.len() as u16 + 2 };

    let [header_area, insights_area, body] = Layout::vertical([
        Constraint::Length(header.len() as u16),
        Constraint::Length(insights_height),
        Constraint::Fill(1),
    ])
    .areas(inner);

    f.render_widget(Paragraph::new(header), header_area);
    if !insights.is_empty() {
        f.render_widget(
            Paragraph::new(insights)
                .wrap(Wrap { trim: true })
                .block(default_border(Color::Blue).title(" Game Insights ")),
            insights_area,
        );
    }

    if state.loading {
        placeholder(f, body, "Loading game detail...");
    } else if let Some(err) = &state.error {
        f.render_widget(
            Paragraph::new(err.user_message())
                .style(Style::default().fg(Color::Red))
                .alignment(Alignment::Center),
            body,
        );
    } else if let Some(detail) = &state.detail {
        draw_detail_body(f, body, game, detail, state.scroll_offset);
    }
}

fn draw_detail_body(f: &mut Frame, area: Rect, game: &GameSummary, detail: &GameDetail, scroll: u16) {
    let [top, bottom] =
        Layout::vertical([Constraint::Percentage(45), Constraint::Percentage(55)]).areas(area);
    let [events_area, stats_area] =
        Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)]).areas(top);

    f.render_widget(
        Paragraph::new(event_lines(detail))
            .scroll((scroll, 0))
            .block(default_border(Color::DarkGray).title(" Scoring ")),
        events_area,
    );
    draw_team_stats(f, stats_area, &detail.team_stats);

    let [away_area, home_area] =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(bottom);

    // Pregame payloads carry the roster but no stats yet.
    if detail.away_players.is_empty() && detail.home_players.is_empty() && !detail.roster.is_empty() {
        for (side, side_area) in [(&game.away, away_area), (&game.home, home_area)] {
            let roster: Vec<&RosterPlayer> =
                detail.roster.iter().filter(|p| p.team_id == side.id).collect();
            draw_roster(f, side_area, &side.abbrev, &roster);
        }
        return;
    }

    draw_players(f, away_area, &game.away.abbrev, &detail.away_players);
    draw_players(f, home_area, &game.home.abbrev, &detail.home_players);
}

fn event_lines(detail: &GameDetail) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    if detail.scoring.is_empty() {
        lines.push(Line::styled("No goals yet.", Style::default().fg(Color::DarkGray)));
    }
    for (period, plays) in detail.scoring_by_period() {
        lines.push(Line::styled(period_label(period), Style::default().add_modifier(Modifier::BOLD)));
        for play in plays {
            let assists = if play.assists.is_empty() {
                "unassisted".to_string()
            } else {
                play.assists.join(", ")
            };
            let mut spans = vec![
                Span::raw(format!("{:>6}  ", play.clock)),
                Span::styled(format!("{:<4}", play.team_abbrev), Style::default().fg(Color::Cyan)),
                Span::raw(format!("{} ({assists})", play.scorer)),
            ];
            if !play.is_even_strength() {
                spans.push(Span::styled(
                    format!(" [{}]", play.strength.to_uppercase()),
                    Style::default().fg(Color::Yellow),
                ));
            }
            lines.push(Line::from(spans));
        }
    }

    if !detail.penalties.is_empty() {
        lines.push(Line::default());
        lines.push(Line::styled("Penalties", Style::default().add_modifier(Modifier::BOLD)));
        for penalty in &detail.penalties {
            lines.push(Line::from(format!(
                "P{} {:>6}  {:<4}{} - {} ({} min)",
                penalty.period,
                penalty.clock,
                penalty.team_abbrev,
                penalty.committed_by,
                penalty.kind,
                penalty.duration
            )));
        }
    }
    lines
}

fn draw_team_stats(f: &mut Frame, area: Rect, stats: &[TeamStat]) {
    let block = default_border(Color::DarkGray).title(" Team Stats ");
    if stats.is_empty() {
        let inner = block.inner(area);
        f.render_widget(block, area);
        placeholder(f, inner, "No team stats yet.");
        return;
    }

    let rows: Vec<Row> = stats
        .iter()
        .map(|stat| {
            let label = stat.label().unwrap_or(stat.category.as_str()).to_owned();
            Row::new(vec![
                right(stat.away_display()),
                Cell::from(Line::from(label).alignment(Alignment::Center)),
                Cell::from(stat.home_display()),
            ])
        })
        .collect();
    let table = Table::new(
        rows,
        [Constraint::Percentage(30), Constraint::Percentage(40), Constraint::Percentage(30)],
    )
    .block(block);
    f.render_widget(table, area);
}

fn draw_players(f: &mut Frame, area: Rect, abbrev: &str, group: &PlayerStatsGroup) {
    let block = default_border(Color::DarkGray).title(format!(" {abbrev} "));
    let inner = block.inner(area);
    f.render_widget(block, area);

    if group.is_empty() {
        placeholder(f, inner, "No player stats yet.");
        return;
    }

    let goalie_height = if group.goalies.is_empty() { 0 } else { group.goalies.len() as u16 + 2 };
    let [skater_area, goalie_area] =
        Layout::vertical([Constraint::Fill(1), Constraint::Length(goalie_height)]).areas(inner);

    let skaters: Vec<Row> = group.skaters().iter().map(skater_row).collect();
    let table = Table::new(
        skaters,
        [
            Constraint::Length(3),
            Constraint::Fill(1),
            Constraint::Length(3),
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(6),
        ],
    )
    .header(header_row(&["#", "Skater", "Pos", "G", "A", "P", "+/-", "SOG", "TOI"]));
    f.render_widget(table, skater_area);

    if !group.goalies.is_empty() {
        let goalies: Vec<Row> = group
            .goalies
            .iter()
            .map(|g| {
                Row::new(vec![
                    right(g.sweater_number.to_string()),
                    Cell::from(g.name.clone()),
                    right(g.shots_against.to_string()),
                    right(g.saves.to_string()),
                    right(g.save_pctg.clone().unwrap_or_else(|| "-".into())),
                    right(g.toi.clone()),
                ])
            })
            .collect();
        let table = Table::new(
            goalies,
            [
                Constraint::Length(3),
                Constraint::Fill(1),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(6),
                Constraint::Length(6),
            ],
        )
        .header(header_row(&["#", "Goalie", "SA", "SV", "SV%", "TOI"]))
        .block(Block::default().borders(Borders::TOP).border_style(Style::default().fg(Color::DarkGray)));
        f.render_widget(table, goalie_area);
    }
}

fn skater_row(p: &PlayerStat) -> Row<'static> {
    Row::new(vec![
        right(p.sweater_number.to_string()),
        Cell::from(p.name.clone()),
        Cell::from(p.position.clone()),
        right(p.goals.to_string()),
        right(p.assists.to_string()),
        right(p.points.to_string()),
        right(p.plus_minus.to_string()),
        right(p.shots.to_string()),
        right(p.toi.clone()),
    ])
}

fn draw_roster(f: &mut Frame, area: Rect, abbrev: &str, roster: &[&RosterPlayer]) {
    let rows: Vec<Row> = roster
        .iter()
        .map(|p| {
            Row::new(vec![
                right(p.sweater_number.to_string()),
                Cell::from(p.full_name()),
                Cell::from(p.position.clone()),
            ])
        })
        .collect();
    let table = Table::new(rows, [Constraint::Length(3), Constraint::Fill(1), Constraint::Length(3)])
        .header(header_row(&["#", "Roster", "Pos"]))
        .block(default_border(Color::DarkGray).title(format!(" {abbrev} ")));
    f.render_widget(table, area);
}

// ---------------------------------------------------------------------------
// News
// ---------------------------------------------------------------------------

fn draw_news(f: &mut Frame, area: Rect, app: &App) {
    let news = &app.state.news;
    let block = default_border(Color::White).title(format!(" News: {} ", news.topic));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let [list_area, footer_area] =
        Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(inner);

    let footer = match (&app.state.topic_input, &news.page) {
        (Some(typed), _) => Line::from(vec![
            Span::styled("Topic: ", Style::default().fg(Color::Yellow)),
            Span::raw(format!("{typed}_")),
        ]),
        (None, Some(_)) if news.loading_more => Line::styled("Loading more...", Style::default().fg(Color::DarkGray)),
        (None, Some(page)) if page.has_more() => Line::styled(
            format!("{} of {} shown. m for more", page.displayed().len(), page.filtered_len()),
            Style::default().fg(Color::DarkGray),
        ),
        _ => Line::default(),
    };
    f.render_widget(Paragraph::new(footer), footer_area);

    if news.loading {
        placeholder(f, list_area, "Loading stories...");
        return;
    }

    let error_line = news.error.as_ref().map(|err| {
        let hint = if news.can_retry() { " Press m to try again." } else { "" };
        Line::styled(format!("{}{hint}", err.user_message()), Style::default().fg(Color::Red))
    });

    let Some(page) = news.page.as_ref().filter(|p| !p.is_empty()) else {
        let msg = match (&news.page, &error_line) {
            (_, Some(line)) => line.to_string(),
            (Some(_), None) => "No stories from trusted sources right now.".to_string(),
            (None, None) => "Press n to load news, / to pick a topic.".to_string(),
        };
        placeholder(f, list_area, &msg);
        return;
    };

    let [stories_area, error_area] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(u16::from(error_line.is_some())),
    ])
    .areas(list_area);

    let items: Vec<ListItem> = page.displayed().iter().map(story_item).collect();
    let list = List::new(items)
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("> ");
    let mut state = ListState::default().with_selected(Some(app.state.news_cursor));
    f.render_stateful_widget(list, stories_area, &mut state);

    if let Some(line) = error_line {
        f.render_widget(Paragraph::new(line), error_area);
    }
}

fn story_item(item: &EnrichedItem) -> ListItem<'static> {
    let dim = Style::default().fg(Color::DarkGray);
    let when = item
        .item
        .published_at
        .map(|t| t.with_timezone(&Local).format("%b %-d %H:%M").to_string())
        .unwrap_or_default();

    let mut lines = vec![
        Line::styled(item.item.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
        Line::from(vec![
            Span::styled(item.item.source.clone(), Style::default().fg(Color::Cyan)),
            Span::styled(format!(" {when}"), dim),
        ]),
    ];
    if !item.summary.is_empty() {
        lines.push(Line::from(item.summary.clone()));
    }
    lines.push(Line::styled(item.item.link.clone(), dim));
    lines.push(Line::styled(format!("image: {}", item.image_url), dim));
    lines.push(Line::default());
    ListItem::new(Text::from(lines))
}

// ---------------------------------------------------------------------------
// Standings
// ---------------------------------------------------------------------------

fn draw_standings(f: &mut Frame, area: Rect, state: &StandingsState) {
    let title = if state.loading { " Standings (loading...) " } else { " Standings " };
    let block = default_border(Color::White).title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    if state.divisions.is_empty() {
        let msg = match (&state.error, state.loading) {
            (Some(err), _) => err.user_message(),
            (None, true) => "Loading standings...".to_string(),
            (None, false) => "No standings available.".to_string(),
        };
        placeholder(f, inner, &msg);
        return;
    }

    let [grid_area, error_area] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(u16::from(state.error.is_some())),
    ])
    .areas(inner);
    if let Some(err) = &state.error {
        f.render_widget(
            Paragraph::new(err.user_message()).style(Style::default().fg(Color::Red)),
            error_area,
        );
    }

    // Divisions arrive sorted by conference, so each conference is one run.
    let mut conferences: Vec<Vec<&DivisionStandings>> = Vec::new();
    for division in &state.divisions {
        let same = conferences
            .last()
            .is_some_and(|run| run[0].conference == division.conference);
        if !same {
            conferences.push(Vec::new());
        }
        if let Some(run) = conferences.last_mut() {
            run.push(division);
        }
    }

    let rows = Layout::vertical(conferences.iter().map(|_| Constraint::Fill(1))).split(grid_area);
    for (divisions, row_area) in conferences.iter().zip(rows.iter()) {
        let cols = Layout::horizontal(divisions.iter().map(|_| Constraint::Fill(1))).split(*row_area);
        for (division, col_area) in divisions.iter().zip(cols.iter()) {
            draw_division(f, *col_area, division, state.scroll_offset);
        }
    }
}

fn draw_division(f: &mut Frame, area: Rect, division: &DivisionStandings, scroll: u16) {
    let rows: Vec<Row> = division
        .teams
        .iter()
        .map(|team| {
            let rank = match team.division_rank {
                0 => "-".to_string(),
                rank => rank.to_string(),
            };
            let mut name = vec![Span::raw(team.name.clone())];
            if let Some(clinch) = &team.clinch_indicator {
                name.push(Span::styled(format!(" {clinch}"), Style::default().fg(Color::Green)));
            }
            Row::new(vec![
                right(rank),
                Cell::from(Line::from(name)),
                right(team.games_played.to_string()),
                right(team.wins.to_string()),
                right(team.losses.to_string()),
                right(team.ot_losses.to_string()),
                Cell::from(Line::from(team.points.to_string()).alignment(Alignment::Right))
                    .style(Style::default().add_modifier(Modifier::BOLD)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(2),
            Constraint::Fill(1),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(4),
        ],
    )
    .header(header_row(&["#", "Team", "GP", "W", "L", "OT", "PTS"]))
    .block(default_border(Color::DarkGray).title(format!(" {}: {} ", division.conference, division.division)));

    let mut state = TableState::default().with_offset(scroll as usize);
    f.render_stateful_widget(table, area, &mut state);
}

// ---------------------------------------------------------------------------
// Help, logs, status line
// ---------------------------------------------------------------------------

fn draw_help(f: &mut Frame, area: Rect) {
    let rows: Vec<Row> = HELP
        .iter()
        .map(|(keys, action)| {
            Row::new(vec![
                Cell::from(*keys).style(Style::default().fg(Color::Yellow)),
                Cell::from(*action),
            ])
        })
        .collect();
    let table = Table::new(rows, [Constraint::Length(12), Constraint::Fill(1)])
        .block(default_border(Color::White).title(" Help (Esc to close) "));
    f.render_widget(table, area);
}

fn draw_logs(f: &mut Frame, area: Rect) {
    let logs = TuiLoggerWidget::default()
        .block(default_border(Color::DarkGray).title(" Logs "))
        .style_error(Style::default().fg(Color::Red))
        .style_warn(Style::default().fg(Color::Yellow))
        .style_info(Style::default().fg(Color::Cyan));
    f.render_widget(logs, area);
}

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
    let line = if let Some(err) = &app.state.last_error {
        Line::styled(format!(" {err}"), Style::default().fg(Color::Red))
    } else if let Some(notice) = &app.state.notice {
        Line::styled(format!(" {notice}"), Style::default().fg(Color::Yellow))
    } else {
        Line::styled(" q quit  ? help", Style::default().fg(Color::DarkGray))
    };
    f.render_widget(Paragraph::new(line), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::app_settings::AppSettings;
    use crate::state::messages::{NetworkRequest, NetworkResponse};
    use chrono::NaiveDate;
    use puck_api::{GameState, Penalty, ScoringPlay, StatValue, TeamRecord, TeamSide};
    use tokio::sync::mpsc;
    use tui::backend::TestBackend;

    fn app() -> App {
        let (tx, _rx) = mpsc::channel(4);
        App::new(AppSettings::default(), NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(), tx)
    }

    fn side(id: i64, abbrev: &str, score: u16) -> TeamSide {
        TeamSide { id, abbrev: abbrev.into(), name: abbrev.into(), score }
    }

    fn final_game() -> GameSummary {
        GameSummary {
            id: 42,
            state: GameState::Final,
            away: side(10, "TOR", 3),
            home: side(6, "BOS", 2),
            venue: "TD Garden".into(),
            ..Default::default()
        }
    }

    fn screen(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        draw(&mut terminal, app);
        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        buffer
            .content()
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn with_schedule(app: &mut App, games: Vec<GameSummary>) {
        let Some(NetworkRequest::LoadSchedule { ticket }) = app.start().pop() else {
            panic!("expected schedule request");
        };
        app.on_network_response(NetworkResponse::ScheduleLoaded { ticket, result: Ok(games) });
    }

    fn open_with_detail(app: &mut App, detail: GameDetail) -> Vec<NetworkRequest> {
        with_schedule(app, vec![final_game()]);
        let requests = app.toggle_game(42);
        let NetworkRequest::LoadGameDetail { generation, .. } = requests[0] else {
            panic!("expected detail request");
        };
        let (follow_up, _) = app.on_network_response(NetworkResponse::GameDetailLoaded {
            game_id: 42,
            generation,
            result: Ok(detail),
        });
        follow_up
    }

    #[tokio::test]
    async fn scores_table_lists_games() {
        let mut app = app();
        with_schedule(&mut app, vec![final_game()]);
        let text = screen(&mut app);
        assert!(text.contains("Scores Wed Jan 10, 2024"));
        assert!(text.contains("TOR"));
        assert!(text.contains("BOS"));
        assert!(text.contains("Final"));
        assert!(text.contains("TD Garden"));
    }

    #[tokio::test]
    async fn empty_and_failed_schedules_explain_themselves() {
        let mut app = app();
        with_schedule(&mut app, Vec::new());
        assert!(screen(&mut app).contains("No games scheduled."));

        let Some(NetworkRequest::LoadSchedule { ticket }) = app.refresh_schedule().pop() else {
            panic!("expected schedule request");
        };
        assert!(screen(&mut app).contains("Loading games..."));
        app.on_network_response(NetworkResponse::ScheduleLoaded {
            ticket,
            result: Err(puck_api::ApiError::Http { status: 503, url: "u".into() }),
        });
        assert!(screen(&mut app).contains("503"));
    }

    #[tokio::test]
    async fn detail_shows_scoring_penalties_and_stats() {
        let mut app = app();
        open_with_detail(
            &mut app,
            GameDetail {
                game_id: 42,
                scoring: vec![
                    ScoringPlay { period: 1, scorer: "Matthews".into(), strength: "pp".into(), ..Default::default() },
                    ScoringPlay { period: 4, scorer: "Marner".into(), assists: vec!["Nylander".into()], ..Default::default() },
                ],
                penalties: vec![Penalty { period: 2, kind: "tripping".into(), duration: 2, ..Default::default() }],
                team_stats: vec![
                    TeamStat {
                        category: "faceoffWinningPctg".into(),
                        away: StatValue::Decimal(0.525),
                        home: StatValue::Decimal(0.475),
                    },
                    TeamStat {
                        category: "xGoals".into(),
                        away: StatValue::Decimal(0.8),
                        home: StatValue::Integer(1),
                    },
                ],
                ..Default::default()
            },
        );

        let text = screen(&mut app);
        assert!(text.contains("TOR @ BOS (Final)"));
        assert!(text.contains("1st Period"));
        assert!(text.contains("Overtime"));
        assert!(text.contains("[PP]"));
        assert!(text.contains("unassisted"));
        assert!(text.contains("tripping"));
        assert!(text.contains("52.5%"));
        assert!(text.contains("xGoals"));
        assert!(text.contains("0.8"));
        assert!(!text.contains("80.0%"));
        assert!(!text.contains("Game Insights"));
    }

    #[tokio::test]
    async fn insights_panel_appears_once_resolved() {
        let mut app = app();
        let follow_up = open_with_detail(&mut app, GameDetail { game_id: 42, ..Default::default() });
        let [NetworkRequest::LoadInsights { selection, ref request, .. }] = follow_up[..] else {
            panic!("expected insights request");
        };
        assert!(request.prompt().contains("TOR 3 @ BOS 2"));

        app.on_network_response(NetworkResponse::InsightsResolved {
            game_id: 42,
            selection,
            insights: Some("- Leafs won on the road\n\n- Three goals".into()),
        });
        let text = screen(&mut app);
        assert!(text.contains("Game Insights"));
        assert!(text.contains("- Leafs won on the road"));
        assert!(text.contains("No goals yet."));
    }

    #[tokio::test]
    async fn pregame_detail_lists_roster_by_team() {
        let mut app = app();
        open_with_detail(
            &mut app,
            GameDetail {
                game_id: 42,
                roster: vec![
                    RosterPlayer {
                        team_id: 6,
                        first_name: "David".into(),
                        last_name: "Pastrnak".into(),
                        sweater_number: 88,
                        position: "R".into(),
                        ..Default::default()
                    },
                    RosterPlayer {
                        team_id: 10,
                        first_name: "Auston".into(),
                        last_name: "Matthews".into(),
                        sweater_number: 34,
                        position: "C".into(),
                        ..Default::default()
                    },
                ],
                ..Default::default()
            },
        );
        let text = screen(&mut app);
        assert!(text.contains("Roster"));
        assert!(text.contains("David Pastrnak"));
        assert!(text.contains("Auston Matthews"));
    }

    #[tokio::test]
    async fn standings_grid_shows_divisions() {
        let mut app = app();
        let requests = app.update_tab(MenuItem::Standings);
        let [NetworkRequest::LoadStandings { generation }] = requests[..] else {
            panic!("expected standings request");
        };
        let team = |abbrev: &str, rank: u16, clinch: Option<&str>| TeamRecord {
            abbrev: abbrev.into(),
            name: abbrev.into(),
            division_rank: rank,
            points: 100 - rank,
            clinch_indicator: clinch.map(str::to_owned),
            ..Default::default()
        };
        let divisions = vec![
            DivisionStandings {
                conference: "Eastern".into(),
                division: "Atlantic".into(),
                teams: vec![team("FLA", 1, Some("x")), team("TOR", 2, None)],
            },
            DivisionStandings {
                conference: "Western".into(),
                division: "Pacific".into(),
                teams: vec![team("VAN", 1, Some("y"))],
            },
        ];
        app.on_network_response(NetworkResponse::StandingsLoaded { generation, result: Ok(divisions) });

        let text = screen(&mut app);
        assert!(text.contains("Eastern: Atlantic"));
        assert!(text.contains("Western: Pacific"));
        assert!(text.contains("FLA x"));
        assert!(text.contains("PTS"));
        assert!(text.contains("99"));
    }

    #[tokio::test]
    async fn help_lists_key_bindings() {
        let mut app = app();
        app.update_tab(MenuItem::Help);
        let text = screen(&mut app);
        assert!(text.contains("Help (Esc to close)"));
        assert!(text.contains("previous / next day"));
    }

    #[tokio::test]
    async fn tiny_terminal_is_left_alone() {
        let mut app = app();
        let mut terminal = Terminal::new(TestBackend::new(8, 8)).unwrap();
        draw(&mut terminal, &mut app);
        assert!(terminal.backend().buffer().content().iter().all(|c| c.symbol() == " "));
    }
}
