pub mod boxscore;
pub mod client;
pub mod content;
pub mod error;
pub mod feeds;
pub mod gemini;
pub mod nhle;

pub use error::{ApiError, ApiResult, ErrorKind};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fallback image when a headshot, logo or article image is unavailable.
pub const GENERIC_IMAGE_URL: &str = "https://assets.nhle.com/logos/nhl/svg/NHL_light.svg";

const LOGO_BASE: &str = "https://assets.nhle.com/logos/nhl/svg";
const CLIP_BASE: &str = "https://www.nhl.com/video";

// ---------------------------------------------------------------------------
// Schedule: one row per contest on the selected date
// ---------------------------------------------------------------------------

/// Lifecycle of a contest as reported by the schedule feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameState {
    #[default]
    Scheduled,
    Pregame,
    Live,
    /// Late, high-leverage live play.
    Critical,
    Final,
    /// Finalized and archived.
    Official,
}

impl GameState {
    /// Map a feed state code ("FUT", "LIVE", "OFF", ...) onto the lifecycle.
    pub fn from_code(code: &str) -> Self {
        match code {
            "FUT" => GameState::Scheduled,
            "PRE" => GameState::Pregame,
            "LIVE" => GameState::Live,
            "CRIT" => GameState::Critical,
            "FINAL" => GameState::Final,
            "OFF" => GameState::Official,
            other => {
                log::debug!("unknown game state code {other:?}, treating as scheduled");
                GameState::Scheduled
            }
        }
    }

    pub fn is_live(self) -> bool {
        matches!(self, GameState::Live | GameState::Critical)
    }

    pub fn is_finished(self) -> bool {
        matches!(self, GameState::Final | GameState::Official)
    }

    pub fn label(self) -> &'static str {
        match self {
            GameState::Scheduled => "Scheduled",
            GameState::Pregame => "Pregame",
            GameState::Live | GameState::Critical => "Live",
            GameState::Final | GameState::Official => "Final",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GameSummary {
    pub id: i64,
    pub state: GameState,
    pub start_time: Option<DateTime<Utc>>,
    pub venue: String,
    pub away: TeamSide,
    pub home: TeamSide,
}

impl GameSummary {
    pub fn is_live(&self) -> bool {
        self.state.is_live()
    }

    /// "Away @ Home" using full team names.
    pub fn matchup(&self) -> String {
        format!("{} @ {}", self.away.name, self.home.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TeamSide {
    pub id: i64,
    pub name: String,
    pub abbrev: String,
    /// 0 until the game has started.
    pub score: u16,
}

impl TeamSide {
    pub fn logo_url(&self) -> String {
        if self.abbrev.is_empty() {
            return GENERIC_IMAGE_URL.to_owned();
        }
        format!("{LOGO_BASE}/{}_light.svg", self.abbrev)
    }
}

/// Display name for a period number.
pub fn period_label(period: u8) -> String {
    match period {
        1 => "1st Period".into(),
        2 => "2nd Period".into(),
        3 => "3rd Period".into(),
        4 => "Overtime".into(),
        5 => "Shootout".into(),
        n => format!("Period {n}"),
    }
}

// ---------------------------------------------------------------------------
// Game detail: normalized boxscore for one game, built on demand
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GameDetail {
    pub game_id: i64,
    /// Sorted by period; feed order is kept within a period.
    pub scoring: Vec<ScoringPlay>,
    pub penalties: Vec<Penalty>,
    pub team_stats: Vec<TeamStat>,
    pub away_players: PlayerStatsGroup,
    pub home_players: PlayerStatsGroup,
    pub roster: Vec<RosterPlayer>,
}

impl GameDetail {
    /// Scoring plays bucketed by period, periods ascending.
    pub fn scoring_by_period(&self) -> Vec<(u8, Vec<&ScoringPlay>)> {
        let mut groups: Vec<(u8, Vec<&ScoringPlay>)> = Vec::new();
        for play in &self.scoring {
            match groups.last_mut() {
                Some((period, plays)) if *period == play.period => plays.push(play),
                _ => groups.push((play.period, vec![play])),
            }
        }
        groups
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoringPlay {
    pub period: u8,
    pub clock: String,
    pub scorer: String,
    /// Primary assist first.
    pub assists: Vec<String>,
    pub team_abbrev: String,
    /// "ev", "pp", "sh", ...
    pub strength: String,
    pub situation_code: Option<String>,
    pub highlight_clip: Option<String>,
    pub away_score: Option<u16>,
    pub home_score: Option<u16>,
}

impl ScoringPlay {
    pub fn highlight_url(&self) -> Option<String> {
        self.highlight_clip
            .as_deref()
            .map(|clip| format!("{CLIP_BASE}/c-{clip}"))
    }

    pub fn is_even_strength(&self) -> bool {
        self.strength.is_empty() || self.strength.eq_ignore_ascii_case("ev")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Penalty {
    pub period: u8,
    pub clock: String,
    pub kind: String,
    pub duration: u16,
    pub committed_by: String,
    pub team_abbrev: String,
}

/// Team-level stat values arrive as numbers or preformatted strings ("1/3").
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StatValue {
    Integer(i64),
    Decimal(f64),
    Text(String),
}

impl Default for StatValue {
    fn default() -> Self {
        StatValue::Text(String::new())
    }
}

impl fmt::Display for StatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatValue::Integer(n) => write!(f, "{n}"),
            StatValue::Decimal(x) if x.fract() == 0.0 => write!(f, "{x:.0}"),
            StatValue::Decimal(x) => {
                let fixed = format!("{x:.2}");
                f.write_str(fixed.trim_end_matches('0').trim_end_matches('.'))
            }
            StatValue::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TeamStat {
    pub category: String,
    pub away: StatValue,
    pub home: StatValue,
}

impl TeamStat {
    /// Display label for the categories we know; unknown ones are still kept.
    pub fn label(&self) -> Option<&'static str> {
        match self.category.as_str() {
            "sog" => Some("Shots on Goal"),
            "faceoffWinningPctg" => Some("Faceoff %"),
            "powerPlay" => Some("Power Play"),
            "pim" => Some("PIM"),
            "hits" => Some("Hits"),
            "blockedShots" => Some("Blocked Shots"),
            "giveaways" => Some("Giveaways"),
            "takeaways" => Some("Takeaways"),
            _ => None,
        }
    }

    /// Categories the feed reports as a 0..1 fraction.
    pub fn is_percentage(&self) -> bool {
        self.category.ends_with("Pctg") || self.category.ends_with("Percentage")
    }

    pub fn away_display(&self) -> String {
        self.format_value(&self.away)
    }

    pub fn home_display(&self) -> String {
        self.format_value(&self.home)
    }

    fn format_value(&self, value: &StatValue) -> String {
        match value {
            StatValue::Decimal(x) if self.is_percentage() && *x <= 1.0 => {
                format!("{:.1}%", x * 100.0)
            }
            StatValue::Integer(n) if self.is_percentage() && (0..=1).contains(n) => {
                format!("{:.1}%", *n as f64 * 100.0)
            }
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlayerStat {
    pub player_id: i64,
    pub name: String,
    pub headshot: String,
    pub sweater_number: u16,
    pub position: String,
    pub goals: i32,
    pub assists: i32,
    pub points: i32,
    pub plus_minus: i32,
    pub toi: String,
    pub shots: i32,
    pub hits: i32,
    pub blocked_shots: i32,
    pub pim: i32,
    pub saves: i32,
    pub shots_against: i32,
    pub goals_against: i32,
    /// Absent rather than 0 when the feed omits it: 0% is a real value.
    pub save_pctg: Option<String>,
}

/// One side's player stats. Skater lists are ordered by points then goals,
/// goalies by saves.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlayerStatsGroup {
    pub forwards: Vec<PlayerStat>,
    pub defense: Vec<PlayerStat>,
    pub goalies: Vec<PlayerStat>,
}

impl PlayerStatsGroup {
    /// Forwards and defense as one display set.
    pub fn skaters(&self) -> Vec<PlayerStat> {
        let mut skaters: Vec<PlayerStat> = self
            .forwards
            .iter()
            .chain(self.defense.iter())
            .cloned()
            .collect();
        sort_skaters(&mut skaters);
        skaters
    }

    pub fn is_empty(&self) -> bool {
        self.forwards.is_empty() && self.defense.is_empty() && self.goalies.is_empty()
    }
}

/// Points descending, ties broken by goals descending. Stable.
pub fn sort_skaters(rows: &mut [PlayerStat]) {
    rows.sort_by(|a, b| b.points.cmp(&a.points).then_with(|| b.goals.cmp(&a.goals)));
}

/// Saves descending. Stable.
pub fn sort_goalies(rows: &mut [PlayerStat]) {
    rows.sort_by(|a, b| b.saves.cmp(&a.saves));
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RosterPlayer {
    pub player_id: i64,
    pub team_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub sweater_number: u16,
    pub position: String,
    pub headshot: String,
}

impl RosterPlayer {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_owned()
    }
}

// ---------------------------------------------------------------------------
// Content feed + enrichment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RawFeedItem {
    pub title: String,
    pub link: String,
    pub published_at: Option<DateTime<Utc>>,
    pub source: String,
}

/// What the summarization service returns for one item, positionally aligned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Enrichment {
    pub summary: String,
    #[serde(rename = "imageUrl", default)]
    pub image_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EnrichedItem {
    pub item: RawFeedItem,
    pub summary: String,
    /// Never empty.
    pub image_url: String,
}

impl EnrichedItem {
    pub fn new(item: RawFeedItem, enrichment: Enrichment) -> Self {
        let image_url = if enrichment.image_url.trim().is_empty() {
            GENERIC_IMAGE_URL.to_owned()
        } else {
            enrichment.image_url
        };
        Self { item, summary: enrichment.summary, image_url }
    }
}

// ---------------------------------------------------------------------------
// Highlights
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoRef {
    pub video_id: String,
}

impl VideoRef {
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.video_id)
    }

    pub fn embed_url(&self) -> String {
        format!("https://www.youtube.com/embed/{}", self.video_id)
    }
}

// ---------------------------------------------------------------------------
// Standings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TeamRecord {
    pub abbrev: String,
    pub name: String,
    pub conference: String,
    pub division: String,
    /// 0 when the feed omits it; unranked teams sort last.
    pub division_rank: u16,
    pub games_played: u16,
    pub wins: u16,
    pub losses: u16,
    pub ot_losses: u16,
    pub points: u16,
    /// "x", "y", "z", "p" or "e" once a team has clinched or been eliminated.
    pub clinch_indicator: Option<String>,
}

impl TeamRecord {
    pub fn logo_url(&self) -> String {
        TeamSide { abbrev: self.abbrev.clone(), ..Default::default() }.logo_url()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DivisionStandings {
    pub conference: String,
    pub division: String,
    pub teams: Vec<TeamRecord>,
}

/// Group records by conference then division. Conferences and divisions are
/// ordered by name, teams by division rank.
pub fn group_standings(records: Vec<TeamRecord>) -> Vec<DivisionStandings> {
    let mut groups: Vec<DivisionStandings> = Vec::new();
    for record in records {
        match groups
            .iter_mut()
            .find(|g| g.conference == record.conference && g.division == record.division)
        {
            Some(group) => group.teams.push(record),
            None => groups.push(DivisionStandings {
                conference: record.conference.clone(),
                division: record.division.clone(),
                teams: vec![record],
            }),
        }
    }
    for group in &mut groups {
        group.teams.sort_by_key(|t| (t.division_rank == 0, t.division_rank));
    }
    groups.sort_by(|a, b| a.conference.cmp(&b.conference).then_with(|| a.division.cmp(&b.division)));
    groups
}
