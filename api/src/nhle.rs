/// NHL web API raw wire types: serde shapes for the schedule and standings
/// endpoints.
/// The gamecenter landing/boxscore payloads are too loosely typed for fixed
/// shapes; they stay as `serde_json::Value` and go through `boxscore.rs`.
use serde::Deserialize;

pub type LandingPayload = serde_json::Value;

// ---------------------------------------------------------------------------
// Schedule  (/v1/schedule/{date})
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    /// Seven days starting at the requested date.
    pub game_week: Option<Vec<GameDay>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GameDay {
    pub date: Option<String>, // "2024-01-10"
    pub games: Option<Vec<ScheduleGame>>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleGame {
    pub id: Option<i64>,
    pub game_state: Option<String>, // "FUT" | "PRE" | "LIVE" | "CRIT" | "FINAL" | "OFF"
    #[serde(rename = "startTimeUTC")]
    pub start_time_utc: Option<String>,
    pub venue: Option<Localized>,
    pub away_team: Option<ScheduleTeam>,
    pub home_team: Option<ScheduleTeam>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleTeam {
    pub id: Option<i64>,
    pub name: Option<Localized>,
    pub place_name: Option<Localized>,
    pub common_name: Option<Localized>,
    pub abbrev: Option<String>,
    pub score: Option<u16>,
}

// ---------------------------------------------------------------------------
// Standings  (/v1/standings/now)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone)]
pub struct StandingsResponse {
    pub standings: Option<Vec<StandingsRow>>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct StandingsRow {
    pub conference_name: Option<String>,
    pub division_name: Option<String>,
    pub team_name: Option<Localized>,
    pub team_abbrev: Option<Localized>,
    pub division_rank: Option<Count>,
    /// Current feed name for the rank; `division_rank` wins when both appear.
    pub division_sequence: Option<Count>,
    pub games_played: Option<Count>,
    pub wins: Option<Count>,
    pub losses: Option<Count>,
    pub ot_losses: Option<Count>,
    pub points: Option<Count>,
    pub clinch_indicator: Option<String>,
}

/// Counts arrive as numbers, or as numeric strings on some rows ("3").
#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum Count {
    Number(u64),
    Text(String),
    Other(serde_json::Value),
}

impl Count {
    pub fn value(count: &Option<Count>) -> u16 {
        let parsed = match count {
            Some(Count::Number(n)) => Some(*n),
            Some(Count::Text(s)) => s.trim().parse().ok(),
            _ => None,
        };
        parsed.and_then(|n| u16::try_from(n).ok()).unwrap_or_default()
    }
}

/// `{ "default": "Boston", "fr": "..." }`
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Localized {
    pub default: Option<String>,
}

impl Localized {
    pub fn text(value: &Option<Localized>) -> Option<String> {
        value
            .as_ref()
            .and_then(|l| l.default.clone())
            .filter(|s| !s.trim().is_empty())
    }
}
