use crate::boxscore;
use crate::error::{ApiError, ApiResult};
use crate::feeds::{GameDetailFeed, ScheduleFeed, StandingsFeed};
use crate::nhle::{
    Count, LandingPayload, Localized, ScheduleGame, ScheduleResponse, ScheduleTeam,
    StandingsResponse, StandingsRow,
};
use crate::{
    DivisionStandings, GameDetail, GameState, GameSummary, TeamRecord, TeamSide, group_standings,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, warn};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

const NHLE_WEB: &str = "https://api-web.nhle.com";
pub(crate) const USER_AGENT: &str = "puckfeed/0.1 (live scores)";
pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the shared HTTP client. Falls back to reqwest's defaults if the
/// builder rejects the configuration.
pub(crate) fn http_client() -> Client {
    Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_default()
}

/// Schedule and gamecenter client for the NHL web API.
#[derive(Debug, Clone)]
pub struct NhlApi {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl Default for NhlApi {
    fn default() -> Self {
        Self {
            client: http_client(),
            base_url: NHLE_WEB.to_owned(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl NhlApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the client at another host (proxy or test server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Games scheduled on `date`.
    ///
    /// The endpoint answers with a week window starting at `date`; only the
    /// matching day is kept. A week without that day, or a 404, is an empty
    /// list rather than an error.
    pub async fn fetch_schedule(&self, date: NaiveDate) -> ApiResult<Vec<GameSummary>> {
        let day = date.format("%Y-%m-%d").to_string();
        let url = format!("{}/v1/schedule/{day}", self.base_url);
        let Some(raw) = self.get::<ScheduleResponse>(&url).await? else {
            debug!("no schedule published for {day}");
            return Ok(Vec::new());
        };
        Ok(map_schedule(raw, &day))
    }

    /// Raw gamecenter payload, with the boxscore attached when the landing
    /// document lacks player stats.
    pub async fn fetch_landing(&self, game_id: i64) -> ApiResult<LandingPayload> {
        let landing_url = format!("{}/v1/gamecenter/{game_id}/landing", self.base_url);
        let mut landing = self
            .get::<LandingPayload>(&landing_url)
            .await?
            .ok_or(ApiError::Http { status: 404, url: landing_url })?;

        if !boxscore::has_player_stats(&landing) {
            let boxscore_url = format!("{}/v1/gamecenter/{game_id}/boxscore", self.base_url);
            match self.get::<LandingPayload>(&boxscore_url).await {
                Ok(Some(extra)) => boxscore::merge_boxscore(&mut landing, extra),
                Ok(None) => debug!("no boxscore published for game {game_id}"),
                Err(e) => warn!("boxscore fetch failed for game {game_id}: {e}"),
            }
        }
        Ok(landing)
    }

    /// Fetch and normalize the detail record for one game.
    pub async fn fetch_game_detail(&self, game_id: i64) -> ApiResult<GameDetail> {
        let payload = self.fetch_landing(game_id).await?;
        let mut detail = boxscore::normalize(&payload);
        detail.game_id = game_id;
        Ok(detail)
    }

    /// League standings as of today. A 404 is an empty table.
    pub async fn fetch_standings(&self) -> ApiResult<Vec<DivisionStandings>> {
        let url = format!("{}/v1/standings/now", self.base_url);
        let Some(raw) = self.get::<StandingsResponse>(&url).await? else {
            debug!("no standings published");
            return Ok(Vec::new());
        };
        Ok(map_standings(raw))
    }

    /// GET + decode. `Ok(None)` on 404.
    async fn get<T: DeserializeOwned>(&self, url: &str) -> ApiResult<Option<T>> {
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ApiError::network(url, e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ApiError::Http { status: status.as_u16(), url: url.to_owned() });
        }

        let body = response.text().await.map_err(|e| ApiError::network(url, e))?;
        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| ApiError::parse(url, e))
    }
}

#[async_trait]
impl ScheduleFeed for NhlApi {
    async fn games_on(&self, date: NaiveDate) -> ApiResult<Vec<GameSummary>> {
        self.fetch_schedule(date).await
    }
}

#[async_trait]
impl GameDetailFeed for NhlApi {
    async fn game_detail(&self, game_id: i64) -> ApiResult<GameDetail> {
        self.fetch_game_detail(game_id).await
    }
}

#[async_trait]
impl StandingsFeed for NhlApi {
    async fn standings(&self) -> ApiResult<Vec<DivisionStandings>> {
        self.fetch_standings().await
    }
}

// ---------------------------------------------------------------------------
// Mapping: NHL web wire types → clean domain types
// ---------------------------------------------------------------------------

fn map_schedule(raw: ScheduleResponse, day: &str) -> Vec<GameSummary> {
    raw.game_week
        .unwrap_or_default()
        .into_iter()
        .find(|d| d.date.as_deref() == Some(day))
        .and_then(|d| d.games)
        .unwrap_or_default()
        .iter()
        .map(map_game)
        .collect()
}

fn map_game(game: &ScheduleGame) -> GameSummary {
    let state = game
        .game_state
        .as_deref()
        .map(GameState::from_code)
        .unwrap_or_default();

    let start_time = game
        .start_time_utc
        .as_deref()
        .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
        .map(|dt| dt.with_timezone(&Utc));

    GameSummary {
        id: game.id.unwrap_or_default(),
        state,
        start_time,
        venue: Localized::text(&game.venue).unwrap_or_default(),
        away: game.away_team.as_ref().map(map_team).unwrap_or_default(),
        home: game.home_team.as_ref().map(map_team).unwrap_or_default(),
    }
}

fn map_team(team: &ScheduleTeam) -> TeamSide {
    let abbrev = team.abbrev.clone().unwrap_or_default();
    let name = Localized::text(&team.name)
        .or_else(|| {
            let place = Localized::text(&team.place_name)?;
            Some(match Localized::text(&team.common_name) {
                Some(common) => format!("{place} {common}"),
                None => place,
            })
        })
        .unwrap_or_else(|| abbrev.clone());

    TeamSide {
        id: team.id.unwrap_or_default(),
        name,
        abbrev,
        score: team.score.unwrap_or(0),
    }
}

/// Rows without a conference or division are skipped.
fn map_standings(raw: StandingsResponse) -> Vec<DivisionStandings> {
    let records = raw
        .standings
        .unwrap_or_default()
        .iter()
        .filter_map(map_record)
        .collect();
    group_standings(records)
}

fn map_record(row: &StandingsRow) -> Option<TeamRecord> {
    let conference = row.conference_name.clone().filter(|s| !s.trim().is_empty())?;
    let division = row.division_name.clone().filter(|s| !s.trim().is_empty())?;
    let abbrev = Localized::text(&row.team_abbrev).unwrap_or_default();
    let division_rank = match Count::value(&row.division_rank) {
        0 => Count::value(&row.division_sequence),
        rank => rank,
    };

    Some(TeamRecord {
        name: Localized::text(&row.team_name).unwrap_or_else(|| abbrev.clone()),
        abbrev,
        conference,
        division,
        division_rank,
        games_played: Count::value(&row.games_played),
        wins: Count::value(&row.wins),
        losses: Count::value(&row.losses),
        ot_losses: Count::value(&row.ot_losses),
        points: Count::value(&row.points),
        clinch_indicator: row.clinch_indicator.clone().filter(|s| !s.trim().is_empty()),
    })
}
