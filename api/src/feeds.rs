//! Collaborator seams. The HTTP clients implement these; the stateful
//! components in the app only ever see the traits.
use crate::{
    ApiResult, DivisionStandings, Enrichment, GameDetail, GameSummary, RawFeedItem, VideoRef,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

#[async_trait]
pub trait ScheduleFeed: Send + Sync {
    /// Games on one calendar date. An empty list is a valid answer.
    async fn games_on(&self, date: NaiveDate) -> ApiResult<Vec<GameSummary>>;
}

#[async_trait]
pub trait GameDetailFeed: Send + Sync {
    /// Fetch and normalize the detail payload for one game.
    async fn game_detail(&self, game_id: i64) -> ApiResult<GameDetail>;
}

#[async_trait]
pub trait StandingsFeed: Send + Sync {
    /// Current standings, grouped by conference and division.
    async fn standings(&self) -> ApiResult<Vec<DivisionStandings>>;
}

#[async_trait]
pub trait ContentFeed: Send + Sync {
    async fn items(&self, topic: &str) -> ApiResult<Vec<RawFeedItem>>;
}

/// Title and source of one item to summarize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRequest {
    pub title: String,
    pub source: String,
}

impl From<&RawFeedItem> for SummaryRequest {
    fn from(item: &RawFeedItem) -> Self {
        Self { title: item.title.clone(), source: item.source.clone() }
    }
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    /// One enrichment per request, in the same order.
    async fn enrich(&self, batch: &[SummaryRequest]) -> ApiResult<Vec<Enrichment>>;
}

#[async_trait]
pub trait VideoLookup: Send + Sync {
    /// `Ok(None)` when no highlight exists yet.
    async fn find_highlight(
        &self,
        away: &str,
        home: &str,
        start_time: Option<DateTime<Utc>>,
    ) -> ApiResult<Option<VideoRef>>;
}

/// Score line and scoring plays of one game, ready to be summarized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsightRequest {
    pub away: String,
    pub away_score: u16,
    pub home: String,
    pub home_score: u16,
    /// "P{period} {clock}: {scorer} ({team})"
    pub plays: Vec<String>,
}

impl InsightRequest {
    pub fn new(game: &GameSummary, detail: &GameDetail) -> Self {
        Self {
            away: game.away.name.clone(),
            away_score: game.away.score,
            home: game.home.name.clone(),
            home_score: game.home.score,
            plays: detail
                .scoring
                .iter()
                .map(|p| format!("P{} {}: {} ({})", p.period, p.clock, p.scorer, p.team_abbrev))
                .collect(),
        }
    }

    pub fn prompt(&self) -> String {
        format!(
            "Summarize: {} {} @ {} {}. Plays:\n{}\nGive 3 short bullet points.",
            self.away,
            self.away_score,
            self.home,
            self.home_score,
            self.plays.join("\n")
        )
    }
}

#[async_trait]
pub trait GameInsights: Send + Sync {
    /// A short plain-text summary of the game so far.
    async fn insights(&self, request: &InsightRequest) -> ApiResult<String>;
}
