use crate::state::app_settings::AppSettings;
use crate::state::enrichment::EnrichmentPager;
use crate::state::highlight::resolve_highlight;
use crate::state::insights::resolve_insights;
use crate::state::messages::{NetworkRequest, NetworkResponse};
use log::{debug, error};
use puck_api::client::NhlApi;
use puck_api::content::ContentClient;
use puck_api::feeds::{
    ContentFeed, GameDetailFeed, GameInsights, ScheduleFeed, StandingsFeed, Summarizer,
    VideoLookup,
};
use puck_api::gemini::GeminiClient;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Everything the worker talks to.
#[derive(Clone)]
pub struct Feeds {
    pub schedule: Arc<dyn ScheduleFeed>,
    pub detail: Arc<dyn GameDetailFeed>,
    pub standings: Arc<dyn StandingsFeed>,
    pub content: Arc<dyn ContentFeed>,
    pub summarizer: Arc<dyn Summarizer>,
    pub insights: Arc<dyn GameInsights>,
    pub video: Arc<dyn VideoLookup>,
}

impl Feeds {
    pub fn from_settings(settings: &AppSettings) -> Self {
        let mut nhl = NhlApi::new().with_timeout(settings.timeout);
        if let Some(base) = &settings.nhl_base {
            nhl = nhl.with_base_url(base.as_str());
        }
        let mut content = ContentClient::new().with_timeout(settings.timeout);
        if let Some(base) = &settings.content_base {
            content = content.with_base_url(base.as_str());
        }
        let mut gemini = GeminiClient::new(settings.api_key.clone()).with_timeout(settings.timeout);
        if let Some(model) = &settings.model {
            gemini = gemini.with_model(model.as_str());
        }
        if let Some(base) = &settings.gemini_base {
            gemini = gemini.with_base_url(base.as_str());
        }

        let nhl = Arc::new(nhl);
        let gemini = Arc::new(gemini);
        Self {
            schedule: nhl.clone(),
            detail: nhl.clone(),
            standings: nhl,
            content: Arc::new(content),
            summarizer: gemini.clone(),
            insights: gemini.clone(),
            video: gemini,
        }
    }
}

/// Runs every request on its own task so a slow call never holds up the
/// others. Results come back in resolution order; the state layer drops the
/// stale ones.
pub struct NetworkWorker {
    feeds: Feeds,
    pager: EnrichmentPager,
    requests: mpsc::Receiver<NetworkRequest>,
    responses: mpsc::Sender<NetworkResponse>,
}

impl NetworkWorker {
    pub fn new(
        feeds: Feeds,
        pager: EnrichmentPager,
        requests: mpsc::Receiver<NetworkRequest>,
        responses: mpsc::Sender<NetworkResponse>,
    ) -> Self {
        Self { feeds, pager, requests, responses }
    }

    pub async fn run(mut self) {
        while let Some(request) = self.requests.recv().await {
            let feeds = self.feeds.clone();
            let pager = self.pager.clone();
            let responses = self.responses.clone();
            tokio::spawn(async move {
                let response = handle_request(request, &feeds, &pager).await;
                if let Err(e) = responses.send(response).await {
                    error!("Failed to send network response: {e}");
                }
            });
        }
        debug!("network worker stopped");
    }
}

async fn handle_request(
    request: NetworkRequest,
    feeds: &Feeds,
    pager: &EnrichmentPager,
) -> NetworkResponse {
    match request {
        NetworkRequest::LoadSchedule { ticket } => {
            debug!("loading schedule for {} ({:?})", ticket.date, ticket.mode);
            let result = feeds.schedule.games_on(ticket.date).await;
            NetworkResponse::ScheduleLoaded { ticket, result }
        }
        NetworkRequest::LoadGameDetail { game_id, generation } => {
            debug!("loading game detail for {game_id}");
            let result = feeds.detail.game_detail(game_id).await;
            NetworkResponse::GameDetailLoaded { game_id, generation, result }
        }
        NetworkRequest::LoadHighlight { game, selection } => {
            let video = resolve_highlight(feeds.video.as_ref(), &game).await;
            NetworkResponse::HighlightResolved { game_id: game.id, selection, video }
        }
        NetworkRequest::LoadInsights { game_id, selection, request } => {
            let insights = resolve_insights(feeds.insights.as_ref(), &request).await;
            NetworkResponse::InsightsResolved { game_id, selection, insights }
        }
        NetworkRequest::LoadNews { topic, generation } => {
            debug!("loading news for {topic:?}");
            let result = match feeds.content.items(&topic).await {
                Ok(items) => pager.initialize(items, feeds.summarizer.as_ref()).await,
                Err(err) => Err(err),
            };
            NetworkResponse::NewsLoaded { generation, result }
        }
        NetworkRequest::LoadMoreNews { page, generation } => {
            let result = pager.load_more(&page, feeds.summarizer.as_ref()).await;
            NetworkResponse::MoreNewsLoaded { generation, result }
        }
        NetworkRequest::LoadStandings { generation } => {
            debug!("loading standings");
            let result = feeds.standings.standings().await;
            NetworkResponse::StandingsLoaded { generation, result }
        }
    }
}
