//! In-memory feeds for state tests.
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use puck_api::feeds::{
    ContentFeed, GameDetailFeed, GameInsights, InsightRequest, ScheduleFeed, StandingsFeed,
    SummaryRequest, Summarizer, VideoLookup,
};
use puck_api::{
    ApiError, ApiResult, DivisionStandings, Enrichment, GameDetail, GameSummary, RawFeedItem,
    VideoRef,
};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Default)]
pub struct FakeSchedule {
    days: HashMap<NaiveDate, Vec<GameSummary>>,
    error: Option<ApiError>,
}

impl FakeSchedule {
    pub fn new(days: Vec<(NaiveDate, Vec<GameSummary>)>) -> Self {
        Self { days: days.into_iter().collect(), error: None }
    }

    pub fn failing(error: ApiError) -> Self {
        Self { error: Some(error), ..Default::default() }
    }
}

#[async_trait]
impl ScheduleFeed for FakeSchedule {
    async fn games_on(&self, date: NaiveDate) -> ApiResult<Vec<GameSummary>> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        Ok(self.days.get(&date).cloned().unwrap_or_default())
    }
}

pub struct FakeDetail;

#[async_trait]
impl GameDetailFeed for FakeDetail {
    async fn game_detail(&self, game_id: i64) -> ApiResult<GameDetail> {
        Ok(GameDetail { game_id, ..Default::default() })
    }
}

pub struct FakeContent(pub Vec<RawFeedItem>);

#[async_trait]
impl ContentFeed for FakeContent {
    async fn items(&self, _topic: &str) -> ApiResult<Vec<RawFeedItem>> {
        Ok(self.0.clone())
    }
}

/// Echoes each title back as its summary. Can be told to fail or to return
/// one item short.
#[derive(Default)]
pub struct FakeSummarizer {
    batches: Mutex<Vec<usize>>,
    error: Mutex<Option<ApiError>>,
    short: Mutex<bool>,
}

impl FakeSummarizer {
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().unwrap().clone()
    }

    pub fn fail_with(&self, error: ApiError) {
        *self.error.lock().unwrap() = Some(error);
    }

    pub fn recover(&self) {
        *self.error.lock().unwrap() = None;
    }

    pub fn drop_last(&self) {
        *self.short.lock().unwrap() = true;
    }
}

#[async_trait]
impl Summarizer for FakeSummarizer {
    async fn enrich(&self, batch: &[SummaryRequest]) -> ApiResult<Vec<Enrichment>> {
        if let Some(err) = self.error.lock().unwrap().clone() {
            return Err(err);
        }
        self.batches.lock().unwrap().push(batch.len());
        let mut out: Vec<Enrichment> = batch
            .iter()
            .map(|req| Enrichment { summary: format!("about {}", req.title), image_url: String::new() })
            .collect();
        if *self.short.lock().unwrap() {
            out.pop();
        }
        Ok(out)
    }
}

pub struct FakeVideo {
    answer: ApiResult<Option<VideoRef>>,
    calls: AtomicUsize,
}

impl FakeVideo {
    pub fn found(video_id: &str) -> Self {
        Self::with(Ok(Some(VideoRef { video_id: video_id.into() })))
    }

    pub fn missing() -> Self {
        Self::with(Ok(None))
    }

    pub fn failing(error: ApiError) -> Self {
        Self::with(Err(error))
    }

    fn with(answer: ApiResult<Option<VideoRef>>) -> Self {
        Self { answer, calls: AtomicUsize::new(0) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VideoLookup for FakeVideo {
    async fn find_highlight(
        &self,
        _away: &str,
        _home: &str,
        _start_time: Option<DateTime<Utc>>,
    ) -> ApiResult<Option<VideoRef>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer.clone()
    }
}

pub struct FakeStandings(pub ApiResult<Vec<DivisionStandings>>);

#[async_trait]
impl StandingsFeed for FakeStandings {
    async fn standings(&self) -> ApiResult<Vec<DivisionStandings>> {
        self.0.clone()
    }
}

/// Records every prompt it is asked to answer.
pub struct FakeInsights {
    answer: ApiResult<String>,
    prompts: Mutex<Vec<String>>,
}

impl FakeInsights {
    pub fn answering(text: &str) -> Self {
        Self { answer: Ok(text.to_owned()), prompts: Mutex::new(Vec::new()) }
    }

    pub fn failing(error: ApiError) -> Self {
        Self { answer: Err(error), prompts: Mutex::new(Vec::new()) }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GameInsights for FakeInsights {
    async fn insights(&self, request: &InsightRequest) -> ApiResult<String> {
        self.prompts.lock().unwrap().push(request.prompt());
        self.answer.clone()
    }
}
