//! Generative-language client used for article summaries, game insights and
//! highlight lookups. All go through `models/{model}:generateContent`.
use crate::client::{http_client, DEFAULT_TIMEOUT};
use crate::error::{ApiError, ApiResult};
use crate::feeds::{GameInsights, InsightRequest, SummaryRequest, Summarizer, VideoLookup};
use crate::{Enrichment, VideoRef, GENERIC_IMAGE_URL};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

const GEMINI_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

const SUMMARY_INSTRUCTIONS: &str = "\
You are given a numbered list of hockey news headlines with their outlets.
For each item, in the same order, return an object with:
- \"summary\": one concise sentence describing the story.
- \"imageUrl\": an image for the story, chosen in this order:
  1. the article's own lead image if you can find it;
  2. otherwise, if one NHL team is clearly the subject, that team's logo from
     https://assets.nhle.com/logos/nhl/svg/{ABBREV}_light.svg;
  3. otherwise the generic image https://assets.nhle.com/logos/nhl/svg/NHL_light.svg.
  imageUrl must never be empty.
Return exactly one object per input item as a JSON array, nothing else.";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize, Default)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize, Default)]
struct Content {
    parts: Option<Vec<Part>>,
}

#[derive(Debug, Deserialize, Default)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize, Default)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct VideoAnswer {
    video_id: Option<String>,
}

impl GenerateResponse {
    fn text(&self) -> Option<String> {
        let parts = self.candidates.as_ref()?.first()?.content.as_ref()?.parts.as_ref()?;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl GeminiClient {
    /// A client without a key still constructs; every call then fails with
    /// `InvalidCredential` before touching the network.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: http_client(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: DEFAULT_MODEL.to_owned(),
            base_url: GEMINI_BASE.to_owned(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn has_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Summaries and images for a batch, positionally aligned with `batch`.
    pub async fn summarize(&self, batch: &[SummaryRequest]) -> ApiResult<Vec<Enrichment>> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }
        let listing: String = batch
            .iter()
            .enumerate()
            .map(|(i, req)| format!("{}. {} ({})\n", i + 1, req.title, req.source))
            .collect();
        let body = json!({
            "contents": [{ "parts": [{ "text": format!("{SUMMARY_INSTRUCTIONS}\n\n{listing}") }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "summary": { "type": "STRING" },
                            "imageUrl": { "type": "STRING" }
                        },
                        "required": ["summary", "imageUrl"]
                    }
                }
            }
        });

        let (url, mut items): (String, Vec<Enrichment>) = self.generate(&body).await?;
        if items.len() != batch.len() {
            return Err(ApiError::parse(
                &url,
                format!("expected {} summaries, got {}", batch.len(), items.len()),
            ));
        }
        for item in &mut items {
            if item.image_url.trim().is_empty() {
                item.image_url = GENERIC_IMAGE_URL.to_owned();
            }
        }
        Ok(items)
    }

    /// Search-grounded lookup of the official highlight video for a game.
    pub async fn highlight_video(
        &self,
        away: &str,
        home: &str,
        start_time: Option<DateTime<Utc>>,
    ) -> ApiResult<Option<VideoRef>> {
        let when = start_time
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "its scheduled date".into());
        let prompt = format!(
            "Find the official NHL YouTube highlight video for the game between {away} and \
             {home} on {when}. Respond with only a JSON object {{\"videoId\": \"...\"}} holding \
             the YouTube video id, or {{\"videoId\": null}} if there is none."
        );
        // Search grounding does not combine with a JSON response schema, so the
        // shape is asked for in the prompt instead.
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "tools": [{ "googleSearch": {} }]
        });

        let (_, answer): (String, Option<VideoAnswer>) = self.generate(&body).await?;
        Ok(answer
            .and_then(|a| a.video_id)
            .map(|id| id.trim().to_owned())
            .filter(|id| !id.is_empty())
            .map(|video_id| VideoRef { video_id }))
    }

    /// Three short bullet points about a game, as plain text.
    pub async fn game_insights(&self, request: &InsightRequest) -> ApiResult<String> {
        let body = json!({ "contents": [{ "parts": [{ "text": request.prompt() }] }] });
        let (_, text) = self.generate_text(&body).await?;
        Ok(text.trim().to_owned())
    }

    /// POST a generateContent request and decode the model's JSON text.
    async fn generate<T: DeserializeOwned>(&self, body: &Value) -> ApiResult<(String, T)> {
        let (url, answer) = self.generate_text(body).await?;
        let decoded = serde_json::from_str(strip_fences(&answer))
            .map_err(|e| ApiError::parse(&url, e))?;
        Ok((url, decoded))
    }

    /// POST a generateContent request; returns the endpoint and the model text.
    async fn generate_text(&self, body: &Value) -> ApiResult<(String, String)> {
        let Some(key) = self.api_key.as_deref() else {
            return Err(ApiError::InvalidCredential("no API key configured".into()));
        };
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model);
        debug!("generateContent on {}", self.model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", key)
            .json(body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ApiError::network(&url, e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| ApiError::network(&url, e))?;
        if !status.is_success() {
            return Err(classify_failure(&url, status, &text));
        }

        let envelope: GenerateResponse =
            serde_json::from_str(&text).map_err(|e| ApiError::parse(&url, e))?;
        let answer = envelope
            .text()
            .ok_or_else(|| ApiError::parse(&url, "response had no text candidate"))?;
        Ok((url, answer))
    }
}

#[async_trait]
impl Summarizer for GeminiClient {
    async fn enrich(&self, batch: &[SummaryRequest]) -> ApiResult<Vec<Enrichment>> {
        self.summarize(batch).await
    }
}

#[async_trait]
impl GameInsights for GeminiClient {
    async fn insights(&self, request: &InsightRequest) -> ApiResult<String> {
        self.game_insights(request).await
    }
}

#[async_trait]
impl VideoLookup for GeminiClient {
    async fn find_highlight(
        &self,
        away: &str,
        home: &str,
        start_time: Option<DateTime<Utc>>,
    ) -> ApiResult<Option<VideoRef>> {
        self.highlight_video(away, home, start_time).await
    }
}

fn classify_failure(url: &str, status: StatusCode, body: &str) -> ApiError {
    let detail: ErrorBody = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.error)
        .unwrap_or_default();
    let message = detail.message.unwrap_or_else(|| status.to_string());

    if status == StatusCode::TOO_MANY_REQUESTS
        || detail.status.as_deref() == Some("RESOURCE_EXHAUSTED")
    {
        warn!("summarization quota exhausted: {message}");
        return ApiError::QuotaExceeded(message);
    }
    let bad_key = message.to_ascii_lowercase().contains("api key");
    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
        || (status == StatusCode::BAD_REQUEST && bad_key)
    {
        return ApiError::InvalidCredential(message);
    }
    ApiError::Http { status: status.as_u16(), url: url.to_owned() }
}

/// Drop a surrounding ```json ... ``` fence if the model added one.
fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
