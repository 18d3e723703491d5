//! News syndication client. Talks to an rss2json-compatible endpoint that
//! turns a topic search RSS feed into JSON.
use crate::client::{http_client, DEFAULT_TIMEOUT};
use crate::error::{ApiError, ApiResult};
use crate::feeds::ContentFeed;
use crate::RawFeedItem;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use log::debug;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::time::Duration;

const RSS2JSON: &str = "https://api.rss2json.com";
const TOPIC_SEARCH: &str = "https://news.google.com/rss/search";

#[derive(Debug, Deserialize, Default)]
struct FeedResponse {
    status: Option<String>,
    message: Option<String>,
    items: Option<Vec<FeedEntry>>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct FeedEntry {
    title: Option<String>,
    link: Option<String>,
    pub_date: Option<String>,
    author: Option<String>,
    source: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ContentClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl Default for ContentClient {
    fn default() -> Self {
        Self {
            client: http_client(),
            base_url: RSS2JSON.to_owned(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ContentClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Items for a topic, newest first as the feed orders them.
    pub async fn fetch_items(&self, topic: &str) -> ApiResult<Vec<RawFeedItem>> {
        let endpoint = format!("{}/v1/api.json", self.base_url);
        let url = feed_url(&endpoint, topic)?;
        debug!("fetching content feed for topic {topic:?}");

        let response = self
            .client
            .get(url.clone())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ApiError::network(url.as_str(), e))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(ApiError::Http { status: status.as_u16(), url: url.to_string() });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ApiError::network(url.as_str(), e))?;
        let raw: FeedResponse =
            serde_json::from_str(&body).map_err(|e| ApiError::parse(url.as_str(), e))?;

        if raw.status.as_deref().is_some_and(|s| s != "ok") {
            let message = raw.message.unwrap_or_else(|| "feed conversion failed".into());
            return Err(ApiError::parse(url.as_str(), message));
        }

        Ok(raw
            .items
            .unwrap_or_default()
            .into_iter()
            .filter_map(map_entry)
            .collect())
    }
}

#[async_trait]
impl ContentFeed for ContentClient {
    async fn items(&self, topic: &str) -> ApiResult<Vec<RawFeedItem>> {
        self.fetch_items(topic).await
    }
}

fn feed_url(endpoint: &str, topic: &str) -> ApiResult<Url> {
    let rss = Url::parse_with_params(
        TOPIC_SEARCH,
        &[("q", topic), ("hl", "en-US"), ("gl", "US"), ("ceid", "US:en")],
    )
    .map_err(|e| ApiError::parse(TOPIC_SEARCH, e))?;
    Url::parse_with_params(endpoint, &[("rss_url", rss.as_str())])
        .map_err(|e| ApiError::parse(endpoint, e))
}

/// Entries without a title or link are dropped.
fn map_entry(entry: FeedEntry) -> Option<RawFeedItem> {
    let title = entry.title.filter(|t| !t.trim().is_empty())?;
    let link = entry.link.filter(|l| !l.trim().is_empty())?;

    let non_empty = |s: Option<String>| s.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty());
    let (title, source) = match non_empty(entry.source).or_else(|| non_empty(entry.author)) {
        Some(source) => (strip_outlet(&title, &source), source),
        None => split_outlet(&title),
    };

    Some(RawFeedItem {
        title,
        link,
        published_at: entry.pub_date.as_deref().and_then(parse_pub_date),
        source,
    })
}

/// "Headline - Outlet" → ("Headline", "Outlet").
fn split_outlet(title: &str) -> (String, String) {
    match title.rsplit_once(" - ") {
        Some((head, outlet)) if !head.trim().is_empty() && !outlet.trim().is_empty() => {
            (head.trim().to_owned(), outlet.trim().to_owned())
        }
        _ => (title.trim().to_owned(), String::new()),
    }
}

fn strip_outlet(title: &str, source: &str) -> String {
    let suffix = format!(" - {source}");
    title
        .trim()
        .strip_suffix(&suffix)
        .unwrap_or(title.trim())
        .to_owned()
}

fn parse_pub_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|naive| naive.and_utc())
        })
}
