//! Paged enrichment of the news feed.
//!
//! The raw feed is filtered once against the trusted-source list; paging is
//! computed over that filtered list. Each page is summarized as one batch and
//! appended only when the whole batch succeeds.
use log::debug;
use puck_api::feeds::{SummaryRequest, Summarizer};
use puck_api::{ApiError, ApiResult, EnrichedItem, RawFeedItem};
use std::sync::Arc;

pub const DEFAULT_PAGE_SIZE: usize = 6;

pub const DEFAULT_TRUSTED_SOURCES: &[&str] = &[
    "NHL.com",
    "ESPN",
    "The Athletic",
    "Sportsnet",
    "TSN",
    "The Hockey News",
    "Associated Press",
    "AP News",
    "Yahoo Sports",
    "CBS Sports",
    "Daily Faceoff",
    "Reuters",
];

#[derive(Debug, Clone, PartialEq)]
pub struct PageState {
    filtered: Arc<[RawFeedItem]>,
    page_size: usize,
    current_page: usize,
    displayed: Vec<EnrichedItem>,
    has_more: bool,
}

impl PageState {
    fn new(filtered: Vec<RawFeedItem>, page_size: usize) -> Self {
        Self {
            has_more: !filtered.is_empty(),
            filtered: filtered.into(),
            page_size,
            current_page: 0,
            displayed: Vec::new(),
        }
    }

    pub fn displayed(&self) -> &[EnrichedItem] {
        &self.displayed
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn filtered_len(&self) -> usize {
        self.filtered.len()
    }

    /// Nothing in the feed survived filtering.
    pub fn is_empty(&self) -> bool {
        self.filtered.is_empty()
    }

    fn next_slice(&self) -> &[RawFeedItem] {
        let start = (self.current_page * self.page_size).min(self.filtered.len());
        let end = (start + self.page_size).min(self.filtered.len());
        &self.filtered[start..end]
    }
}

#[derive(Debug, Clone)]
pub struct EnrichmentPager {
    trusted: Vec<String>,
    page_size: usize,
}

impl EnrichmentPager {
    /// An empty trusted list lets every source through.
    pub fn new<S: AsRef<str>>(trusted: impl IntoIterator<Item = S>, page_size: usize) -> Self {
        let trusted = trusted
            .into_iter()
            .map(|s| s.as_ref().trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        Self { trusted, page_size: page_size.max(1) }
    }

    /// Keep items whose source contains a trusted name, ignoring case.
    pub fn filter(&self, raw: Vec<RawFeedItem>) -> Vec<RawFeedItem> {
        if self.trusted.is_empty() {
            return raw;
        }
        raw.into_iter()
            .filter(|item| {
                let source = item.source.to_lowercase();
                self.trusted.iter().any(|t| source.contains(t.as_str()))
            })
            .collect()
    }

    /// Filter the feed and enrich its first page. An empty filtered list is
    /// a valid "no content" state.
    pub async fn initialize(
        &self,
        raw: Vec<RawFeedItem>,
        summarizer: &dyn Summarizer,
    ) -> ApiResult<PageState> {
        let total = raw.len();
        let state = PageState::new(self.filter(raw), self.page_size);
        debug!("news feed: {total} items, {} from trusted sources", state.filtered_len());
        if state.is_empty() {
            return Ok(state);
        }
        self.load_more(&state, summarizer).await
    }

    /// Enrich the next page. On failure the caller keeps `state` unchanged.
    pub async fn load_more(
        &self,
        state: &PageState,
        summarizer: &dyn Summarizer,
    ) -> ApiResult<PageState> {
        let slice = state.next_slice();
        if slice.is_empty() {
            return Ok(state.clone());
        }

        let batch: Vec<SummaryRequest> = slice.iter().map(SummaryRequest::from).collect();
        let enrichments = summarizer.enrich(&batch).await?;
        if enrichments.len() != slice.len() {
            return Err(ApiError::Parse {
                url: String::new(),
                message: format!(
                    "expected {} summaries, got {}",
                    slice.len(),
                    enrichments.len()
                ),
            });
        }

        let mut next = state.clone();
        next.displayed.extend(
            slice
                .iter()
                .cloned()
                .zip(enrichments)
                .map(|(item, enrichment)| EnrichedItem::new(item, enrichment)),
        );
        next.current_page += 1;
        next.has_more = next.filtered.len() > next.displayed.len();
        debug!(
            "news page {} loaded, {}/{} shown",
            next.current_page,
            next.displayed.len(),
            next.filtered.len()
        );
        Ok(next)
    }
}

impl Default for EnrichmentPager {
    fn default() -> Self {
        Self::new(DEFAULT_TRUSTED_SOURCES.iter().copied(), DEFAULT_PAGE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::fakes::FakeSummarizer;
    use std::collections::HashSet;

    fn items(n: usize, source: &str) -> Vec<RawFeedItem> {
        (0..n)
            .map(|i| RawFeedItem {
                title: format!("story {i}"),
                link: format!("https://example.com/{i}"),
                source: source.into(),
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn filter_is_case_insensitive_substring() {
        let pager = EnrichmentPager::new(["espn", "The Athletic"], 6);
        let mut raw = items(1, "ESPN.com");
        raw.extend(items(1, "the athletic"));
        raw.extend(items(1, "Random Blog"));
        let kept = pager.filter(raw);
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|i| i.source != "Random Blog"));
    }

    #[test]
    fn empty_trust_list_keeps_everything() {
        let pager = EnrichmentPager::new(Vec::<String>::new(), 6);
        assert_eq!(pager.filter(items(3, "anyone")).len(), 3);
    }

    #[tokio::test]
    async fn fourteen_items_page_six_at_a_time() {
        let pager = EnrichmentPager::new(["ESPN"], 6);
        let summarizer = FakeSummarizer::default();

        let mut raw = items(14, "ESPN");
        raw.extend(items(5, "Untrusted"));

        let page = pager.initialize(raw, &summarizer).await.unwrap();
        assert_eq!(page.displayed().len(), 6);
        assert!(page.has_more());

        let page = pager.load_more(&page, &summarizer).await.unwrap();
        assert_eq!(page.displayed().len(), 12);
        assert!(page.has_more());

        let page = pager.load_more(&page, &summarizer).await.unwrap();
        assert_eq!(page.displayed().len(), 14);
        assert!(!page.has_more());
        assert_eq!(summarizer.batch_sizes(), vec![6, 6, 2]);
    }

    #[tokio::test]
    async fn exhausted_state_never_calls_summarizer() {
        let pager = EnrichmentPager::new(["ESPN"], 6);
        let summarizer = FakeSummarizer::default();
        let page = pager.initialize(items(3, "ESPN"), &summarizer).await.unwrap();
        assert!(!page.has_more());

        let again = pager.load_more(&page, &summarizer).await.unwrap();
        assert_eq!(again, page);
        assert_eq!(summarizer.batch_sizes(), vec![3]);
    }

    #[tokio::test]
    async fn nothing_trusted_is_no_content_not_error() {
        let pager = EnrichmentPager::new(["ESPN"], 6);
        let summarizer = FakeSummarizer::default();
        let page = pager.initialize(items(4, "Blog"), &summarizer).await.unwrap();
        assert!(page.is_empty());
        assert!(!page.has_more());
        assert!(summarizer.batch_sizes().is_empty());
    }

    #[tokio::test]
    async fn quota_failure_keeps_displayed_page() {
        let pager = EnrichmentPager::new(["ESPN"], 6);
        let summarizer = FakeSummarizer::default();
        let page = pager.initialize(items(14, "ESPN"), &summarizer).await.unwrap();

        summarizer.fail_with(ApiError::QuotaExceeded("daily limit".into()));
        let err = pager.load_more(&page, &summarizer).await.unwrap_err();
        assert!(matches!(err, ApiError::QuotaExceeded(_)));
        assert!(!err.is_retryable());
        assert_eq!(page.displayed().len(), 6);
        assert_eq!(page.current_page(), 1);

        summarizer.recover();
        let page = pager.load_more(&page, &summarizer).await.unwrap();
        assert_eq!(page.displayed().len(), 12);
    }

    #[tokio::test]
    async fn short_batch_is_rejected() {
        let pager = EnrichmentPager::new(["ESPN"], 6);
        let summarizer = FakeSummarizer::default();
        summarizer.drop_last();
        let err = pager.initialize(items(6, "ESPN"), &summarizer).await.unwrap_err();
        assert!(matches!(err, ApiError::Parse { .. }));
    }

    #[tokio::test]
    async fn paging_to_exhaustion_shows_each_item_once() {
        for (n, size) in [(1, 1), (7, 3), (12, 6), (13, 5), (20, 20)] {
            let pager = EnrichmentPager::new(["ESPN"], size);
            let summarizer = FakeSummarizer::default();
            let mut page = pager.initialize(items(n, "ESPN"), &summarizer).await.unwrap();
            while page.has_more() {
                page = pager.load_more(&page, &summarizer).await.unwrap();
            }
            let links: HashSet<&str> =
                page.displayed().iter().map(|e| e.item.link.as_str()).collect();
            assert_eq!(page.displayed().len(), n);
            assert_eq!(links.len(), n);
        }
    }
}
