use crate::cli::Options;
use crate::state::enrichment::{DEFAULT_PAGE_SIZE, DEFAULT_TRUSTED_SOURCES};
use log::LevelFilter;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub poll_interval: Duration,
    pub page_size: usize,
    pub trusted_sources: Vec<String>,
    pub topic: String,
    pub timeout: Duration,
    pub nhl_base: Option<String>,
    pub content_base: Option<String>,
    pub gemini_base: Option<String>,
    pub log_level: LevelFilter,
    pub full_screen: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: None,
            poll_interval: Duration::from_secs(15),
            page_size: DEFAULT_PAGE_SIZE,
            trusted_sources: DEFAULT_TRUSTED_SOURCES.iter().map(|s| s.to_string()).collect(),
            topic: "NHL".to_string(),
            timeout: Duration::from_secs(10),
            nhl_base: None,
            content_base: None,
            gemini_base: None,
            log_level: LevelFilter::Warn,
            full_screen: false,
        }
    }
}

impl AppSettings {
    pub fn load(options: &Options) -> Self {
        let defaults = Self::default();
        let trusted_sources: Vec<String> = options
            .trusted_sources
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            api_key: options.api_key.clone().filter(|k| !k.trim().is_empty()),
            model: options.model.clone(),
            poll_interval: Duration::from_secs(options.poll_secs.max(1)),
            page_size: options.page_size.max(1),
            trusted_sources: if trusted_sources.is_empty() {
                defaults.trusted_sources
            } else {
                trusted_sources
            },
            topic: options.topic.clone(),
            timeout: Duration::from_secs(options.timeout_secs.max(1)),
            nhl_base: options.nhl_base.clone(),
            content_base: options.content_base.clone(),
            gemini_base: options.gemini_base.clone(),
            log_level: options.log_level.parse().unwrap_or(defaults.log_level),
            full_screen: false,
        }
    }
}
