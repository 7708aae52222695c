//! Application configuration structures.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{DetailSelectors, ListingSelectors};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP and crawling behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Where ledgers and records live
    #[serde(default)]
    pub storage: StorageConfig,

    /// Completion backend settings
    #[serde(default)]
    pub ai: AiConfig,

    /// Outbound channel settings
    #[serde(default)]
    pub notifier: NotifierConfig,

    /// Run interval for `watch`
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Listing sites, processed in order
    #[serde(default = "defaults::sources")]
    pub sources: Vec<SourceConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Sources that take part in runs.
    pub fn enabled_sources(&self) -> impl Iterator<Item = &SourceConfig> {
        self.sources.iter().filter(|s| s.enabled())
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.max_pages == 0 {
            return Err(AppError::validation("crawler.max_pages must be > 0"));
        }
        if self.schedule.interval_secs == 0 {
            return Err(AppError::validation("schedule.interval_secs must be > 0"));
        }
        if self.ai.model.trim().is_empty() {
            return Err(AppError::validation("ai.model is empty"));
        }
        if self.notifier.enabled
            && (self.notifier.bot_token.trim().is_empty()
                || self.notifier.channel_id.trim().is_empty())
        {
            return Err(AppError::validation(
                "notifier is enabled but bot_token or channel_id is missing",
            ));
        }

        let mut names = HashSet::new();
        for source in &self.sources {
            let name = source.name();
            if !is_safe_name(name) {
                return Err(AppError::validation(format!(
                    "source name '{name}' must be non-empty [A-Za-z0-9_-]"
                )));
            }
            if !names.insert(name) {
                return Err(AppError::validation(format!(
                    "duplicate source name '{name}'"
                )));
            }
        }
        if self.enabled_sources().next().is_none() {
            return Err(AppError::validation("No enabled sources defined"));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            crawler: CrawlerConfig::default(),
            storage: StorageConfig::default(),
            ai: AiConfig::default(),
            notifier: NotifierConfig::default(),
            schedule: ScheduleConfig::default(),
            sources: defaults::sources(),
        }
    }
}

fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// HTTP client and crawling behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Delay between listing page requests in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Delay between processing new items in milliseconds
    #[serde(default = "defaults::item_delay")]
    pub item_delay_ms: u64,

    /// Hard ceiling on listing pages per run
    #[serde(default = "defaults::max_pages")]
    pub max_pages: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: defaults::request_delay(),
            item_delay_ms: defaults::item_delay(),
            max_pages: defaults::max_pages(),
        }
    }
}

/// Local storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "defaults::storage_root")]
    pub root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: defaults::storage_root(),
        }
    }
}

/// OpenAI-compatible completion backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default = "defaults::ai_base_url")]
    pub base_url: String,

    #[serde(default = "defaults::ai_model")]
    pub model: String,

    /// Usually supplied through `OPENAI_API_KEY`
    #[serde(default, skip_serializing)]
    pub api_key: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::ai_base_url(),
            model: defaults::ai_model(),
            api_key: String::new(),
            temperature: None,
        }
    }
}

/// Telegram channel settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// When false, messages are only logged
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "defaults::telegram_api")]
    pub api_base: String,

    /// Usually supplied through `TELEGRAM_BOT_TOKEN`
    #[serde(default, skip_serializing)]
    pub bot_token: String,

    /// Usually supplied through `TELEGRAM_CHANNEL_ID`
    #[serde(default)]
    pub channel_id: String,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_base: defaults::telegram_api(),
            bot_token: String::new(),
            channel_id: String::new(),
        }
    }
}

/// Fixed-interval scheduling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "defaults::interval")]
    pub interval_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: defaults::interval(),
        }
    }
}

/// One listing site.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    /// JSON listing API with slug identities
    JsonApi(JsonApiConfig),
    /// Scraped HTML board with link identities
    HtmlBoard(HtmlBoardConfig),
}

impl SourceConfig {
    pub fn name(&self) -> &str {
        match self {
            Self::JsonApi(c) => &c.name,
            Self::HtmlBoard(c) => &c.name,
        }
    }

    pub fn enabled(&self) -> bool {
        match self {
            Self::JsonApi(c) => c.enabled,
            Self::HtmlBoard(c) => c.enabled,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonApiConfig {
    pub name: String,

    #[serde(default = "defaults::enabled")]
    pub enabled: bool,

    /// API root, e.g. `https://jobs.af/api/v2.6`
    pub api_base: String,

    /// Public site root used for posting links
    pub site_base: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HtmlBoardConfig {
    pub name: String,

    #[serde(default = "defaults::enabled")]
    pub enabled: bool,

    /// Listing root; pages are `{base_url}?page=N`
    pub base_url: String,

    #[serde(default)]
    pub listing: ListingSelectors,

    #[serde(default)]
    pub detail: DetailSelectors,
}

mod defaults {
    use std::path::PathBuf;

    use super::{HtmlBoardConfig, JsonApiConfig, SourceConfig};

    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; jobfeed/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn request_delay() -> u64 {
        250
    }
    pub fn item_delay() -> u64 {
        1000
    }
    pub fn max_pages() -> u32 {
        20
    }

    pub fn storage_root() -> PathBuf {
        PathBuf::from("data")
    }

    pub fn ai_base_url() -> String {
        "https://api.openai.com/v1".into()
    }
    pub fn ai_model() -> String {
        "gpt-4o-mini".into()
    }

    pub fn telegram_api() -> String {
        "https://api.telegram.org".into()
    }

    pub fn interval() -> u64 {
        3600
    }

    pub fn enabled() -> bool {
        true
    }

    // Source defaults
    pub fn sources() -> Vec<SourceConfig> {
        vec![
            SourceConfig::JsonApi(JsonApiConfig {
                name: "jobs".into(),
                enabled: true,
                api_base: "https://jobs.af/api/v2.6".into(),
                site_base: "https://jobs.af".into(),
            }),
            SourceConfig::HtmlBoard(HtmlBoardConfig {
                name: "wazifaha".into(),
                enabled: true,
                base_url: "https://wazifaha.org".into(),
                listing: Default::default(),
                detail: Default::default(),
            }),
        ]
    }
}
