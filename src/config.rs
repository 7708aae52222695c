// src/config.rs

//! Configuration loading utilities.
//!
//! The TOML file supplies structure; secrets and deployment specifics come
//! from the environment (optionally through a `.env` file loaded by the CLI).

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::Config;

pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
pub const ENV_OPENAI_MODEL: &str = "OPENAI_MODEL";
pub const ENV_TELEGRAM_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const ENV_TELEGRAM_CHANNEL_ID: &str = "TELEGRAM_CHANNEL_ID";
pub const ENV_STORAGE_DIR: &str = "JOBFEED_STORAGE_DIR";

/// Load configuration from a TOML file, then apply environment overrides.
///
/// A missing file means defaults; a file that exists but does not parse is
/// an error.
pub fn load_config(path: &Path) -> Result<Config> {
    let mut config = if path.exists() {
        Config::load(path)?
    } else {
        log::warn!("No config at {}, using defaults", path.display());
        Config::default()
    };
    apply_env(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Override config values from `lookup` (normally the process environment).
///
/// Blank values are ignored.
pub fn apply_env(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(key) = get(ENV_OPENAI_API_KEY) {
        config.ai.api_key = key;
    }
    if let Some(url) = get(ENV_OPENAI_BASE_URL) {
        config.ai.base_url = url;
    }
    if let Some(model) = get(ENV_OPENAI_MODEL) {
        config.ai.model = model;
    }
    if let Some(token) = get(ENV_TELEGRAM_BOT_TOKEN) {
        config.notifier.bot_token = token;
        config.notifier.enabled = true;
    }
    if let Some(channel) = get(ENV_TELEGRAM_CHANNEL_ID) {
        config.notifier.channel_id = channel;
    }
    if let Some(dir) = get(ENV_STORAGE_DIR) {
        config.storage.root = PathBuf::from(dir);
    }
}
