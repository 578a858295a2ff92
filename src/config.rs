use crate::error::{BotError, Result};
use log::debug;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";
pub const DEFAULT_CACHE_DIR: &str = "cache";

/// Connection settings for one bot.
///
/// Loaded from an optional TOML file, then overridden by `TG_*` environment
/// variables (a `.env` file is honoured by the binary).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub token: String,
    pub api_url: String,
    /// Scratch space for remote media pulled down before upload.
    pub cache_dir: PathBuf,
    /// `None` means requests never time out.
    pub timeout_secs: Option<u64>,
}

impl Default for BotConfig {
    fn default() -> Self {
        BotConfig {
            token: String::new(),
            api_url: DEFAULT_API_URL.to_string(),
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            timeout_secs: None,
        }
    }
}

impl BotConfig {
    pub fn new(token: &str) -> Self {
        BotConfig {
            token: token.to_string(),
            ..Default::default()
        }
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading config from: {}", path.display());
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    /// Optional file, then process environment, then validation.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let config = config.with_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `TG_BOT_TOKEN`, `TG_API_URL`, `TG_CACHE_DIR` and `TG_TIMEOUT_SECS`
    /// as resolved by `lookup`.
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("TG_BOT_TOKEN") {
            self.token = token;
        }
        if let Some(api_url) = lookup("TG_API_URL") {
            self.api_url = api_url;
        }
        if let Some(cache_dir) = lookup("TG_CACHE_DIR") {
            self.cache_dir = PathBuf::from(cache_dir);
        }
        if let Some(timeout) = lookup("TG_TIMEOUT_SECS") {
            let secs = timeout
                .trim()
                .parse::<u64>()
                .map_err(|e| BotError::Config(format!("TG_TIMEOUT_SECS: {}", e)))?;
            self.timeout_secs = Some(secs);
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            return Err(BotError::Config(
                "bot token must be set (TG_BOT_TOKEN or `token`)".to_string(),
            ));
        }
        match url::Url::parse(&self.api_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => {
                return Err(BotError::Config(format!(
                    "api_url must be an http(s) URL, got {}",
                    self.api_url
                )));
            }
        }
        if self.timeout_secs == Some(0) {
            return Err(BotError::Config(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// `{api_url}/bot{token}`, the prefix of every method URL.
    pub fn base_url(&self) -> String {
        format!("{}/bot{}", self.api_url.trim_end_matches('/'), self.token)
    }

    pub fn file_url(&self, file_path: &str) -> String {
        format!(
            "{}/file/bot{}/{}",
            self.api_url.trim_end_matches('/'),
            self.token,
            file_path
        )
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
