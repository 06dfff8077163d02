use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

use crate::paging::debounce::DEFAULT_DELAY;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_TOKEN_ENV: &str = "PROPDESK_TOKEN";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub token_env: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token_env: DEFAULT_TOKEN_ENV.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ListConfig {
    pub page_size: u32,
    pub debounce_ms: u64,
    /// Rows from the end at which scrolling asks for the next page
    pub load_more_threshold: usize,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            debounce_ms: DEFAULT_DELAY.as_millis() as u64,
            load_more_threshold: 3,
        }
    }
}

impl ListConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub lists: ListConfig,
}

fn config_path() -> Option<PathBuf> {
    let config_dir = dirs::config_dir()?;
    Some(config_dir.join("propdesk").join("config.toml"))
}

impl Config {
    pub fn load() -> Self {
        let Some(path) = config_path() else {
            return Config::default();
        };

        let Ok(content) = std::fs::read_to_string(&path) else {
            return Config::default();
        };

        match Config::from_toml(&content) {
            Some(config) => config,
            None => {
                warn!(path = %path.display(), "ignoring malformed config");
                Config::default()
            }
        }
    }

    /// Parse a config file, or None if it is malformed.
    pub fn from_toml(content: &str) -> Option<Self> {
        let mut config = toml::from_str::<Config>(content).ok()?;
        if config.lists.page_size == 0 {
            config.lists.page_size = ListConfig::default().page_size;
        }
        config.api.base_url = config.api.base_url.trim_end_matches('/').to_string();
        Some(config)
    }

    /// Apply command-line overrides on top of the file.
    pub fn with_overrides(mut self, base_url: Option<String>, page_size: Option<u32>) -> Self {
        if let Some(url) = base_url {
            self.api.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(size) = page_size.filter(|s| *s > 0) {
            self.lists.page_size = size;
        }
        self
    }
}
