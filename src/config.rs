use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::pipeline::EnrichOptions;
use crate::source::Country;
use crate::translate::DEFAULT_TRANSLATE_URL;

pub const DEFAULT_CONFIG_FILE: &str = "worldnews.toml";

/// Application configuration.  Every section and key is optional; a missing
/// config file is the same as an empty one.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub feed: FeedConfig,
    pub translate: TranslateConfig,
    pub display: DisplayConfig,
    pub refresh: RefreshConfig,
    pub favorites: FavoritesConfig,
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FeedConfig {
    /// Country code is appended as the last path segment.
    pub base_url: String,
    pub request_timeout_ms: u64,
    /// Extra attempts after a failed fetch.
    pub fetch_retries: u32,
    pub retry_delay_ms: u64,
    pub default_country: Country,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/top-headlines".to_string(),
            request_timeout_ms: 10_000,
            fetch_retries: 0,
            retry_delay_ms: 2_000,
            default_country: Country::Jp,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TranslateConfig {
    pub base_url: String,
    pub target_language: String,
    /// Articles translated in parallel; 1 keeps the sequential behaviour.
    pub concurrency: usize,
    pub timeout_ms: u64,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_TRANSLATE_URL.to_string(),
            target_language: "ja".to_string(),
            concurrency: 1,
            timeout_ms: 15_000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DisplayConfig {
    pub page_size: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { page_size: 10 }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RefreshConfig {
    pub interval_s: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self { interval_s: 300 }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FavoritesConfig {
    pub path: PathBuf,
}

impl Default for FavoritesConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("favorites.json"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LogConfig {
    pub file: PathBuf,
    /// Used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("worldnews.log"),
            filter: "worldnews=info".to_string(),
        }
    }
}

impl Config {
    /// Load `path`, falling back to defaults if the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).with_context(|| "Failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.display.page_size == 0 {
            anyhow::bail!("display.page_size must be at least 1");
        }
        if self.refresh.interval_s == 0 {
            anyhow::bail!("refresh.interval_s must be at least 1");
        }
        Ok(())
    }

    pub fn enrich_options(&self) -> EnrichOptions {
        EnrichOptions {
            concurrency: self.translate.concurrency.max(1),
            timeout: Duration::from_millis(self.translate.timeout_ms),
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh.interval_s)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.feed.request_timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.feed.retry_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.display.page_size, 10);
        assert_eq!(config.refresh.interval_s, 300);
        assert_eq!(config.translate.target_language, "ja");
        assert_eq!(config.translate.concurrency, 1);
        assert_eq!(config.feed.default_country, Country::Jp);
        assert_eq!(config.favorites.path, PathBuf::from("favorites.json"));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::parse(
            r#"
            [feed]
            base_url = "https://news.test/headlines"
            default_country = "fr"

            [translate]
            target_language = "en"
            concurrency = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.feed.base_url, "https://news.test/headlines");
        assert_eq!(config.feed.default_country, Country::Fr);
        assert_eq!(config.feed.request_timeout_ms, 10_000);
        assert_eq!(config.translate.target_language, "en");
        assert_eq!(config.enrich_options().concurrency, 4);
        assert_eq!(config.translate.timeout_ms, 15_000);
    }

    #[test]
    fn unknown_country_is_rejected() {
        let err = Config::parse("[feed]\ndefault_country = \"zz\"").unwrap_err();
        assert!(format!("{err:#}").contains("parse config"));
    }

    #[test]
    fn zero_page_size_is_rejected() {
        assert!(Config::parse("[display]\npage_size = 0").is_err());
    }

    #[test]
    fn shipped_sample_config_parses() {
        let config = Config::parse(include_str!("../worldnews.example.toml")).unwrap();
        assert_eq!(config.refresh_interval(), Duration::from_secs(300));
        assert_eq!(config.retry_delay(), Duration::from_secs(2));
        assert_eq!(config.log.filter, "worldnews=info");
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.display.page_size, 10);
    }
}
