//! Dashboard settings, loaded once at start-up.

use super::page::PageStyle;
use crate::error::{ForecastError, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Prefix of environment variables that override file settings, e.g.
/// `DASHBOARD__CACHE__TTL_SECS=600`.
pub const ENV_PREFIX: &str = "DASHBOARD";

/// Page width used by the front end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    #[default]
    Wide,
    Centered,
}

/// Memoization settings for data-source queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Seconds before a cached series is fetched again.
    pub ttl_secs: u64,
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 3600,
            max_entries: 32,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub title: String,
    pub icon: String,
    pub layout: Layout,
    /// Font family requested for Hangul chart labels; passed on with every page.
    pub font_family: String,
    /// Stylesheet the front end injects into every page.
    pub stylesheet: Option<PathBuf>,
    /// `tracing_subscriber::EnvFilter` directive.
    pub log_filter: String,
    pub cache: CacheConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            title: "서울시 교통 데이터 분석".to_string(),
            icon: "🚦".to_string(),
            layout: Layout::Wide,
            font_family: "NanumGothic".to_string(),
            stylesheet: Some(PathBuf::from("styles/style.css")),
            log_filter: "traffic_forecast=info".to_string(),
            cache: CacheConfig::default(),
        }
    }
}

impl DashboardConfig {
    /// Load settings from a TOML file, then apply `DASHBOARD__*` environment overrides.
    ///
    /// Fields absent from both sources keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        info!(path = %path.display(), title = %config.title, "dashboard configuration loaded");
        Ok(config)
    }

    /// Parse settings from TOML text without consulting the environment.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Render the settings as a TOML document.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ForecastError::Config(e.to_string()))
    }

    /// Presentation settings attached to rendered pages.
    pub fn page_style(&self) -> PageStyle {
        PageStyle {
            layout: self.layout,
            font_family: self.font_family.clone(),
            stylesheet: self.stylesheet.clone(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(ForecastError::Config("title must not be empty".into()));
        }
        if self.cache.max_entries == 0 {
            return Err(ForecastError::Config(
                "cache.max_entries must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }
}
