//! Configuration file support for news-pager.
//!
//! # Configuration File Format
//!
//! ```toml
//! [api]
//! key = "your-api-key"
//! backend = "newsapi"          # or "newsdata"
//! # base_url = "http://localhost:8080/v2/"
//!
//! [feeds]
//! browse_sources = ["bbc-news", "cnn"]
//! search_sources = ["bbc-news", "cnn"]
//!
//! [paging]
//! page_size = 10
//! prefetch_distance = 10
//! debounce_ms = 100
//!
//! [settings]
//! path = "~/.config/news-pager/user_settings.json"
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::paging::PagerConfig;

/// Outlets shown by the browse feed unless configured otherwise
pub const DEFAULT_BROWSE_SOURCES: &[&str] = &[
    "bbc-news",
    "abc-news",
    "al-jazeera-english",
    "argaam",
    "cnn",
    "inancial-post",
    "google-news-is",
    "google-news-sa",
    "rt",
    "sabq",
    "xinhua-net",
    "ynet",
];

/// Outlets searched by the search feed unless configured otherwise
pub const DEFAULT_SEARCH_SOURCES: &[&str] = &["bbc-news", "abc-news", "cnn", "financial-post"];

/// Environment variable consulted when no API key is configured
pub const API_KEY_ENV: &str = "NEWS_API_KEY";

/// Configuration file structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Remote backend section
    #[serde(default)]
    pub api: ApiConfig,

    /// Feed sources section
    #[serde(default)]
    pub feeds: FeedsConfig,

    /// Paging section
    #[serde(default)]
    pub paging: PagingConfig,

    /// Settings store section
    #[serde(default)]
    pub settings: SettingsConfig,

    /// Logging section
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which remote backend serves the feeds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    NewsApi,
    NewsData,
}

impl Backend {
    /// Registry id of the backend
    pub fn id(&self) -> &'static str {
        match self {
            Backend::NewsApi => "newsapi",
            Backend::NewsData => "newsdata",
        }
    }
}

/// Remote backend configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub key: Option<String>,

    #[serde(default)]
    pub backend: Backend,

    /// Overrides the backend's default endpoint
    #[serde(default)]
    pub base_url: Option<String>,
}

impl ApiConfig {
    /// The configured key, falling back to `NEWS_API_KEY`
    pub fn resolved_key(&self) -> Option<String> {
        self.key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty()))
    }
}

/// Feed sources configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedsConfig {
    #[serde(default = "default_browse_sources")]
    pub browse_sources: Vec<String>,

    #[serde(default = "default_search_sources")]
    pub search_sources: Vec<String>,
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            browse_sources: default_browse_sources(),
            search_sources: default_search_sources(),
        }
    }
}

fn default_browse_sources() -> Vec<String> {
    DEFAULT_BROWSE_SOURCES.iter().map(|s| s.to_string()).collect()
}

fn default_search_sources() -> Vec<String> {
    DEFAULT_SEARCH_SOURCES.iter().map(|s| s.to_string()).collect()
}

/// Paging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Defaults to `page_size`
    #[serde(default)]
    pub prefetch_distance: Option<usize>,

    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            prefetch_distance: None,
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl PagingConfig {
    pub fn pager_config(&self) -> PagerConfig {
        PagerConfig {
            page_size: self.page_size,
            prefetch_distance: self.prefetch_distance.unwrap_or(self.page_size),
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

fn default_page_size() -> usize {
    10
}

fn default_debounce_ms() -> u64 {
    100
}

/// Settings store configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsConfig {
    /// Settings file; defaults to the user config directory
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `"json"` for structured output, anything else for text
    #[serde(default)]
    pub format: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: None,
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.as_deref() == Some("json")
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ConfigFile {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigFileError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigFileError::Io(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigFileError::Parse(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), ConfigFileError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigFileError::Serialize(e.to_string()))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ConfigFileError::Io(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| ConfigFileError::Io(e.to_string()))
    }
}

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialize error: {0}")]
    Serialize(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_config_file_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("news-pager.toml");

        let toml_content = r#"
[api]
key = "test-key"
backend = "newsdata"

[feeds]
browse_sources = ["cnn"]

[paging]
page_size = 20
debounce_ms = 250

[logging]
level = "debug"
format = "json"
"#;

        let mut file = File::create(&path).unwrap();
        file.write_all(toml_content.as_bytes()).unwrap();

        let config = ConfigFile::load(&path).unwrap();

        assert_eq!(config.api.key, Some("test-key".to_string()));
        assert_eq!(config.api.backend, Backend::NewsData);
        assert_eq!(config.feeds.browse_sources, vec!["cnn"]);
        assert_eq!(config.feeds.search_sources.len(), DEFAULT_SEARCH_SOURCES.len());
        assert_eq!(config.paging.pager_config().prefetch_distance, 20);
        assert_eq!(config.paging.debounce(), Duration::from_millis(250));
        assert!(config.logging.is_json());
    }

    #[test]
    fn test_config_file_save_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("news-pager.toml");

        let mut config = ConfigFile::default();
        config.api.key = Some("saved-key".to_string());
        config.paging.prefetch_distance = Some(3);

        config.save(&path).unwrap();

        let loaded = ConfigFile::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_defaults() {
        let config = ConfigFile::default();
        assert_eq!(config.api.backend, Backend::NewsApi);
        assert_eq!(config.feeds.browse_sources.len(), 12);
        assert_eq!(config.paging.pager_config(), PagerConfig::default());
        assert_eq!(config.paging.debounce(), Duration::from_millis(100));
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.is_json());
    }

    #[test]
    fn test_config_file_nonexistent() {
        let path = PathBuf::from("/nonexistent/news-pager.toml");
        let result = ConfigFile::load(&path);
        assert!(matches!(result, Err(ConfigFileError::Io(_))));
    }

    #[test]
    fn test_config_file_invalid_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("invalid.toml");

        std::fs::write(&path, "invalid = toml = content").unwrap();

        let result = ConfigFile::load(&path);
        assert!(matches!(result, Err(ConfigFileError::Parse(_))));
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let result: Result<ConfigFile, _> = toml::from_str("[api]\nbackend = \"gnews\"\n");
        assert!(result.is_err());
    }
}
