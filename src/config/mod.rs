//! Configuration management.
//!
//! Settings are layered: built-in defaults, then the TOML file, then
//! environment variables prefixed with `NEWS_PAGER` (sections separated by
//! `__`, e.g. `NEWS_PAGER_PAGING__PAGE_SIZE=20`).

mod file_config;

pub use file_config::{
    ApiConfig, Backend, ConfigFile, ConfigFileError, FeedsConfig, LoggingConfig, PagingConfig,
    SettingsConfig, API_KEY_ENV, DEFAULT_BROWSE_SOURCES, DEFAULT_SEARCH_SOURCES,
};

use std::path::{Path, PathBuf};

/// Application configuration
pub type Config = ConfigFile;

/// File name searched for in the working directory and the config directory
pub const CONFIG_FILE_NAME: &str = "news-pager.toml";

/// Environment prefix for overrides
pub const ENV_PREFIX: &str = "NEWS_PAGER";

/// Load configuration from an optional file plus environment overrides
pub fn load_config(path: Option<&Path>) -> Result<Config, config::ConfigError> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path));
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("feeds.browse_sources")
                .with_list_parse_key("feeds.search_sources")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}

/// Look for a configuration file in the working directory, then in the
/// user config directory
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    default_config_path().filter(|p| p.is_file())
}

/// Where `config init` writes by default
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("news-pager").join(CONFIG_FILE_NAME))
}

/// Get the configuration from the discovered file (if any) and the environment
pub fn get_config() -> Result<Config, config::ConfigError> {
    load_config(find_config_file().as_deref())
}
