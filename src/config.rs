use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Remote document server settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RemoteConfig {
    /// Server URL (e.g., "http://localhost:8080")
    pub server_url: Option<String>,
    /// API key for the account
    pub api_key: Option<String>,
}

impl RemoteConfig {
    /// Returns true if both server_url and api_key are set
    pub fn is_configured(&self) -> bool {
        self.server_url.is_some() && self.api_key.is_some()
    }
}

/// Default definition cache lifetime in hours
pub const DEFAULT_CACHE_TTL_HOURS: u64 = 24;

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Path to the SQLite database holding on-device data
    pub database_path: ConfigValue<PathBuf>,
    /// Definition cache lifetime. The CLI keeps its cache in memory, so this
    /// only bounds reuse of a definition within one process, such as a word
    /// repeated in a single `wordbook define` call.
    pub cache_ttl_hours: ConfigValue<u64>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
    /// Remote document server
    pub remote: RemoteConfig,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    database_path: Option<PathBuf>,
    cache_ttl_hours: Option<u64>,
    remote: Option<RemoteConfig>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut database_path = ConfigValue::new(
            Self::default_data_dir().join("wordbook.db"),
            ConfigSource::Default,
        );
        let mut cache_ttl_hours = ConfigValue::new(DEFAULT_CACHE_TTL_HOURS, ConfigSource::Default);
        let mut config_file = None;
        let mut remote = RemoteConfig::default();

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(db_path) = file_config.database_path {
                // Resolve relative paths against config file's directory
                let resolved_path = if db_path.is_relative() {
                    path.parent().map(|p| p.join(&db_path)).unwrap_or(db_path)
                } else {
                    db_path
                };
                database_path = ConfigValue::new(resolved_path, ConfigSource::File);
            }
            if let Some(hours) = file_config.cache_ttl_hours {
                cache_ttl_hours = ConfigValue::new(hours, ConfigSource::File);
            }
            if let Some(remote_config) = file_config.remote {
                remote = remote_config;
            }
        }

        if let Ok(db_path) = std::env::var("WORDBOOK_DATABASE_PATH") {
            database_path = ConfigValue::new(PathBuf::from(db_path), ConfigSource::Environment);
        }
        if let Ok(hours) = std::env::var("WORDBOOK_CACHE_TTL_HOURS") {
            let hours = hours
                .parse()
                .map_err(|_| ConfigError::InvalidValue("WORDBOOK_CACHE_TTL_HOURS", hours))?;
            cache_ttl_hours = ConfigValue::new(hours, ConfigSource::Environment);
        }
        if let Ok(url) = std::env::var("WORDBOOK_REMOTE_URL") {
            remote.server_url = Some(url);
        }
        if let Ok(key) = std::env::var("WORDBOOK_REMOTE_API_KEY") {
            remote.api_key = Some(key);
        }

        Ok(Self {
            database_path,
            cache_ttl_hours,
            config_file,
            remote,
        })
    }

    /// Cache lifetime as a duration, saturating for huge hour counts.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_hours.value.saturating_mul(60 * 60))
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/wordbook/
    /// - macOS: ~/Library/Application Support/wordbook/
    /// - Windows: %APPDATA%/wordbook/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wordbook")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/wordbook/
    /// - macOS: ~/Library/Application Support/wordbook/
    /// - Windows: %APPDATA%/wordbook/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wordbook")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    InvalidValue(&'static str, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidValue(name, value) => {
                write!(f, "Invalid value for {}: '{}'", name, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
