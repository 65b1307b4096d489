//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and `CARTBACK_*` environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::realtime::HubConfig;
use crate::store::StoreConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub realtime: RealtimeConfig,

    #[serde(default)]
    pub functions: FunctionsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// SQLite store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database file; `:memory:` keeps everything in memory
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Buffered change events per subscriber before it lags
    #[serde(default = "default_change_capacity")]
    pub change_capacity: usize,
}

fn default_database_path() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("cartback").join("cartback.db").to_string_lossy().to_string())
        .unwrap_or_else(|| "./cartback.db".to_string())
}

fn default_change_capacity() -> usize {
    1024
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            change_capacity: default_change_capacity(),
        }
    }
}

impl DatabaseConfig {
    pub const IN_MEMORY: &'static str = ":memory:";

    /// Store configuration with `~/` expanded to the home directory
    pub fn store_config(&self) -> StoreConfig {
        let path = if self.path == Self::IN_MEMORY {
            None
        } else if let Some(rest) = self.path.strip_prefix("~/") {
            Some(
                dirs::home_dir()
                    .map(|home| home.join(rest))
                    .unwrap_or_else(|| PathBuf::from(&self.path)),
            )
        } else {
            Some(PathBuf::from(&self.path))
        };

        StoreConfig {
            path,
            change_capacity: self.change_capacity,
        }
    }
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Rows in the dashboard's recent carts table
    #[serde(default = "default_recent_carts")]
    pub recent_carts: usize,

    /// Months in the dashboard's trend chart
    #[serde(default = "default_trend_months")]
    pub trend_months: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8090
}

fn default_request_timeout() -> u64 {
    30
}

fn default_recent_carts() -> usize {
    5
}

fn default_trend_months() -> usize {
    7
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            recent_carts: default_recent_carts(),
            trend_months: default_trend_months(),
        }
    }
}

impl ApiConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// WebSocket relay configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeConfig {
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

fn default_max_connections() -> usize {
    1000
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
        }
    }
}

impl RealtimeConfig {
    pub fn hub_config(&self) -> HubConfig {
        HubConfig {
            max_connections: self.max_connections,
        }
    }
}

/// Function endpoint configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FunctionsConfig {
    /// Lifetime of subscriptions opened by a recovery payment
    #[serde(default = "default_subscription_days")]
    pub subscription_days: i64,
}

fn default_subscription_days() -> i64 {
    crate::functions::DEFAULT_SUBSCRIPTION_DAYS
}

impl Default for FunctionsConfig {
    fn default() -> Self {
        Self {
            subscription_days: default_subscription_days(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("cartback").join("config.toml")),
            Some(PathBuf::from("/etc/cartback/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply `CARTBACK_*` overrides from `lookup`; unparsable numbers are ignored
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("CARTBACK_DATABASE_PATH") {
            self.database.path = path;
        }

        if let Some(host) = lookup("CARTBACK_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = lookup("CARTBACK_API_PORT").and_then(|p| p.parse().ok()) {
            self.api.port = port;
        }

        if let Some(days) = lookup("CARTBACK_SUBSCRIPTION_DAYS").and_then(|d| d.parse().ok()) {
            self.functions.subscription_days = days;
        }

        if let Some(level) = lookup("CARTBACK_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("CARTBACK_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Cartback Configuration
#
# Environment variables override these settings:
# - CARTBACK_DATABASE_PATH
# - CARTBACK_API_HOST
# - CARTBACK_API_PORT
# - CARTBACK_SUBSCRIPTION_DAYS
# - CARTBACK_LOG_LEVEL
# - CARTBACK_LOG_FORMAT

[database]
# SQLite database file (":memory:" for a throwaway store)
path = "~/.local/share/cartback/cartback.db"

# Change events buffered per realtime subscriber
change_capacity = 1024

[api]
# API server host
host = "0.0.0.0"

# API server port
port = 8090

# Request timeout in seconds
request_timeout_secs = 30

# Rows in the dashboard's recent carts table
recent_carts = 5

# Months in the dashboard's trend chart
trend_months = 7

[realtime]
# Maximum concurrent WebSocket connections
max_connections = 1000

[functions]
# Lifetime of subscriptions opened by a recovery payment (days)
subscription_days = 30

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_generated_config_parses() {
        let config = Config::parse(&generate_default_config()).unwrap();
        assert_eq!(config.api.port, 8090);
        assert_eq!(config.realtime.max_connections, 1000);
        assert_eq!(config.functions.subscription_days, 30);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = Config::parse("[api]\nport = 9000\n").unwrap();
        assert_eq!(config.api.port, 9000);
        assert_eq!(config.api.host, "0.0.0.0");
        assert_eq!(config.database.change_capacity, 1024);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("CARTBACK_DATABASE_PATH", ":memory:"),
            ("CARTBACK_API_PORT", "7000"),
            ("CARTBACK_SUBSCRIPTION_DAYS", "not-a-number"),
            ("CARTBACK_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.api.port, 7000);
        assert_eq!(config.functions.subscription_days, 30);
        assert_eq!(config.logging.format, "json");
        assert!(config.database.store_config().path.is_none());
    }

    #[test]
    fn test_load_errors_name_the_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[api\nport = ").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(Config::load(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_home_expansion() {
        let database = DatabaseConfig {
            path: "~/data/cartback.db".to_string(),
            change_capacity: 16,
        };
        let store = database.store_config();
        let path = store.path.unwrap();
        assert!(path.ends_with("data/cartback.db"));
        assert_eq!(store.change_capacity, 16);
    }
}
