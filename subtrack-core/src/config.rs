use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SubtrackConfig {
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub query: QueryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_database_url")]
    pub url: String,

    #[serde(default = "default_pool_min")]
    pub pool_min_connections: u32,

    #[serde(default = "default_pool_max")]
    pub pool_max_connections: u32,

    #[serde(default = "default_acquire_timeout")]
    pub pool_acquire_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub pool_idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json_format: bool,
}

/// Limits applied to the read paths (list scan, cost aggregation).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    #[serde(default = "default_query_timeout")]
    pub timeout_secs: u64,
}

fn default_database_url() -> String {
    "postgres://localhost/subtrack_dev".to_string()
}

fn default_pool_min() -> u32 {
    1
}

fn default_pool_max() -> u32 {
    10
}

fn default_acquire_timeout() -> u64 {
    30
}

fn default_idle_timeout() -> u64 {
    600
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_query_timeout() -> u64 {
    30
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            pool_min_connections: default_pool_min(),
            pool_max_connections: default_pool_max(),
            pool_acquire_timeout_secs: default_acquire_timeout(),
            pool_idle_timeout_secs: default_idle_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_query_timeout(),
        }
    }
}

impl SubtrackConfig {
    pub fn load() -> Result<Self, ConfigLoadError> {
        Self::load_from_paths(get_config_paths())
    }

    /// Layers the given files (missing ones are skipped) under
    /// `SUBTRACK_`-prefixed environment variables, e.g.
    /// `SUBTRACK_DATABASE__POOL_MAX_CONNECTIONS=20`.
    pub fn load_from_paths(paths: Vec<PathBuf>) -> Result<Self, ConfigLoadError> {
        load_dotenv_files();

        let mut builder = ConfigBuilder::builder();

        for path in paths {
            if path.exists() {
                builder = builder.add_source(File::from(path).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("SUBTRACK")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let mut subtrack_config: SubtrackConfig = builder.build()?.try_deserialize()?;

        if let Ok(url) = std::env::var("DATABASE_URL") {
            subtrack_config.database.url = url;
        } else if let Ok(url) = std::env::var("SUBTRACK_DATABASE_URL") {
            subtrack_config.database.url = url;
        }

        if let Ok(level) = std::env::var("SUBTRACK_LOG_LEVEL") {
            subtrack_config.logging.level = level;
        } else if let Ok(level) = std::env::var("RUST_LOG") {
            subtrack_config.logging.level = level;
        }

        if let Ok(timeout) = std::env::var("SUBTRACK_QUERY_TIMEOUT_SECS") {
            subtrack_config.query.timeout_secs = parse_timeout_secs(&timeout)?;
        }

        subtrack_config.validate()?;

        Ok(subtrack_config)
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.database.url.is_empty() {
            return Err(ConfigLoadError::MissingRequired("database.url".to_string()));
        }

        if !self.database.url.starts_with("postgres://")
            && !self.database.url.starts_with("postgresql://")
        {
            return Err(ConfigLoadError::InvalidValue {
                key: "database.url".to_string(),
                message:
                    "Must be a valid PostgreSQL URL starting with postgres:// or postgresql://"
                        .to_string(),
            });
        }

        if self.database.pool_min_connections > self.database.pool_max_connections {
            return Err(ConfigLoadError::InvalidValue {
                key: "database.pool_min_connections".to_string(),
                message: "Cannot be greater than pool_max_connections".to_string(),
            });
        }

        if self.query.timeout_secs == 0 {
            return Err(ConfigLoadError::InvalidValue {
                key: "query.timeout_secs".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        // Anything the log filter accepts is valid, including bare targets
        // such as `subtrack_core` and per-target levels.
        if let Err(e) = EnvFilter::try_new(&self.logging.level) {
            return Err(ConfigLoadError::InvalidValue {
                key: "logging.level".to_string(),
                message: format!("Invalid log filter '{}': {}", self.logging.level, e),
            });
        }

        Ok(())
    }

    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    pub fn log_level(&self) -> &str {
        &self.logging.level
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query.timeout_secs)
    }
}

fn parse_timeout_secs(raw: &str) -> Result<u64, ConfigLoadError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigLoadError::InvalidValue {
            key: "query.timeout_secs".to_string(),
            message: format!("'{}' is not a whole number of seconds", raw),
        })
}

fn get_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join("config").join("default.toml"));
        paths.push(cwd.join("config").join("local.toml"));
        paths.push(cwd.join("subtrack.toml"));
    }

    if let Some(config_dir) = get_config_dir() {
        paths.push(config_dir.join("config.toml"));
    }

    paths
}

fn load_dotenv_files() {
    let mut paths = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".env"));
        paths.push(cwd.join(".env.local"));
    }

    if let Some(config_dir) = get_config_dir() {
        paths.push(config_dir.join(".env"));
    }

    for path in paths {
        if path.exists() {
            let _ = dotenvy::from_path(&path);
        }
    }
}

pub fn get_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("subtrack"))
}
