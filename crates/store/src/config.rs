//! Store configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `ORDER_DESK_DB` - Path to the SQLite database file (default: `orders.db`)
//! - `ORDER_DESK_BUSY_TIMEOUT_MS` - SQLite busy timeout (default: 10000)
//! - `ORDER_DESK_READ_CONNECTIONS` - Read pool size (default: 4)
//! - `ORDER_DESK_WRITE_RETRIES` - Retries after a busy failure (default: 3)
//! - `ORDER_DESK_RETRY_DELAY_MS` - Base backoff delay (default: 500)

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::db::retry::RetryPolicy;

const DEFAULT_DATABASE_PATH: &str = "orders.db";
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_READ_CONNECTIONS: u32 = 4;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable was set but could not be parsed.
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,
    /// How long SQLite itself waits on a locked database before reporting
    /// `SQLITE_BUSY`. The retrying executor sits on top of this.
    pub busy_timeout: Duration,
    /// Number of connections in the read pool. Writes never use the pool.
    pub read_connections: u32,
    /// Retry policy applied to every serialized write.
    pub retry: RetryPolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            busy_timeout: Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
            read_connections: DEFAULT_READ_CONNECTIONS,
            retry: RetryPolicy::default(),
        }
    }
}

impl StoreConfig {
    /// Load configuration from `ORDER_DESK_*` environment variables,
    /// falling back to defaults for anything unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnvVar`] if a set variable fails to
    /// parse as the expected type.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(path) = env::var("ORDER_DESK_DB") {
            config.database_path = PathBuf::from(path);
        }
        if let Some(ms) = parse_env::<u64>("ORDER_DESK_BUSY_TIMEOUT_MS")? {
            config.busy_timeout = Duration::from_millis(ms);
        }
        if let Some(n) = parse_env::<u32>("ORDER_DESK_READ_CONNECTIONS")? {
            config.read_connections = n;
        }
        if let Some(n) = parse_env::<u32>("ORDER_DESK_WRITE_RETRIES")? {
            config.retry.max_retries = n;
        }
        if let Some(ms) = parse_env::<u64>("ORDER_DESK_RETRY_DELAY_MS")? {
            config.retry.initial_delay = Duration::from_millis(ms);
        }

        Ok(config)
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnvVar(name.to_owned(), raw)),
        Err(_) => Ok(None),
    }
}
