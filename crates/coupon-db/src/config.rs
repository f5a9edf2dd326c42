//! Store configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use serde::{Deserialize, Serialize};
use std::env;

use crate::pool::DbConfig;

/// Default database file, relative to the working directory.
pub const DEFAULT_DB_PATH: &str = "./coupons.db";

/// Coupon store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database path (`COUPON_DB_PATH`)
    pub database_path: String,

    /// Pool size (`COUPON_DB_MAX_CONNECTIONS`, default 5)
    pub max_connections: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            database_path: DEFAULT_DB_PATH.to_string(),
            max_connections: 5,
        }
    }
}

impl StoreConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup (the environment in
    /// production, a map in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = StoreConfig::default();

        let database_path = lookup("COUPON_DB_PATH").unwrap_or(defaults.database_path);
        if database_path.trim().is_empty() {
            return Err(ConfigError::MissingRequired("COUPON_DB_PATH".to_string()));
        }

        let max_connections = match lookup("COUPON_DB_MAX_CONNECTIONS") {
            Some(raw) => raw
                .trim()
                .parse()
                .ok()
                .filter(|n: &u32| *n > 0)
                .ok_or_else(|| ConfigError::InvalidValue("COUPON_DB_MAX_CONNECTIONS".to_string()))?,
            None => defaults.max_connections,
        };

        Ok(StoreConfig {
            database_path,
            max_connections,
        })
    }

    /// Replaces the database path (e.g. from a `--db` flag).
    pub fn with_database_path(mut self, path: impl Into<String>) -> Self {
        self.database_path = path.into();
        self
    }

    /// Pool configuration for this store.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path).with_max_connections(self.max_connections)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
