//! # Service Configuration
//!
//! Runtime configuration loaded from environment variables, with sensible
//! defaults for local development.
//!
//! ## Environment Variables
//! ```text
//! CAMPUS_DB_PATH              SQLite file path        (default ./campus.db)
//! CAMPUS_MAX_CONNECTIONS      pool upper bound        (default 5)
//! CAMPUS_ENROLL_RETRY_LIMIT   admission retry budget  (default 4)
//! ```

use std::env;

use campus_core::MAX_ENROLL_ATTEMPTS;
use campus_db::DbConfig;
use serde::{Deserialize, Serialize};

/// Service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Path to the SQLite database file.
    pub database_path: String,

    /// Maximum connections in the pool.
    pub max_connections: u32,

    /// Attempt budget for the enrollment admission loop.
    ///
    /// Each lost version race costs one attempt; the budget bounds worst
    /// case latency under heavy contention.
    pub enroll_retry_limit: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            database_path: "./campus.db".to_string(),
            max_connections: 5,
            enroll_retry_limit: MAX_ENROLL_ATTEMPTS,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    ///
    /// Unset variables fall back to defaults; set-but-unparseable values
    /// are an error rather than a silent fallback.
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = ServiceConfig::default();

        let config = ServiceConfig {
            database_path: env::var("CAMPUS_DB_PATH").unwrap_or(defaults.database_path),
            max_connections: env::var("CAMPUS_MAX_CONNECTIONS")
                .unwrap_or_else(|_| defaults.max_connections.to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("CAMPUS_MAX_CONNECTIONS".to_string()))?,
            enroll_retry_limit: env::var("CAMPUS_ENROLL_RETRY_LIMIT")
                .unwrap_or_else(|_| defaults.enroll_retry_limit.to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("CAMPUS_ENROLL_RETRY_LIMIT".to_string()))?,
        };

        if config.max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "CAMPUS_MAX_CONNECTIONS".to_string(),
            ));
        }
        if config.enroll_retry_limit == 0 {
            return Err(ConfigError::InvalidValue(
                "CAMPUS_ENROLL_RETRY_LIMIT".to_string(),
            ));
        }

        Ok(config)
    }

    /// The pool configuration this service config describes.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database_path.as_str()).max_connections(self.max_connections)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
