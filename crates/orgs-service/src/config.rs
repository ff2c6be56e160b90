//! Service configuration
//!
//! Paging bounds and the per-operation deadline, loaded from environment
//! variables with defaults suitable for local development.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid configuration value.
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue {
        /// Configuration key.
        key: String,
        /// Error message.
        message: String,
    },
}

/// Organization service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Limit applied when a page request carries none.
    pub default_limit: u64,

    /// Largest limit a page request may ask for.
    pub max_limit: u64,

    /// Per-operation deadline in milliseconds (0 disables it).
    pub operation_timeout_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 100,
            operation_timeout_ms: 0,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `ORGS_DEFAULT_LIMIT`: limit for requests without one (default: 10)
    /// - `ORGS_MAX_LIMIT`: largest accepted limit (default: 100)
    /// - `ORGS_OPERATION_TIMEOUT_MS`: per-operation deadline, 0 for none (default: 0)
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            default_limit: std::env::var("ORGS_DEFAULT_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.default_limit),
            max_limit: std::env::var("ORGS_MAX_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.max_limit),
            operation_timeout_ms: std::env::var("ORGS_OPERATION_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.operation_timeout_ms),
        }
    }

    /// The per-operation deadline, if one is configured.
    pub fn operation_timeout(&self) -> Option<Duration> {
        (self.operation_timeout_ms > 0).then(|| Duration::from_millis(self.operation_timeout_ms))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_limit == 0 {
            return Err(ConfigError::InvalidValue {
                key: "ORGS_MAX_LIMIT".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.default_limit > self.max_limit {
            return Err(ConfigError::InvalidValue {
                key: "ORGS_DEFAULT_LIMIT".to_string(),
                message: format!("{} exceeds max limit {}", self.default_limit, self.max_limit),
            });
        }
        Ok(())
    }
}
