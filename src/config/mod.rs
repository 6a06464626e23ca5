//! Configuration module for the keepalive pinger
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`TARGET_URLS`, `INTERVAL_SECONDS`, ...)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use keepalive::config::KeepaliveConfig;
//!
//! let toml = r#"
//! [ping]
//! targets = ["https://example.com/health"]
//! interval_seconds = 30
//! "#;
//! let config: KeepaliveConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.ping.interval_seconds, 30);
//! assert_eq!(config.health.port, 8080);
//! assert!(config.validate().is_ok());
//! ```

pub mod error;
pub mod logging;
pub mod ping;
pub mod server;
pub mod statuses;

pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use ping::{PingConfig, MIN_INTERVAL_SECONDS};
pub use server::HealthServerConfig;
pub use statuses::RetryStatusSet;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Unified configuration for the pinger process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct KeepaliveConfig {
    /// Targets, retry policy and limits
    pub ping: PingConfig,
    /// Health endpoint bind address
    pub health: HealthServerConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl KeepaliveConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable source.
    ///
    /// Unparseable numeric values are ignored and the previous value is kept.
    /// An invalid `ALLOW_RETRY_ON_STATUS` list is an error.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(targets) = var("TARGET_URLS") {
            self.ping.targets = PingConfig::parse_targets(&targets);
        }
        if let Some(v) = var("INTERVAL_SECONDS").and_then(|v| v.parse().ok()) {
            self.ping.interval_seconds = v;
        }
        if let Some(v) = var("ALLOW_ONE_SECOND_INTERVAL") {
            self.ping.allow_short_interval = v.to_lowercase() == "true";
        }
        if let Some(v) = var("REQUEST_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            self.ping.request_timeout_ms = v;
        }
        if let Some(v) = var("USER_AGENT") {
            self.ping.user_agent = v;
        }
        if let Some(v) = var("CONCURRENCY").and_then(|v| v.parse().ok()) {
            self.ping.concurrency = v;
        }
        if let Some(v) = var("MAX_RETRIES").and_then(|v| v.parse().ok()) {
            self.ping.max_retries = v;
        }
        if let Some(v) = var("BACKOFF_BASE_MS").and_then(|v| v.parse().ok()) {
            self.ping.backoff_base_ms = v;
        }
        if let Some(v) = var("BACKOFF_MAX_MS").and_then(|v| v.parse().ok()) {
            self.ping.backoff_max_ms = v;
        }
        if let Some(v) = var("MAX_BODY_BYTES").and_then(|v| v.parse().ok()) {
            self.ping.max_body_bytes = v;
        }
        if let Some(v) = var("RATE_LIMIT_RPS").and_then(|v| v.parse().ok()) {
            self.ping.rate_limit_rps = v;
        }
        if let Some(v) = var("JITTER_SEED").and_then(|v| v.parse().ok()) {
            self.ping.jitter_seed = Some(v);
        }
        if let Some(v) = var("ALLOW_RETRY_ON_STATUS") {
            self.ping.retry_statuses = v
                .parse()
                .map_err(|e| ConfigError::invalid("ALLOW_RETRY_ON_STATUS", e))?;
        }

        // Health endpoint; PORT is the platform convention fallback
        if let Some(port) = var("HEALTH_PORT")
            .or_else(|| var("PORT"))
            .and_then(|v| v.parse().ok())
        {
            self.health.port = port;
        }

        if let Some(level) = var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(json) = var("LOG_JSON") {
            self.logging.format = LogFormat::from_json_flag(&json);
        }

        Ok(self)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ping.validate()?;
        self.logging.validate()?;

        if self.health.enabled && self.health.port == 0 {
            return Err(ConfigError::invalid(
                "health.port",
                "port must be non-zero",
            ));
        }

        Ok(())
    }
}
