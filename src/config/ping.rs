//! Ping configuration

use super::error::ConfigError;
use super::statuses::RetryStatusSet;
use crate::limit::MIN_RATE_LIMIT_RPS;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Shortest interval accepted without `allow_short_interval`.
pub const MIN_INTERVAL_SECONDS: u64 = 10;

/// Settings shared read-only by the scheduler and retry engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PingConfig {
    /// Target URLs pinged every round
    pub targets: Vec<String>,
    /// Seconds between rounds
    pub interval_seconds: u64,
    /// Permit intervals below [`MIN_INTERVAL_SECONDS`]
    pub allow_short_interval: bool,
    /// Deadline for a single attempt, body drain included
    pub request_timeout_ms: u64,
    /// Retries after the first attempt (0 = single attempt)
    pub max_retries: u32,
    /// Backoff before retry `n + 1` is capped at `base * 2^n`
    pub backoff_base_ms: u64,
    /// Upper bound on any backoff cap
    pub backoff_max_ms: u64,
    /// HTTP statuses that are retried
    pub retry_statuses: RetryStatusSet,
    /// Response bytes read and discarded per attempt
    pub max_body_bytes: u64,
    /// Aggregate attempt rate across all targets (0 = unlimited)
    pub rate_limit_rps: f64,
    /// Maximum simultaneous in-flight rounds
    pub concurrency: usize,
    /// Value of the User-Agent header
    pub user_agent: String,
    /// Seed for backoff jitter; random when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jitter_seed: Option<u64>,
}

impl Default for PingConfig {
    fn default() -> Self {
        Self {
            targets: Vec::new(),
            interval_seconds: 60,
            allow_short_interval: false,
            request_timeout_ms: 5000,
            max_retries: 2,
            backoff_base_ms: 200,
            backoff_max_ms: 2000,
            retry_statuses: RetryStatusSet::default(),
            max_body_bytes: 1 << 20,
            rate_limit_rps: 0.0,
            concurrency: 1,
            user_agent: "keepalive-pinger/1.0".to_string(),
            jitter_seed: None,
        }
    }
}

impl PingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn backoff_max(&self) -> Duration {
        Duration::from_millis(self.backoff_max_ms)
    }

    /// Configured rate, or `None` when rate limiting is disabled.
    pub fn rate_limit(&self) -> Option<f64> {
        (self.rate_limit_rps > 0.0).then_some(self.rate_limit_rps)
    }

    /// Parse a comma-separated target list, dropping empty entries.
    pub fn parse_targets(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.targets.is_empty() {
            return Err(ConfigError::MissingField("ping.targets".to_string()));
        }

        for (i, target) in self.targets.iter().enumerate() {
            let field = format!("ping.targets[{}]", i);
            let url = reqwest::Url::parse(target)
                .map_err(|e| ConfigError::invalid(&field, format!("'{}': {}", target, e)))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(ConfigError::invalid(
                    field,
                    format!("unsupported scheme '{}'", url.scheme()),
                ));
            }
        }

        if self.interval_seconds == 0 {
            return Err(ConfigError::invalid(
                "ping.interval_seconds",
                "interval must be non-zero",
            ));
        }
        if self.interval_seconds < MIN_INTERVAL_SECONDS && !self.allow_short_interval {
            return Err(ConfigError::invalid(
                "ping.interval_seconds",
                format!(
                    "interval < {}s requires allow_short_interval",
                    MIN_INTERVAL_SECONDS
                ),
            ));
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "ping.request_timeout_ms",
                "timeout must be non-zero",
            ));
        }
        if self.concurrency == 0 {
            return Err(ConfigError::invalid(
                "ping.concurrency",
                "concurrency must be at least 1",
            ));
        }
        if self.backoff_base_ms == 0 {
            return Err(ConfigError::invalid(
                "ping.backoff_base_ms",
                "backoff base must be non-zero",
            ));
        }
        if self.backoff_max_ms < self.backoff_base_ms {
            return Err(ConfigError::invalid(
                "ping.backoff_max_ms",
                "backoff max must not be below backoff base",
            ));
        }
        if !self.rate_limit_rps.is_finite() || self.rate_limit_rps < 0.0 {
            return Err(ConfigError::invalid(
                "ping.rate_limit_rps",
                "rate limit must be a non-negative number",
            ));
        }
        if self.rate_limit_rps > 0.0 && self.rate_limit_rps < MIN_RATE_LIMIT_RPS {
            return Err(ConfigError::invalid(
                "ping.rate_limit_rps",
                format!("rate limit must be 0 or at least {}", MIN_RATE_LIMIT_RPS),
            ));
        }

        Ok(())
    }
}
