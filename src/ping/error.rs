//! Error types for ping attempts.

use thiserror::Error;

/// Transport-level failures of a single attempt. All of them are retryable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PingError {
    /// Per-attempt deadline elapsed
    #[error("request timeout after {0}ms")]
    Timeout(u64),

    /// Connect, DNS or TLS failure
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Any other request failure
    #[error("request failed: {0}")]
    Request(String),

    /// Shutdown fired while the request was in flight
    #[error("cancelled")]
    Cancelled,
}

impl PingError {
    /// Classify a reqwest error, keeping the source chain in the message.
    pub fn from_reqwest(e: reqwest::Error, timeout_ms: u64) -> Self {
        if e.is_timeout() {
            return PingError::Timeout(timeout_ms);
        }

        let mut message = e.to_string();
        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }

        if e.is_connect() {
            PingError::ConnectionFailed(message)
        } else {
            PingError::Request(message)
        }
    }
}
