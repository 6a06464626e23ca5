//! Attempt records and round outcomes.

use super::error::PingError;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Classification of a single attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// 2xx response
    Success,
    /// Allow-listed status with retries remaining
    RetryableFailure,
    /// Status that ends the round: not allow-listed, or retries exhausted
    TerminalFailure,
    /// No HTTP response (connect, timeout, cancellation)
    TransportError,
}

impl AttemptOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptOutcome::Success => "success",
            AttemptOutcome::RetryableFailure => "retryable_failure",
            AttemptOutcome::TerminalFailure => "terminal_failure",
            AttemptOutcome::TransportError => "transport_error",
        }
    }
}

/// One record per executed attempt, emitted regardless of the round's result.
#[derive(Debug, Clone)]
pub struct AttemptResult {
    pub url: String,
    /// 0-based attempt index within the round
    pub attempt_index: u32,
    pub outcome: AttemptOutcome,
    /// HTTP status, when a response was received
    pub status: Option<u16>,
    pub duration: Duration,
    pub error: Option<PingError>,
    pub started_at: DateTime<Utc>,
}

impl AttemptResult {
    pub fn duration_ms(&self) -> u64 {
        u64::try_from(self.duration.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Terminal state of one retry round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundOutcome {
    /// A 2xx response was received
    Success { attempts: u32, status: u16 },
    /// A status outside the retry allow-list ended the round
    Rejected { attempts: u32, status: u16 },
    /// The last permitted attempt still failed
    Exhausted {
        attempts: u32,
        last_status: Option<u16>,
        last_error: Option<PingError>,
    },
    /// Shutdown fired before the round reached a verdict
    Cancelled { attempts: u32 },
}

impl RoundOutcome {
    /// Attempts actually executed.
    pub fn attempts(&self) -> u32 {
        match self {
            RoundOutcome::Success { attempts, .. }
            | RoundOutcome::Rejected { attempts, .. }
            | RoundOutcome::Exhausted { attempts, .. }
            | RoundOutcome::Cancelled { attempts } => *attempts,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RoundOutcome::Success { .. })
    }

    /// `Rejected` and `Exhausted` are both terminal failures.
    pub fn is_terminal_failure(&self) -> bool {
        matches!(
            self,
            RoundOutcome::Rejected { .. } | RoundOutcome::Exhausted { .. }
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            RoundOutcome::Success { .. } => "success",
            RoundOutcome::Rejected { .. } => "rejected",
            RoundOutcome::Exhausted { .. } => "exhausted",
            RoundOutcome::Cancelled { .. } => "cancelled",
        }
    }
}

/// Consumer of attempt records.
pub trait ResultSink: Send + Sync {
    /// Called once per executed attempt.
    fn record(&self, result: &AttemptResult);

    /// Called once per round when it reaches a terminal state.
    fn round_finished(&self, _url: &str, _outcome: &RoundOutcome) {}
}

/// Writes every attempt as a structured log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ResultSink for TracingSink {
    fn record(&self, result: &AttemptResult) {
        let error = result.error.as_ref().map(tracing::field::display);

        match result.outcome {
            AttemptOutcome::Success => tracing::info!(
                url = %result.url,
                status = result.status,
                duration_ms = result.duration_ms(),
                attempt_index = result.attempt_index,
                outcome = result.outcome.as_str(),
                "Ping succeeded"
            ),
            _ => tracing::warn!(
                url = %result.url,
                status = result.status,
                duration_ms = result.duration_ms(),
                attempt_index = result.attempt_index,
                outcome = result.outcome.as_str(),
                error,
                "Ping failed"
            ),
        }
    }

    fn round_finished(&self, url: &str, outcome: &RoundOutcome) {
        match outcome {
            RoundOutcome::Exhausted {
                attempts,
                last_status,
                last_error,
            } => tracing::warn!(
                url = %url,
                attempts = *attempts,
                last_status = *last_status,
                last_error = last_error.as_ref().map(tracing::field::display),
                "Retries exhausted"
            ),
            RoundOutcome::Rejected { attempts, status } => tracing::warn!(
                url = %url,
                attempts = *attempts,
                status = *status,
                "Non-retryable status, giving up"
            ),
            RoundOutcome::Cancelled { attempts } => tracing::debug!(
                url = %url,
                attempts = *attempts,
                "Round cancelled by shutdown"
            ),
            RoundOutcome::Success { .. } => {}
        }
    }
}
