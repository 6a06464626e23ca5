//! Global token-bucket gate on attempt issue rate.

use super::Cancelled;
use governor::{DefaultDirectRateLimiter, Quota};
use std::fmt;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Slowest supported rate: one token every 1000 seconds.
pub const MIN_RATE_LIMIT_RPS: f64 = 0.001;

/// Shared rate gate with burst capacity 1. Disabled instances never wait.
#[derive(Clone, Default)]
pub struct RateLimiter {
    inner: Option<Arc<DefaultDirectRateLimiter>>,
    rps: f64,
}

impl RateLimiter {
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Limit to `rps` tokens per second. Non-positive or non-finite rates
    /// disable the gate; positive rates below [`MIN_RATE_LIMIT_RPS`] are
    /// raised to it.
    pub fn per_second(rps: f64) -> Self {
        if !rps.is_finite() || rps <= 0.0 {
            return Self::disabled();
        }
        let rps = rps.max(MIN_RATE_LIMIT_RPS);

        let quota = Duration::try_from_secs_f64(1.0 / rps)
            .ok()
            .and_then(Quota::with_period);

        match quota {
            Some(quota) => Self {
                inner: Some(Arc::new(DefaultDirectRateLimiter::direct(
                    quota.allow_burst(NonZeroU32::MIN),
                ))),
                rps,
            },
            None => Self::disabled(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Wait for a token, or fail with [`Cancelled`] once `cancel` fires.
    pub async fn wait(&self, cancel: &CancellationToken) -> Result<(), Cancelled> {
        if cancel.is_cancelled() {
            return Err(Cancelled);
        }

        let Some(limiter) = &self.inner else {
            return Ok(());
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Cancelled),
            _ = limiter.until_ready() => Ok(()),
        }
    }
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("enabled", &self.is_enabled())
            .field("rps", &self.rps)
            .finish()
    }
}
