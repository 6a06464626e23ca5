//! Exponential backoff with full jitter.

use crate::config::PingConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;
use std::time::Duration;

/// Computes the backoff cap `min(base * 2^n, max)` before retry `n + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    base: Duration,
    max: Duration,
}

impl BackoffPolicy {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self { base, max }
    }

    pub fn from_config(config: &PingConfig) -> Self {
        Self::new(config.backoff_base(), config.backoff_max())
    }

    /// Upper bound of the sleep that follows failed attempt `attempt`.
    pub fn cap(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| self.base.checked_mul(factor))
            .map_or(self.max, |delay| delay.min(self.max))
    }

    /// Sleep before the attempt after `attempt`, drawn from `[0, cap(attempt))`.
    pub fn delay(&self, attempt: u32, jitter: &dyn Jitter) -> Duration {
        let cap = self.cap(attempt);
        jitter.sample(cap).min(cap)
    }
}

/// Source of jitter samples.
pub trait Jitter: Send + Sync {
    /// A duration uniformly drawn from `[0, cap)`; zero when `cap` is zero.
    fn sample(&self, cap: Duration) -> Duration;
}

/// Uniform jitter from a seedable generator.
#[derive(Debug)]
pub struct RandomJitter {
    rng: Mutex<StdRng>,
}

impl RandomJitter {
    /// Generator seeded from the operating system.
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Deterministic generator for reproducible timing.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn from_config(config: &PingConfig) -> Self {
        config.jitter_seed.map_or_else(Self::new, Self::seeded)
    }
}

impl Default for RandomJitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Jitter for RandomJitter {
    fn sample(&self, cap: Duration) -> Duration {
        let nanos = u64::try_from(cap.as_nanos()).unwrap_or(u64::MAX);
        if nanos == 0 {
            return Duration::ZERO;
        }

        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Duration::from_nanos(rng.random_range(0..nanos))
    }
}
