//! Admission gates shared by all ping workers.
//!
//! Both gates are cancellation-aware: a waiter returns [`Cancelled`] as soon
//! as the shutdown token fires instead of blocking the drain.

mod concurrency;
mod rate;

pub use concurrency::{ConcurrencyLimiter, SlotPermit};
pub use rate::{RateLimiter, MIN_RATE_LIMIT_RPS};

use thiserror::Error;

/// The shutdown token fired while waiting at a gate.
///
/// This is a normal early-exit condition, not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cancelled by shutdown")]
pub struct Cancelled;
