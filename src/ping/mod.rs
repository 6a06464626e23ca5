//! Ping engine: transport, backoff policy and the per-target retry state machine.
//!
//! One round pings one target until it succeeds, hits a non-retryable
//! status, exhausts `max_retries`, or is cancelled. Every attempt is
//! reported to a [`ResultSink`].

mod backoff;
mod error;
mod result;
mod retry;
mod transport;

pub use backoff::{BackoffPolicy, Jitter, RandomJitter};
pub use error::PingError;
pub use result::{AttemptOutcome, AttemptResult, ResultSink, RoundOutcome, TracingSink};
pub use retry::RetryEngine;
pub use transport::{
    HttpTransport, ProbeRequest, ProbeResponse, CONNECT_TIMEOUT, POOL_IDLE_TIMEOUT,
    POOL_MAX_IDLE_PER_HOST,
};
