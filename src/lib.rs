//! Keepalive pinger
//!
//! Periodically pings a set of HTTP targets to keep them warm. Each round
//! runs through a bounded concurrency gate and an optional global rate
//! limit, and retries allow-listed failures with full-jitter exponential
//! backoff.

pub mod api;
pub mod cli;
pub mod config;
pub mod limit;
pub mod logging;
pub mod ping;
pub mod scheduler;
