//! Shared test utilities for keepalive integration tests.

#![allow(dead_code)]

use keepalive::config::PingConfig;
use keepalive::ping::{AttemptResult, HttpTransport, Jitter, ResultSink, RetryEngine, RoundOutcome};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// =============================================================================
// Sinks and jitter
// =============================================================================

/// Collects every attempt record and finished round.
#[derive(Default)]
pub struct CollectingSink {
    pub attempts: Mutex<Vec<AttemptResult>>,
    pub rounds: Mutex<Vec<(String, RoundOutcome)>>,
}

impl CollectingSink {
    pub fn attempts(&self) -> Vec<AttemptResult> {
        self.attempts.lock().unwrap().clone()
    }

    pub fn rounds(&self) -> Vec<(String, RoundOutcome)> {
        self.rounds.lock().unwrap().clone()
    }
}

impl ResultSink for CollectingSink {
    fn record(&self, result: &AttemptResult) {
        self.attempts.lock().unwrap().push(result.clone());
    }

    fn round_finished(&self, url: &str, outcome: &RoundOutcome) {
        self.rounds
            .lock()
            .unwrap()
            .push((url.to_string(), outcome.clone()));
    }
}

/// Records the cap of every backoff and sleeps a fixed fraction of it.
pub struct RecordingJitter {
    pub caps: Mutex<Vec<Duration>>,
    /// Returned sample as a fraction of the cap, in [0, 1)
    pub fraction: f64,
}

impl RecordingJitter {
    pub fn zero() -> Self {
        Self::with_fraction(0.0)
    }

    pub fn with_fraction(fraction: f64) -> Self {
        Self {
            caps: Mutex::new(Vec::new()),
            fraction,
        }
    }

    pub fn caps(&self) -> Vec<Duration> {
        self.caps.lock().unwrap().clone()
    }
}

impl Jitter for RecordingJitter {
    fn sample(&self, cap: Duration) -> Duration {
        self.caps.lock().unwrap().push(cap);
        cap.mul_f64(self.fraction)
    }
}

// =============================================================================
// Builders
// =============================================================================

/// A config with fast timeouts suitable for tests.
pub fn test_config(targets: Vec<String>) -> PingConfig {
    PingConfig {
        targets,
        request_timeout_ms: 2000,
        backoff_base_ms: 200,
        backoff_max_ms: 2000,
        ..Default::default()
    }
}

/// Engine wired to the given sink and jitter.
pub fn test_engine(
    config: PingConfig,
    sink: Arc<CollectingSink>,
    jitter: Arc<RecordingJitter>,
) -> RetryEngine {
    RetryEngine::new(Arc::new(config), HttpTransport::new().unwrap())
        .with_sink(sink)
        .with_jitter(jitter)
}

/// A loopback URL nothing is listening on.
pub fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/", addr)
}
