//! Per-target retry state machine.
//!
//! A round starts at `Attempting(0)`. Each attempt ends in one of:
//!
//! - `Success` on a 2xx response,
//! - `RetryableFailure` on a transport error or an allow-listed status while
//!   retries remain, followed by a jittered sleep and `Attempting(n + 1)`,
//! - `TerminalFailure` on any other status, or once `n == max_retries`.
//!
//! Attempts of one round are strictly sequential. Every suspension point
//! (rate-limit wait, I/O, backoff sleep) observes the cancellation token.

use super::backoff::{BackoffPolicy, Jitter, RandomJitter};
use super::error::PingError;
use super::result::{AttemptOutcome, AttemptResult, ResultSink, RoundOutcome, TracingSink};
use super::transport::{HttpTransport, ProbeRequest, ProbeResponse};
use crate::config::PingConfig;
use crate::limit::RateLimiter;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// What to do after an attempt has been recorded.
enum Step {
    Retry,
    Finish(RoundOutcome),
}

/// Runs retry rounds against single targets. Cheap to share behind an `Arc`.
pub struct RetryEngine {
    config: Arc<PingConfig>,
    transport: HttpTransport,
    rate_limiter: RateLimiter,
    backoff: BackoffPolicy,
    jitter: Arc<dyn Jitter>,
    sink: Arc<dyn ResultSink>,
}

impl RetryEngine {
    /// Engine with a tracing sink, random jitter and the configured rate limit.
    pub fn new(config: Arc<PingConfig>, transport: HttpTransport) -> Self {
        let rate_limiter = config
            .rate_limit()
            .map_or_else(RateLimiter::disabled, RateLimiter::per_second);
        let jitter = Arc::new(RandomJitter::from_config(&config));

        Self {
            backoff: BackoffPolicy::from_config(&config),
            config,
            transport,
            rate_limiter,
            jitter,
            sink: Arc::new(TracingSink),
        }
    }

    /// Replace the rate limiter (shared gate across engines).
    pub fn with_rate_limiter(mut self, rate_limiter: RateLimiter) -> Self {
        self.rate_limiter = rate_limiter;
        self
    }

    /// Replace the jitter source.
    pub fn with_jitter(mut self, jitter: Arc<dyn Jitter>) -> Self {
        self.jitter = jitter;
        self
    }

    /// Replace the result sink.
    pub fn with_sink(mut self, sink: Arc<dyn ResultSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &PingConfig {
        &self.config
    }

    /// Run one round against `url` until it reaches a terminal state.
    ///
    /// Performs at most `max_retries + 1` attempts.
    pub async fn run_round(&self, url: &str, cancel: &CancellationToken) -> RoundOutcome {
        let mut attempt: u32 = 0;

        loop {
            if self.rate_limiter.wait(cancel).await.is_err() {
                return self.finish(url, RoundOutcome::Cancelled { attempts: attempt });
            }

            let probe = ProbeRequest {
                url,
                user_agent: &self.config.user_agent,
                timeout: self.config.request_timeout(),
                max_body_bytes: self.config.max_body_bytes,
            };

            let started_at = Utc::now();
            let start = Instant::now();
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(PingError::Cancelled),
                r = self.transport.probe(&probe) => r,
            };
            let duration = start.elapsed();

            let (outcome, step) = self.classify(attempt, &result);

            let (status, error) = match result {
                Ok(ProbeResponse { status, .. }) => (Some(status), None),
                Err(e) => (None, Some(e)),
            };

            metrics::counter!("keepalive_attempts_total", "outcome" => outcome.as_str())
                .increment(1);
            metrics::histogram!("keepalive_attempt_duration_seconds")
                .record(duration.as_secs_f64());

            self.sink.record(&AttemptResult {
                url: url.to_string(),
                attempt_index: attempt,
                outcome,
                status,
                duration,
                error,
                started_at,
            });

            if let Step::Finish(done) = step {
                return self.finish(url, done);
            }

            let delay = self.backoff.delay(attempt, self.jitter.as_ref());
            tracing::debug!(
                url,
                attempt_index = attempt,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "Backing off before retry"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return self.finish(url, RoundOutcome::Cancelled { attempts: attempt + 1 });
                }
                _ = tokio::time::sleep(delay) => {}
            }

            attempt += 1;
        }
    }

    /// Classify attempt `attempt` and decide whether the round continues.
    fn classify(
        &self,
        attempt: u32,
        result: &Result<ProbeResponse, PingError>,
    ) -> (AttemptOutcome, Step) {
        let attempts = attempt + 1;
        let exhausted = attempt >= self.config.max_retries;

        match result {
            Err(PingError::Cancelled) => (
                AttemptOutcome::TransportError,
                Step::Finish(RoundOutcome::Cancelled { attempts }),
            ),
            Err(e) if exhausted => (
                AttemptOutcome::TransportError,
                Step::Finish(RoundOutcome::Exhausted {
                    attempts,
                    last_status: None,
                    last_error: Some(e.clone()),
                }),
            ),
            Err(_) => (AttemptOutcome::TransportError, Step::Retry),
            Ok(ProbeResponse { status, .. }) if (200..300).contains(status) => (
                AttemptOutcome::Success,
                Step::Finish(RoundOutcome::Success {
                    attempts,
                    status: *status,
                }),
            ),
            Ok(ProbeResponse { status, .. }) if self.config.retry_statuses.contains(*status) => {
                if exhausted {
                    (
                        AttemptOutcome::TerminalFailure,
                        Step::Finish(RoundOutcome::Exhausted {
                            attempts,
                            last_status: Some(*status),
                            last_error: None,
                        }),
                    )
                } else {
                    (AttemptOutcome::RetryableFailure, Step::Retry)
                }
            }
            Ok(ProbeResponse { status, .. }) => (
                AttemptOutcome::TerminalFailure,
                Step::Finish(RoundOutcome::Rejected {
                    attempts,
                    status: *status,
                }),
            ),
        }
    }

    fn finish(&self, url: &str, outcome: RoundOutcome) -> RoundOutcome {
        metrics::counter!("keepalive_rounds_total", "result" => outcome.label()).increment(1);
        self.sink.round_finished(url, &outcome);
        outcome
    }
}
