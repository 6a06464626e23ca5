//! Periodic fan-out of ping rounds and graceful drain.
//!
//! Each tick dispatches one round per target as a tracked task. A task
//! takes a concurrency slot, runs the retry engine and releases the slot
//! on every exit path. Rounds from consecutive ticks may overlap across
//! targets, but a target whose previous round is still running is skipped.

mod state;

pub use state::{InFlightGuard, RunState, TargetClaim, TargetLocks};

use crate::config::PingConfig;
use crate::limit::ConcurrencyLimiter;
use crate::ping::{HttpTransport, RetryEngine, RoundOutcome};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Shortest tick period; `tokio::time::interval` rejects zero.
pub const MIN_TICK: Duration = Duration::from_millis(1);

/// Drives rounds on a fixed interval until cancelled.
pub struct Scheduler {
    config: Arc<PingConfig>,
    engine: Arc<RetryEngine>,
    limiter: ConcurrencyLimiter,
    state: Arc<RunState>,
    targets: Arc<TargetLocks>,
    tracker: TaskTracker,
    interval: Duration,
}

impl Scheduler {
    pub fn new(config: Arc<PingConfig>, engine: RetryEngine) -> Self {
        Self {
            limiter: ConcurrencyLimiter::new(config.concurrency),
            interval: config.interval().max(MIN_TICK),
            engine: Arc::new(engine),
            state: RunState::new(),
            targets: TargetLocks::new(config.targets.len()),
            tracker: TaskTracker::new(),
            config,
        }
    }

    /// Scheduler with the default transport, rate limiter, jitter and sink.
    pub fn from_config(config: PingConfig) -> Result<Self, reqwest::Error> {
        let config = Arc::new(config);
        let engine = RetryEngine::new(Arc::clone(&config), HttpTransport::new()?);
        Ok(Self::new(config, engine))
    }

    /// Override the tick period. Periods below [`MIN_TICK`] are raised to it.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(MIN_TICK);
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn state(&self) -> Arc<RunState> {
        Arc::clone(&self.state)
    }

    pub fn limiter(&self) -> &ConcurrencyLimiter {
        &self.limiter
    }

    /// Dispatch one round per target without waiting for them.
    ///
    /// Targets whose previous round is still running are skipped. A no-op
    /// once shutdown has begun.
    pub fn dispatch_round(
        &self,
        cancel: &CancellationToken,
    ) -> Vec<JoinHandle<(String, RoundOutcome)>> {
        let mut handles = Vec::with_capacity(self.config.targets.len());

        for (index, url) in self.config.targets.iter().enumerate() {
            let Some(claim) = self.targets.try_claim(index) else {
                tracing::debug!(url = %url, "Previous round still running, skipping");
                continue;
            };
            let Some(guard) = self.state.try_enter() else {
                tracing::debug!(url = %url, "Dispatch skipped during shutdown");
                break;
            };

            let url = url.clone();
            let engine = Arc::clone(&self.engine);
            let limiter = self.limiter.clone();
            let cancel = cancel.clone();

            handles.push(self.tracker.spawn(async move {
                let _guard = guard;
                let _claim = claim;

                let Ok(slot) = limiter.acquire(&cancel).await else {
                    tracing::debug!(url = %url, "Slot wait cancelled");
                    return (url, RoundOutcome::Cancelled { attempts: 0 });
                };

                let outcome = engine.run_round(&url, &cancel).await;
                slot.release();
                (url, outcome)
            }));
        }

        handles
    }

    /// Dispatch one round and wait for every target's outcome.
    pub async fn run_once(&self, cancel: &CancellationToken) -> Vec<(String, RoundOutcome)> {
        let mut outcomes = Vec::new();

        for handle in self.dispatch_round(cancel) {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => tracing::error!(error = %e, "Ping task failed"),
            }
        }

        outcomes
    }

    /// Tick until `cancel` fires, then drain in-flight rounds.
    ///
    /// The first round is dispatched immediately. Drain has no deadline of
    /// its own; wrap the returned future in a timeout to bound it.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            targets = self.config.targets.len(),
            interval_seconds = self.interval.as_secs_f64(),
            concurrency = self.limiter.capacity(),
            max_retries = self.config.max_retries,
            "Pinger started"
        );

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    let dispatched = self.dispatch_round(&cancel).len();
                    tracing::debug!(
                        dispatched,
                        in_flight = self.state.in_flight(),
                        "Round dispatched"
                    );
                }
            }
        }

        self.shutdown().await;
    }

    /// Stop admitting rounds and wait until none are in flight.
    pub async fn shutdown(&self) {
        let draining = self.state.in_flight();
        if self.state.begin_shutdown() {
            tracing::info!(
                in_flight = draining,
                "Shutdown requested, draining in-flight pings"
            );
        }

        self.tracker.close();
        self.tracker.wait().await;

        tracing::info!(drained = draining, "Shutdown complete");
    }

    /// Run on a background task.
    pub fn start(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(cancel).await })
    }
}
