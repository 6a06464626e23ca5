//! Process-wide run state: in-flight counter and shutdown flag.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Shared between the scheduler and its workers.
#[derive(Debug, Default)]
pub struct RunState {
    in_flight: AtomicUsize,
    shutdown: AtomicBool,
}

/// Counts one dispatched round; decrements on drop.
#[derive(Debug)]
pub struct InFlightGuard {
    state: Arc<RunState>,
}

impl RunState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Set the shutdown flag. Returns true only for the call that flipped it.
    pub fn begin_shutdown(&self) -> bool {
        self.shutdown
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Admit one round, or `None` once shutdown has begun.
    pub fn try_enter(self: &Arc<Self>) -> Option<InFlightGuard> {
        if self.is_shutting_down() {
            return None;
        }
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::gauge!("keepalive_in_flight").set(now as f64);
        Some(InFlightGuard {
            state: Arc::clone(self),
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let now = self.state.in_flight.fetch_sub(1, Ordering::SeqCst) - 1;
        metrics::gauge!("keepalive_in_flight").set(now as f64);
    }
}

/// One busy flag per target, so a target never has two rounds running.
#[derive(Debug)]
pub struct TargetLocks {
    busy: Vec<AtomicBool>,
}

/// Marks a target busy until dropped.
#[derive(Debug)]
pub struct TargetClaim {
    locks: Arc<TargetLocks>,
    index: usize,
}

impl TargetLocks {
    pub fn new(targets: usize) -> Arc<Self> {
        Arc::new(Self {
            busy: (0..targets).map(|_| AtomicBool::new(false)).collect(),
        })
    }

    pub fn is_busy(&self, index: usize) -> bool {
        self.busy
            .get(index)
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Claim target `index`, or `None` while its previous round still runs.
    pub fn try_claim(self: &Arc<Self>, index: usize) -> Option<TargetClaim> {
        let flag = self.busy.get(index)?;
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()?;
        Some(TargetClaim {
            locks: Arc::clone(self),
            index,
        })
    }
}

impl Drop for TargetClaim {
    fn drop(&mut self) {
        if let Some(flag) = self.locks.busy.get(self.index) {
            flag.store(false, Ordering::SeqCst);
        }
    }
}
