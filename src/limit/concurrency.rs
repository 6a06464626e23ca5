//! Bounded admission for in-flight ping rounds.

use super::Cancelled;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

/// Caps the number of simultaneously running rounds.
#[derive(Debug, Clone)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// A held concurrency slot. Dropping it frees the slot.
#[derive(Debug)]
pub struct SlotPermit {
    _permit: OwnedSemaphorePermit,
}

impl SlotPermit {
    /// Free the slot explicitly.
    pub fn release(self) {}
}

impl ConcurrencyLimiter {
    /// Create a limiter; a capacity of 0 is raised to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently free.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Wait for a free slot, or fail with [`Cancelled`] once `cancel` fires.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<SlotPermit, Cancelled> {
        if cancel.is_cancelled() {
            return Err(Cancelled);
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Cancelled),
            permit = Arc::clone(&self.semaphore).acquire_owned() => permit
                .map(|p| SlotPermit { _permit: p })
                .map_err(|_| Cancelled),
        }
    }
}
