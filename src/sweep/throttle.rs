// src/sweep/throttle.rs
// Counting gate that bounds how many probe tasks are in flight at once.
//
// A slot is a tokio semaphore permit wrapped in `Slot`. Releasing happens in
// `Drop`, so a release without a matching acquire can't be written, and a
// slot can't be released twice.

use std::sync::Arc;

// OwnedSemaphorePermit holds an Arc to its semaphore, so a Slot can be moved
// into a spawned task without borrowing the Throttle
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::{SweepError, SweepResult};

/// Ceiling used when none is configured.
pub const DEFAULT_CEILING: usize = 50;

// Cloning shares the same semaphore: every clone draws from one pool
#[derive(Debug, Clone)]
pub struct Throttle {
    semaphore: Arc<Semaphore>,
    ceiling: usize,
}

/// One reserved slot. Dropping it returns the slot to the throttle.
#[derive(Debug)]
pub struct Slot {
    // Never read, only dropped. Dropping it is the release
    _permit: OwnedSemaphorePermit,
}

impl Throttle {
    pub fn new(ceiling: usize) -> SweepResult<Self> {
        // A ceiling of 0 would make every acquire() wait forever
        if ceiling == 0 {
            return Err(SweepError::Configuration(
                "concurrency ceiling must be at least 1".to_string(),
            ));
        }
        // tokio panics above this limit, report it as bad input instead
        if ceiling > Semaphore::MAX_PERMITS {
            return Err(SweepError::Configuration(format!(
                "concurrency ceiling must be at most {}",
                Semaphore::MAX_PERMITS
            )));
        }

        Ok(Self {
            semaphore: Arc::new(Semaphore::new(ceiling)),
            ceiling,
        })
    }

    /// Waits (without spinning) until a slot is free and reserves it.
    pub async fn acquire(&self) -> Slot {
        // The semaphore is never closed, so acquiring can't fail
        let permit = match Arc::clone(&self.semaphore).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => unreachable!("throttle semaphore is never closed"),
        };
        Slot { _permit: permit }
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    /// Number of slots currently held.
    pub fn in_flight(&self) -> usize {
        // available_permits() never exceeds the initial count, no underflow
        self.ceiling - self.semaphore.available_permits()
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why not a plain AtomicUsize?
//    - acquire() has to wait without spinning and wake up as soon as a slot
//      is freed; tokio's Semaphore already does that with a fair queue
//
// 2. Why no release() method?
//    - Release is Drop on Slot. You can only release what you hold, and the
//      compiler won't let you drop the same Slot twice
// -----------------------------------------------------------------------------
