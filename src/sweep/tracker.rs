// src/sweep/tracker.rs
// =============================================================================
// Completion accounting for one sweep.
//
// `begin()` is called once per task created and hands back a TaskTicket.
// The ticket decrements the outstanding counter exactly once, when it is
// dropped, so "one increment, one decrement per task" holds by construction.
// The counter can't underflow: there are never more tickets alive than
// increments made.
//
// `hold()` hands out a ticket that keeps the counter above zero without
// counting as a task. The dispatcher holds one while it may still create
// tasks, so the count only reaches zero once the whole sweep is done.
//
// Delivered and discarded results are counted too, for the final log line.
// =============================================================================

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

#[derive(Debug, Default)]
pub struct Tracker {
    outstanding: AtomicUsize,
    created: AtomicUsize,
    delivered: AtomicUsize,
    discarded: AtomicUsize,
    idle: Notify,
}

/// Proof that a task was counted. Dropping it marks the task finished.
#[derive(Debug)]
pub struct TaskTicket {
    tracker: Arc<Tracker>,
}

impl Tracker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn begin(self: &Arc<Self>) -> TaskTicket {
        self.created.fetch_add(1, Ordering::AcqRel);
        self.outstanding.fetch_add(1, Ordering::AcqRel);
        TaskTicket {
            tracker: Arc::clone(self),
        }
    }

    /// Keeps the counter above zero until the returned ticket is dropped.
    /// Not counted in `created()`.
    pub fn hold(self: &Arc<Self>) -> TaskTicket {
        self.outstanding.fetch_add(1, Ordering::AcqRel);
        TaskTicket {
            tracker: Arc::clone(self),
        }
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::Acquire)
    }

    pub fn delivered(&self) -> usize {
        self.delivered.load(Ordering::Acquire)
    }

    pub fn discarded(&self) -> usize {
        self.discarded.load(Ordering::Acquire)
    }

    /// Resolves once no task is outstanding.
    ///
    /// Only meaningful after the caller has stopped creating tasks, otherwise
    /// the count may go back up right after this returns.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            // Register before checking the counter so a wakeup between the
            // check and the await is not lost
            notified.as_mut().enable();
            if self.outstanding() == 0 {
                return;
            }
            notified.await;
        }
    }
}

impl TaskTicket {
    pub fn mark_delivered(&self) {
        self.tracker.delivered.fetch_add(1, Ordering::AcqRel);
    }

    /// The result was produced but nobody was listening anymore.
    pub fn mark_discarded(&self) {
        self.tracker.discarded.fetch_add(1, Ordering::AcqRel);
    }
}

impl Drop for TaskTicket {
    fn drop(&mut self) {
        if self.tracker.outstanding.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.tracker.idle.notify_waiters();
        }
    }
}
