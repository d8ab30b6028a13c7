// src/sweep/dispatch.rs
// =============================================================================
// Fan-out / gather for one sweep.
//
// How it works:
// 1. dispatch() takes a guard ticket on the tracker before returning, so the
//    outstanding count is above zero for as long as tasks may still be created
// 2. A dispatcher task walks paths x methods (path-major) and builds one
//    ProbeTask per combination, numbered 0..P*M
// 3. For each task it counts the task (TaskTicket), then waits for a throttle
//    Slot, and only then spawns the worker. At most `ceiling` workers exist
//    at any time, no matter how long the wordlist is
// 4. The worker runs the prober, sends the result into a bounded channel,
//    then gives back its slot, its ticket and its sender, in that order
// 5. Once every task has been issued the dispatcher drops its guard, then its
//    own sender. The channel closes when the last worker's sender is gone,
//    which is exactly "every task finished and no more will be created"
//
// The caller holds a ResultStream (the receiving end) and can start draining
// before dispatch is done.
// =============================================================================

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

// FutureExt gives us .catch_unwind() on the probe future
use futures::{FutureExt, Stream};
use reqwest::Method;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::http::Prober;
use super::task::{ProbeOutcome, ProbeResult, ProbeTask, METHODS};
use super::throttle::Throttle;
use super::tracker::{TaskTicket, Tracker};
use crate::error::ProbeError;

// One dispatcher per prober/throttle pair. It can run several sweeps, each
// dispatch() gets its own tracker and channel so runs don't share state
pub struct Dispatcher<P> {
    prober: Arc<P>,
    throttle: Throttle,
    methods: Arc<[Method]>,
}

impl<P: Prober> Dispatcher<P> {
    pub fn new(prober: P, throttle: Throttle) -> Self {
        Self {
            prober: Arc::new(prober),
            throttle,
            methods: Arc::from(METHODS.to_vec()),
        }
    }

    /// Replaces the method set. Every path still gets the same set.
    #[cfg(test)]
    pub fn with_methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.methods = methods.into_iter().collect();
        self
    }

    /// Number of tasks a sweep over `path_count` paths will create.
    pub fn task_count(&self, path_count: usize) -> usize {
        path_count.saturating_mul(self.methods.len())
    }

    /// Starts probing every (path, method) pair against `target`.
    ///
    /// Must be called from inside a tokio runtime. The returned stream yields
    /// one result per task, in completion order, and ends after the last one.
    pub fn dispatch(&self, target: &str, paths: &[String]) -> ResultStream {
        // Capacity = ceiling: a slow consumer blocks at most `ceiling`
        // workers on send, it never lets results pile up without bound
        let (tx, rx) = mpsc::channel(self.throttle.ceiling());
        let tracker = Tracker::new();

        // Taken here, not inside the spawned task, so outstanding() is
        // already non-zero when the caller gets the stream back
        let guard = tracker.hold();

        // Copy the borrowed inputs into shared, immutable handles
        // (every task clones an Arc instead of a String)
        let run = SweepRun {
            prober: Arc::clone(&self.prober),
            throttle: self.throttle.clone(),
            methods: Arc::clone(&self.methods),
            target: Arc::from(target),
            paths: paths.iter().map(|p| Arc::from(p.as_str())).collect(),
            tracker: Arc::clone(&tracker),
        };
        tokio::spawn(run.execute(guard, tx));

        ResultStream { rx, tracker }
    }
}

// Everything one dispatcher task needs, owned so it can be moved into spawn
struct SweepRun<P> {
    prober: Arc<P>,
    throttle: Throttle,
    methods: Arc<[Method]>,
    target: Arc<str>,
    paths: Vec<Arc<str>>,
    tracker: Arc<Tracker>,
}

impl<P: Prober> SweepRun<P> {
    async fn execute(self, guard: TaskTicket, tx: mpsc::Sender<ProbeResult>) {
        info!(
            base_url = %self.target,
            paths = self.paths.len(),
            methods = self.methods.len(),
            ceiling = self.throttle.ceiling(),
            "starting sweep"
        );

        // Ids are handed out in creation order, so they double as an index
        // into the path-major cross product
        let mut next_id = 0;

        'paths: for path in &self.paths {
            for method in self.methods.iter() {
                // Nobody is reading anymore, creating more work is pointless
                if tx.is_closed() {
                    warn!("result stream dropped, no further tasks will be dispatched");
                    break 'paths;
                }

                let task = ProbeTask {
                    id: next_id,
                    target: Arc::clone(&self.target),
                    path: Arc::clone(path),
                    method: method.clone(),
                };
                next_id += 1;

                // Count the task first, then wait for room. Both move into
                // the worker below and are released by it, never by us
                let ticket = self.tracker.begin();
                let slot = self.throttle.acquire().await;
                let prober = Arc::clone(&self.prober);
                let tx = tx.clone();

                debug!(
                    id = task.id,
                    method = %task.method,
                    path = %task.path,
                    in_flight = self.throttle.in_flight(),
                    "dispatching"
                );

                tokio::spawn(async move {
                    // A panicking prober still yields exactly one result
                    let outcome = AssertUnwindSafe(prober.probe(&task)).catch_unwind().await;
                    let result = match outcome {
                        Ok(result) => result,
                        Err(panic) => {
                            let message = panic_message(panic.as_ref());
                            error!(id = task.id, %message, "prober panicked");
                            ProbeResult::failed(
                                &task,
                                ProbeError::Transport(format!("prober panicked: {}", message)),
                            )
                        }
                    };

                    if let ProbeOutcome::Failed { error } = &result.outcome {
                        debug!(id = task.id, url = %result.url, %error, "probe failed");
                    } else {
                        debug!(id = task.id, url = %result.url, "probe finished");
                    }

                    // send() only fails when the ResultStream was dropped
                    if tx.send(result).await.is_ok() {
                        ticket.mark_delivered();
                    } else {
                        ticket.mark_discarded();
                    }

                    // Order matters: the slot is free before the task counts
                    // as finished, and the count is down before the channel
                    // can observe the last sender going away
                    drop(slot);
                    drop(ticket);
                    drop(tx);
                });
            }
        }

        // No more tasks will be created. Same order as the workers:
        // count first, sender last
        drop(guard);
        drop(tx);
        self.tracker.wait_idle().await;

        let created = self.tracker.created();
        let delivered = self.tracker.delivered();
        let discarded = self.tracker.discarded();
        if discarded > 0 {
            warn!(discarded, "results produced after the stream was dropped were discarded");
        }
        info!(tasks = created, results = delivered, "sweep finished");
    }
}

// Panic payloads are usually a &str (panic!("literal")) or a String (panic!("{}", x))
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Receiving end of a sweep. Yields each ProbeResult once, then ends.
pub struct ResultStream {
    rx: mpsc::Receiver<ProbeResult>,
    tracker: Arc<Tracker>,
}

impl ResultStream {
    /// Tasks not yet finished, plus one while the dispatcher may still create
    /// more. Zero once the stream has ended.
    pub fn outstanding(&self) -> usize {
        self.tracker.outstanding()
    }

    /// Tasks created so far.
    pub fn created(&self) -> usize {
        self.tracker.created()
    }
}

impl Stream for ResultStream {
    type Item = ProbeResult;

    // mpsc::Receiver is Unpin, so we can poll it straight through the Pin
    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why acquire the slot before tokio::spawn?
//    - Spawning first and waiting inside the worker would still create one
//      task per (path, method) up front, even if only `ceiling` run
//    - Acquiring first keeps the number of live workers at the ceiling
//
// 2. Why are Slot and TaskTicket separate?
//    - The slot bounds concurrency, the ticket tracks completion
//    - Both are owned by the same worker and both are released by Drop,
//      so a task can never release one without having taken it
//
// 3. What ends the stream?
//    - mpsc::Receiver yields None once every Sender is dropped
//    - The dispatcher's own Sender is dropped only after the last task is
//      issued, and each worker drops its Sender last
//
// 4. Why does dispatch() take a guard ticket?
//    - Without it the counter reads 0 before the first task is created, and
//      can touch 0 between two tasks while the loop waits for a slot
//    - With it, 0 means "stream over", nothing else
//
// 5. Why catch_unwind?
//    - A panic inside a spawned task only kills that task; without catching
//      it the result would be lost and the sweep would end one short
// -----------------------------------------------------------------------------
