//! # Executor: FIFO work queue consumed by a pool of worker threads.
//!
//! ## Architecture
//! ```text
//! Producers (any thread):                  Workers (OS threads):
//!   submit(fn) ──┐
//!   submit(fn) ──┼──► JobQueue ──────────► worker 0 ──► job() under panic guard
//!   submit(fn) ──┘   (FIFO, closable)  └─► worker N ──► job() under panic guard
//!                                                │
//!                                                └─ panic ─► Fault ─► Observe::on_fault
//! ```
//!
//! ## Rules
//! - **FIFO dequeue**: items start in submission order. With one worker they
//!   also *finish* in submission order; with several workers completion order
//!   is unspecified.
//! - **Lifecycle misuse is non-fatal**: submitting to a stopping/stopped
//!   executor silently drops the item ([`Executor::submit`] returns `false`).
//! - **Panics don't kill workers**: a panicking job is caught, reported to
//!   the fault observers, and the worker moves on. The one exception is a
//!   panic inside an observer itself, which terminates that worker; the
//!   executor does not replace it (the degraded thread count is observable
//!   via [`Executor::live_workers`]).
//! - **Stopping drains**: closing the queue rejects new work but never
//!   discards the backlog; `stop` returns after the workers have finished it.
//!
//! ## Example
//! ```
//! use taskgate::{Executor, ExecutorConfig};
//!
//! let exec = Executor::new(ExecutorConfig::default());
//! exec.start()?;
//! exec.submit_and_wait(|| {
//!     // runs on the worker thread
//! })?;
//! exec.stop(true);
//! # Ok::<(), taskgate::ExecutorError>(())
//! ```

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use crate::config::ExecutorConfig;
use crate::error::ExecutorError;
use crate::executor::queue::{Dequeued, JobQueue};
use crate::executor::state::ExecutorState;
use crate::observers::{Fault, Observe};
use crate::priority::Priority;

/// FIFO work queue plus the worker-thread pool consuming it.
///
/// See the [module docs](self) for the execution rules.
pub struct Executor {
    config: ExecutorConfig,
    shared: Arc<Shared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

/// State shared with the worker threads.
struct Shared {
    queue: JobQueue,
    state: Mutex<ExecutorState>,
    priority: AtomicU8,
    live: AtomicUsize,
    observers: Mutex<Vec<Arc<dyn Observe>>>,
}

impl Shared {
    fn priority(&self) -> Priority {
        Priority::decode(self.priority.load(Ordering::Relaxed))
    }

    fn set_priority(&self, priority: Priority) {
        self.priority.store(priority.encode(), Ordering::Relaxed);
    }

    /// Delivers a fault to every registered observer.
    ///
    /// Returns `Err` if an observer panicked — the caller (the worker loop)
    /// treats that as an internal fault and terminates.
    fn notify_fault(&self, fault: &Fault) -> Result<(), ()> {
        let observers: Vec<Arc<dyn Observe>> = self
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for observer in observers {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| observer.on_fault(fault)));
            if outcome.is_err() {
                tracing::error!(
                    observer = observer.name(),
                    seq = fault.seq,
                    "observer panicked while handling a fault"
                );
                return Err(());
            }
        }
        Ok(())
    }
}

impl Executor {
    /// Creates an executor. No threads are spawned until [`start`](Self::start).
    #[must_use]
    pub fn new(config: ExecutorConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                queue: JobQueue::new(),
                state: Mutex::new(ExecutorState::NotStarted),
                priority: AtomicU8::new(config.priority.encode()),
                live: AtomicUsize::new(0),
                observers: Mutex::new(Vec::new()),
            }),
            workers: Mutex::new(Vec::new()),
            config,
        }
    }

    /// Spawns the configured number of worker threads and begins consuming.
    ///
    /// Valid from `NotStarted` and `Stopped` (a stopped executor can be
    /// started again); a no-op in every other state. On a spawn failure the
    /// executor still transitions to `Started` with however many workers came
    /// up — an observable degraded condition, reported via the returned
    /// [`ExecutorError::Spawn`].
    pub fn start(&self) -> Result<(), ExecutorError> {
        let mut state = self
            .shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !matches!(
            *state,
            ExecutorState::NotStarted | ExecutorState::Stopped
        ) {
            return Ok(());
        }
        *state = ExecutorState::Starting;
        self.shared.queue.reopen();

        let mut workers = self.workers.lock().unwrap_or_else(PoisonError::into_inner);
        for index in 0..self.config.worker_count() {
            match self.spawn_worker(index) {
                Ok(handle) => workers.push(handle),
                Err(source) => {
                    *state = ExecutorState::Started;
                    tracing::error!(
                        worker = index,
                        error = %source,
                        "failed to spawn worker; executor is running degraded"
                    );
                    return Err(ExecutorError::Spawn { source });
                }
            }
        }
        *state = ExecutorState::Started;
        tracing::debug!(workers = workers.len(), "executor started");
        Ok(())
    }

    fn spawn_worker(&self, index: usize) -> std::io::Result<JoinHandle<()>> {
        let shared = Arc::clone(&self.shared);
        // Counted up-front so `live_workers` is accurate as soon as `start`
        // returns; undone if the spawn itself fails.
        shared.live.fetch_add(1, Ordering::Relaxed);
        let spawned = thread::Builder::new()
            .name(format!("{}-{}", self.config.thread_name, index))
            .spawn(move || {
                worker_loop(&shared, index);
                shared.live.fetch_sub(1, Ordering::Relaxed);
            });
        if spawned.is_err() {
            self.shared.live.fetch_sub(1, Ordering::Relaxed);
        }
        spawned
    }

    /// Enqueues a work item.
    ///
    /// Returns `true` once queued. Returns `false` — dropping the item, not
    /// an error — when the executor is stopping or stopped. Items submitted
    /// before [`start`](Self::start) wait in the queue until then.
    pub fn submit<F>(&self, work: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        if !self.state().is_accepting() {
            tracing::debug!("submission dropped: executor is shutting down");
            return false;
        }
        self.shared.queue.push(Box::new(work))
    }

    /// Enqueues a work item and blocks until it has run.
    ///
    /// Once this returns `Ok`, every side effect of `work` is visible to the
    /// calling thread. Returns [`ExecutorError::Rejected`] when the executor
    /// no longer accepts work and [`ExecutorError::Abandoned`] when the item
    /// was discarded (or died) before signalling completion — a waiting
    /// caller is never left blocked forever by a shutdown.
    ///
    /// Must not be called from this executor's own worker thread: with a
    /// single worker that deadlocks.
    pub fn submit_and_wait<F>(&self, work: F) -> Result<(), ExecutorError>
    where
        F: FnOnce() + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<()>();
        let accepted = self.submit(move || {
            work();
            let _ = tx.send(());
        });
        if !accepted {
            return Err(ExecutorError::Rejected);
        }
        rx.recv().map_err(|_| ExecutorError::Abandoned)
    }

    /// Stops the executor and waits for the workers to exit.
    ///
    /// Valid from `Started` only; a no-op otherwise (stopping twice is fine).
    ///
    /// With `drain = true` a barrier item is pushed first and awaited, which
    /// guarantees that everything submitted strictly before this call has
    /// *executed* before the queue closes. Either way the queue then closes,
    /// rejecting new submissions, and the workers finish whatever is already
    /// queued before exiting — `stop(false)` skips only the barrier wait, it
    /// does not discard the backlog.
    ///
    /// Items stranded by previously-terminated workers are discarded at the
    /// end, which wakes their waiters with [`ExecutorError::Abandoned`].
    pub fn stop(&self, drain: bool) {
        {
            let mut state = self
                .shared
                .state
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if *state != ExecutorState::Started {
                return;
            }
            *state = ExecutorState::Stopping;
        }
        tracing::debug!(drain, "executor stopping");

        if drain && self.live_workers() > 0 {
            // Pushed straight onto the queue: the lifecycle gate already
            // rejects public submissions, but the barrier must land behind
            // every item that got in before the transition.
            let (tx, rx) = mpsc::channel::<()>();
            if self.shared.queue.push(Box::new(move || {
                let _ = tx.send(());
            })) {
                let _ = rx.recv();
            }
        }

        self.shared.queue.close();
        let handles: Vec<JoinHandle<()>> = {
            let mut workers = self.workers.lock().unwrap_or_else(PoisonError::into_inner);
            workers.drain(..).collect()
        };
        for handle in handles {
            let _ = handle.join();
        }

        let stranded = self.shared.queue.drain_remaining();
        if stranded > 0 {
            tracing::warn!(stranded, "discarded jobs left behind by terminated workers");
        }

        *self
            .shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = ExecutorState::Stopped;
        tracing::debug!("executor stopped");
    }

    /// Updates the scheduling hint for the worker threads.
    ///
    /// Takes effect immediately for idle workers (they are woken to apply it)
    /// and at the next idle point for workers currently mid-item — an
    /// in-flight item is never perturbed. Best-effort; see [`Priority`].
    pub fn change_priority(&self, priority: Priority) {
        self.shared.set_priority(priority);
        self.shared.queue.nudge();
        tracing::debug!(priority = priority.as_label(), "priority hint updated");
    }

    /// Registers a fault observer.
    ///
    /// Every work-item panic is delivered to every observer registered at the
    /// time of the fault; see [`Observe`] for the execution rules.
    pub fn on_fault(&self, observer: Arc<dyn Observe>) {
        self.shared
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ExecutorState {
        *self
            .shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Current scheduling hint.
    pub fn priority(&self) -> Priority {
        self.shared.priority()
    }

    /// Number of worker threads currently alive.
    ///
    /// Below [`worker_target`](Self::worker_target) while `Started` means the
    /// executor is degraded (a worker was lost to an internal fault).
    pub fn live_workers(&self) -> usize {
        self.shared.live.load(Ordering::Relaxed)
    }

    /// Configured number of worker threads.
    pub fn worker_target(&self) -> usize {
        self.config.worker_count()
    }

    /// Number of items currently queued (excluding the one(s) executing).
    pub fn pending(&self) -> usize {
        self.shared.queue.len()
    }
}

impl Drop for Executor {
    /// Deterministic teardown: equivalent to `stop(false)`, idempotent.
    fn drop(&mut self) {
        self.stop(false);
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("state", &self.state())
            .field("live_workers", &self.live_workers())
            .field("worker_target", &self.worker_target())
            .field("pending", &self.pending())
            .field("priority", &self.priority())
            .finish()
    }
}

/// The consume loop run by each worker thread.
///
/// Exits when the queue reports closed-and-drained, or when an observer
/// panics (the internal-fault case).
fn worker_loop(shared: &Shared, index: usize) {
    let mut applied = shared.priority();
    applied.apply_to_current();
    tracing::debug!(worker = index, "worker started");

    loop {
        // Idle housekeeping: re-apply the hint if it changed while this
        // worker was busy or parked.
        let hint = shared.priority();
        if hint != applied {
            hint.apply_to_current();
            applied = hint;
        }

        match shared.queue.next() {
            Dequeued::Job(job) => {
                if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
                    let fault = Fault::from_panic(index, payload);
                    if shared.notify_fault(&fault).is_err() {
                        break;
                    }
                }
            }
            Dequeued::Closed => break,
            Dequeued::Empty => {}
        }
    }
    tracing::debug!(worker = index, "worker exited");
}
