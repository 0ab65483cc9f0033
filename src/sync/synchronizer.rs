//! # Synchronizer: exactly-once-at-a-time access to a resource.
//!
//! [`Synchronizer<T>`] wraps a resource of type `T` — typically something
//! that is not `Sync`, or not safe to touch from more than one thread — and
//! funnels every access through a private single-worker
//! [`Executor`](crate::Executor). The single worker is the whole mechanism:
//! calls both start *and* finish in submission order, a total order over all
//! calls to one synchronizer, and the resource is only ever touched by that
//! one thread.
//!
//! ## Architecture
//! ```text
//! Callers (any thread / any task):
//!   synchronize(f) ───────┐                        ┌───────────────────────┐
//!   synchronize(f) ───────┼──► Executor (1 worker) │ acquire resource      │
//!   synchronize_async(f) ─┘        FIFO queue  ──► │ f(&mut resource)      │
//!        │                                         │ release resource      │
//!        │   per-call outcome channel              └──────────┬────────────┘
//!        ◄─────────────────────────────────────────────────────┘
//!              Ok(value) | Err(CallError)
//! ```
//!
//! ## Rules
//! - **Total order**: calls run one at a time, in submission order.
//! - **Per-call outcomes**: every call owns its completion channel; a fault
//!   raised by call A can never be attributed to call B. Both the blocking
//!   and the awaitable shape report faults the same way, as typed `Err`
//!   values.
//! - **No reference smuggling**: the `&mut T` handed to an action is only
//!   valid inside it; under scoped provisioning the instance is gone by the
//!   time the call returns.
//! - **No per-call cancellation**: dropping an un-awaited future does not
//!   unqueue the action; the only cancellation granularity is
//!   [`stop`](Synchronizer::stop)/[`dispose`](Synchronizer::dispose).
//!
//! ## Example
//! ```
//! use taskgate::Synchronizer;
//!
//! // `Vec` stands in for an interior-mutable, non-Sync resource.
//! let gate = Synchronizer::new(Vec::<u32>::new())?;
//!
//! gate.synchronize(|v| {
//!     v.push(21);
//!     Ok(v.iter().sum::<u32>() * 2)
//! })
//! .map(|doubled| assert_eq!(doubled, 42))?;
//!
//! gate.dispose();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::panic::{self, AssertUnwindSafe};
use std::sync::{mpsc, Arc, Mutex, PoisonError};

use tokio::sync::oneshot;

use crate::error::{CallError, ExecutorError, TaskError};
use crate::executor::Executor;
use crate::observers::panic_text;
use crate::priority::Priority;
use crate::sync::builder::SynchronizerBuilder;
use crate::sync::provision::{Persistent, Provision, Scoped};

/// The provisioning strategy, shared with the worker thread.
///
/// `None` once disposed.
type SharedProvision<T> = Arc<Mutex<Option<Box<dyn Provision<T>>>>>;

/// Serialized access to a single resource of type `T`.
///
/// See the [module docs](self) for the execution rules. Construct with
/// [`new`](Synchronizer::new) (persistent resource),
/// [`scoped`](Synchronizer::scoped) (fresh instance per call) or
/// [`builder`](Synchronizer::builder) (full control).
pub struct Synchronizer<T: 'static> {
    executor: Executor,
    provision: SharedProvision<T>,
}

impl<T: 'static> Synchronizer<T> {
    /// Wraps one long-lived resource instance.
    ///
    /// The instance moves to the synchronizer (and is only touched by the
    /// worker thread from then on — hence `T: Send`, but deliberately not
    /// `T: Sync`). It is dropped at [`dispose`](Synchronizer::dispose).
    pub fn new(resource: T) -> Result<Self, ExecutorError>
    where
        T: Send,
    {
        SynchronizerBuilder::new(Persistent::new(resource)).build()
    }

    /// Manufactures a fresh resource instance per call.
    ///
    /// The factory runs on the worker thread, so `T` never crosses threads
    /// at all.
    pub fn scoped<F>(make: F) -> Result<Self, ExecutorError>
    where
        F: FnMut() -> T + Send + 'static,
    {
        SynchronizerBuilder::new(Scoped::new(make)).build()
    }

    /// Returns a builder for full control over provisioning, priority,
    /// observers, and thread naming.
    pub fn builder(provision: impl Provision<T>) -> SynchronizerBuilder<T> {
        SynchronizerBuilder::new(provision)
    }

    pub(crate) fn from_parts(executor: Executor, provision: Box<dyn Provision<T>>) -> Self {
        Self {
            executor,
            provision: Arc::new(Mutex::new(Some(provision))),
        }
    }

    /// Runs `action` against the resource on the worker thread, blocking the
    /// caller until it finishes.
    ///
    /// The action receives exclusive access to the resource and returns
    /// either a value (sent back to this caller) or a [`TaskError`]. A panic
    /// inside the action is caught and surfaces as
    /// [`TaskError::Panic`] — the worker, and the synchronizer, survive it.
    ///
    /// Blocks the calling thread; from async code use
    /// [`synchronize_async`](Synchronizer::synchronize_async) instead. Must
    /// not be called from inside another action on the same synchronizer
    /// (single worker — that deadlocks).
    pub fn synchronize<R, F>(&self, action: F) -> Result<R, CallError>
    where
        F: FnOnce(&mut T) -> Result<R, TaskError> + Send + 'static,
        R: Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<Result<R, CallError>>();
        let provision = Arc::clone(&self.provision);
        let accepted = self.executor.submit(move || {
            run_and_send(&provision, action, |outcome| {
                let _ = tx.send(outcome);
            });
        });
        if !accepted {
            return Err(CallError::Rejected);
        }
        match rx.recv() {
            Ok(outcome) => outcome,
            Err(_) => Err(CallError::Abandoned),
        }
    }

    /// Awaitable form of [`synchronize`](Synchronizer::synchronize): same
    /// enqueue-and-serialize mechanics, same per-call fault delivery, but the
    /// caller suspends instead of blocking a thread.
    ///
    /// The action itself still runs (synchronously) on the worker thread;
    /// only the completion wait is asynchronous.
    pub async fn synchronize_async<R, F>(&self, action: F) -> Result<R, CallError>
    where
        F: FnOnce(&mut T) -> Result<R, TaskError> + Send + 'static,
        R: Send + 'static,
    {
        let (tx, rx) = oneshot::channel::<Result<R, CallError>>();
        let provision = Arc::clone(&self.provision);
        let accepted = self.executor.submit(move || {
            run_and_send(&provision, action, |outcome| {
                let _ = tx.send(outcome);
            });
        });
        if !accepted {
            return Err(CallError::Rejected);
        }
        match rx.await {
            Ok(outcome) => outcome,
            Err(_) => Err(CallError::Abandoned),
        }
    }

    /// Updates the worker's scheduling hint; see
    /// [`Executor::change_priority`].
    pub fn change_priority(&self, priority: Priority) {
        self.executor.change_priority(priority);
    }

    /// Stops the internal executor; see [`Executor::stop`].
    ///
    /// The resource itself stays alive until
    /// [`dispose`](Synchronizer::dispose).
    pub fn stop(&self, drain: bool) {
        self.executor.stop(drain);
    }

    /// The internal executor, for state/priority introspection.
    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Tears the synchronizer down: stops the worker (finishing queued
    /// calls first) and drops the provisioning strategy — under persistent
    /// provisioning this is where the resource is destroyed.
    ///
    /// Idempotent; later calls return [`CallError::Rejected`]. Also invoked
    /// by `Drop`, but calling it explicitly is the sanctioned teardown path
    /// (it makes the destruction point deterministic and visible).
    pub fn dispose(&self) {
        self.executor.stop(false);
        let strategy = self
            .provision
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if strategy.is_some() {
            tracing::debug!("synchronizer disposed");
        }
        drop(strategy);
    }
}

impl<T: 'static> Drop for Synchronizer<T> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<T: 'static> std::fmt::Debug for Synchronizer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Synchronizer")
            .field("executor", &self.executor)
            .finish_non_exhaustive()
    }
}

/// Runs one serialized call on the worker thread and delivers its outcome.
///
/// A panic outcome is re-raised after delivery so the executor's fault
/// observers see it too; the worker's per-item guard absorbs it.
fn run_and_send<T, R, F, S>(
    provision: &Mutex<Option<Box<dyn Provision<T>>>>,
    action: F,
    send: S,
) where
    T: 'static,
    F: FnOnce(&mut T) -> Result<R, TaskError>,
    S: FnOnce(Result<R, CallError>),
{
    let outcome = run_serialized(provision, action);
    let repanic = match &outcome {
        Err(CallError::Task(TaskError::Panic { info })) => Some(info.clone()),
        _ => None,
    };
    send(outcome);
    if let Some(info) = repanic {
        panic::panic_any(info);
    }
}

/// One serialized call: acquire the resource, run the action, release the
/// resource — the release happens no matter how the action ended.
fn run_serialized<T, R, F>(
    provision: &Mutex<Option<Box<dyn Provision<T>>>>,
    action: F,
) -> Result<R, CallError>
where
    T: 'static,
    F: FnOnce(&mut T) -> Result<R, TaskError>,
{
    let mut resource = {
        let mut guard = provision.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(strategy) = guard.as_mut() else {
            return Err(CallError::Rejected);
        };
        match panic::catch_unwind(AssertUnwindSafe(|| strategy.acquire())) {
            Ok(resource) => resource,
            Err(payload) => {
                let info = panic_text(payload.as_ref());
                tracing::warn!(%info, "resource acquisition panicked");
                return Err(TaskError::Panic { info }.into());
            }
        }
    };

    // The strategy lock is NOT held while the action runs.
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| action(&mut resource)));

    {
        let mut guard = provision.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(strategy) = guard.as_mut() {
            if let Err(payload) =
                panic::catch_unwind(AssertUnwindSafe(|| strategy.release(resource)))
            {
                let info = panic_text(payload.as_ref());
                tracing::warn!(%info, "resource release panicked");
                return Err(TaskError::Panic { info }.into());
            }
        }
    }

    match outcome {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(error)) => {
            tracing::debug!(error = %error, "synchronized action failed");
            Err(CallError::Task(error))
        }
        Err(payload) => {
            let info = panic_text(payload.as_ref());
            tracing::warn!(%info, "synchronized action panicked");
            Err(TaskError::Panic { info }.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observers::{Fault, Observe};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    struct Counter {
        value: usize,
    }

    #[test]
    fn blocking_call_returns_value() {
        let gate = Synchronizer::new(Counter { value: 40 }).unwrap();
        let seen = gate.synchronize(|c| Ok(c.value + 2)).unwrap();
        assert_eq!(seen, 42);
        gate.dispose();
    }

    #[test]
    fn concurrent_increments_lose_nothing() {
        const CALLERS: usize = 50;
        const CALLS_EACH: usize = 100;

        let gate = Arc::new(Synchronizer::new(Counter { value: 0 }).unwrap());
        let mut handles = Vec::new();
        for _ in 0..CALLERS {
            let gate = Arc::clone(&gate);
            handles.push(thread::spawn(move || {
                for _ in 0..CALLS_EACH {
                    gate.synchronize(|c| {
                        c.value += 1;
                        Ok(())
                    })
                    .unwrap();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let total = gate.synchronize(|c| Ok(c.value)).unwrap();
        assert_eq!(total, CALLERS * CALLS_EACH);
        gate.dispose();
    }

    #[test]
    fn blocking_call_reports_action_failure() {
        let gate = Synchronizer::new(Counter { value: 0 }).unwrap();
        let err = gate
            .synchronize(|_: &mut Counter| -> Result<(), TaskError> {
                Err(TaskError::fail("boom"))
            })
            .unwrap_err();
        assert!(matches!(
            &err,
            CallError::Task(TaskError::Fail { error }) if error == "boom"
        ));
        gate.dispose();
    }

    #[tokio::test]
    async fn async_call_returns_value() {
        let gate = Synchronizer::new(Counter { value: 0 }).unwrap();
        let seen = gate
            .synchronize_async(|c| {
                c.value += 42;
                Ok(c.value)
            })
            .await
            .unwrap();
        assert_eq!(seen, 42);
        gate.dispose();
    }

    #[tokio::test]
    async fn async_call_reports_action_failure() {
        let gate = Synchronizer::new(Counter { value: 0 }).unwrap();
        let err = gate
            .synchronize_async(|_: &mut Counter| -> Result<(), TaskError> {
                Err(TaskError::fail("boom"))
            })
            .await
            .unwrap_err();
        assert!(matches!(
            &err,
            CallError::Task(TaskError::Fail { error }) if error == "boom"
        ));
        gate.dispose();
    }

    #[test]
    fn panicking_action_is_caught_and_synchronizer_survives() {
        let gate = Synchronizer::new(Counter { value: 7 }).unwrap();
        let err = gate
            .synchronize(|_: &mut Counter| -> Result<(), TaskError> {
                panic!("kaboom");
            })
            .unwrap_err();
        assert!(matches!(
            &err,
            CallError::Task(TaskError::Panic { info }) if info.contains("kaboom")
        ));

        // The resource was released and the worker is still serving.
        let seen = gate.synchronize(|c| Ok(c.value)).unwrap();
        assert_eq!(seen, 7);
        gate.dispose();
    }

    struct CountingObserver {
        hits: AtomicUsize,
    }

    impl Observe for CountingObserver {
        fn on_fault(&self, _fault: &Fault) {
            self.hits.fetch_add(1, Ordering::SeqCst);
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    #[test]
    fn action_panic_also_reaches_fault_observers() {
        let observer = Arc::new(CountingObserver {
            hits: AtomicUsize::new(0),
        });
        let gate = Synchronizer::builder(Persistent::new(Counter { value: 0 }))
            .observer(Arc::clone(&observer) as Arc<dyn Observe>)
            .build()
            .unwrap();

        let _ = gate.synchronize(|_: &mut Counter| -> Result<(), TaskError> {
            panic!("observed");
        });
        // A follow-up call serializes behind the fault handling.
        gate.synchronize(|_| Ok(())).unwrap();

        assert_eq!(observer.hits.load(Ordering::SeqCst), 1);
        gate.dispose();
    }

    #[test]
    fn scoped_calls_never_share_an_instance() {
        struct Probe {
            id: usize,
            log: Arc<Mutex<Vec<String>>>,
        }

        impl Drop for Probe {
            fn drop(&mut self) {
                self.log.lock().unwrap().push(format!("drop-{}", self.id));
            }
        }

        let log = Arc::new(Mutex::new(Vec::new()));
        let ids = Arc::new(AtomicUsize::new(0));

        let gate = {
            let log = Arc::clone(&log);
            let ids = Arc::clone(&ids);
            Synchronizer::scoped(move || {
                let id = ids.fetch_add(1, Ordering::SeqCst) + 1;
                log.lock().unwrap().push(format!("make-{id}"));
                Probe {
                    id,
                    log: Arc::clone(&log),
                }
            })
            .unwrap()
        };

        for _ in 0..2 {
            gate.synchronize(|p: &mut Probe| {
                p.log.lock().unwrap().push(format!("use-{}", p.id));
                Ok(())
            })
            .unwrap();
        }
        gate.dispose();

        // The first instance is torn down before the second exists.
        let seen = log.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec!["make-1", "use-1", "drop-1", "make-2", "use-2", "drop-2"]
        );
    }

    #[test]
    fn persistent_calls_share_one_instance() {
        let gate = Synchronizer::new(Counter { value: 0 }).unwrap();
        for _ in 0..10 {
            gate.synchronize(|c| {
                c.value += 1;
                Ok(())
            })
            .unwrap();
        }
        assert_eq!(gate.synchronize(|c| Ok(c.value)).unwrap(), 10);
        gate.dispose();
    }

    #[test]
    fn dispose_tears_down_persistent_resource() {
        struct DropFlag {
            dropped: Arc<AtomicUsize>,
        }

        impl Drop for DropFlag {
            fn drop(&mut self) {
                self.dropped.fetch_add(1, Ordering::SeqCst);
            }
        }

        let dropped = Arc::new(AtomicUsize::new(0));
        let gate = Synchronizer::new(DropFlag {
            dropped: Arc::clone(&dropped),
        })
        .unwrap();

        gate.synchronize(|_| Ok(())).unwrap();
        assert_eq!(dropped.load(Ordering::SeqCst), 0);

        gate.dispose();
        assert_eq!(dropped.load(Ordering::SeqCst), 1);

        // Idempotent: no double-teardown, later calls are rejected.
        gate.dispose();
        assert_eq!(dropped.load(Ordering::SeqCst), 1);
        assert!(matches!(
            gate.synchronize(|_| Ok(())),
            Err(CallError::Rejected)
        ));
    }

    #[test]
    fn stop_rejects_calls_but_keeps_resource() {
        let gate = Synchronizer::new(Counter { value: 3 }).unwrap();
        gate.stop(true);
        assert!(matches!(
            gate.synchronize(|c: &mut Counter| Ok(c.value)),
            Err(CallError::Rejected)
        ));
        gate.dispose();
    }

    #[tokio::test]
    async fn mixed_blocking_and_async_calls_serialize() {
        let gate = Arc::new(Synchronizer::new(Counter { value: 0 }).unwrap());

        let blocking = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || {
                for _ in 0..100 {
                    gate.synchronize(|c| {
                        c.value += 1;
                        Ok(())
                    })
                    .unwrap();
                }
            })
        };
        for _ in 0..100 {
            gate.synchronize_async(|c| {
                c.value += 1;
                Ok(())
            })
            .await
            .unwrap();
        }
        blocking.join().unwrap();

        assert_eq!(gate.synchronize_async(|c| Ok(c.value)).await.unwrap(), 200);
        gate.dispose();
    }
}
