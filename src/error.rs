//! Error types used by the executor and the synchronizer.
//!
//! This module defines three error enums, split by producer:
//!
//! - [`ExecutorError`] — failures of the executor machinery itself.
//! - [`TaskError`] — failures raised by user-supplied actions.
//! - [`CallError`] — the per-call outcome of a synchronized call, combining
//!   both of the above with the rejection/abandonment cases.
//!
//! All types provide `as_label()` for stable snake_case identifiers in
//! logs/metrics.

use thiserror::Error;

/// # Errors produced by the executor machinery.
///
/// These represent failures of the queue/worker plumbing, not of the work
/// items themselves (work-item faults travel through the fault observers,
/// see [`Observe`](crate::Observe)).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ExecutorError {
    /// The executor is stopping or stopped and no longer accepts work.
    ///
    /// Submission after shutdown is not fatal by design; blocking entry
    /// points surface it as this error so callers are never left waiting
    /// on a completion that cannot happen.
    #[error("executor is not accepting work (stopping or stopped)")]
    Rejected,

    /// A submitted item was discarded, or died, before signalling completion.
    ///
    /// Seen by waiting callers when a degraded executor (one that lost its
    /// workers to internal faults) is shut down with items still queued, or
    /// when the item itself panicked before releasing its completion signal.
    #[error("work item was abandoned before signalling completion")]
    Abandoned,

    /// A worker thread could not be spawned.
    ///
    /// The executor may be left running below its configured thread count;
    /// compare [`live_workers`](crate::Executor::live_workers) against
    /// [`worker_target`](crate::Executor::worker_target).
    #[error("failed to spawn worker thread: {source}")]
    Spawn {
        /// The underlying OS error.
        #[from]
        source: std::io::Error,
    },
}

impl ExecutorError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use taskgate::ExecutorError;
    ///
    /// assert_eq!(ExecutorError::Rejected.as_label(), "executor_rejected");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ExecutorError::Rejected => "executor_rejected",
            ExecutorError::Abandoned => "executor_abandoned",
            ExecutorError::Spawn { .. } => "executor_spawn_failed",
        }
    }
}

/// # Errors produced by user actions.
///
/// An action handed to [`synchronize`](crate::Synchronizer::synchronize) or
/// [`synchronize_async`](crate::Synchronizer::synchronize_async) fails either
/// by returning [`TaskError::Fail`] or by panicking on the worker thread, in
/// which case the panic is caught and reported as [`TaskError::Panic`].
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TaskError {
    /// The action reported a failure.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The action (or the provisioning strategy) panicked while running.
    #[error("panicked while executing: {info}")]
    Panic {
        /// Text extracted from the panic payload.
        info: String,
    },
}

impl TaskError {
    /// Creates a [`TaskError::Fail`] from any displayable error.
    ///
    /// # Example
    /// ```
    /// use taskgate::TaskError;
    ///
    /// let err = TaskError::fail("connection refused");
    /// assert_eq!(err.to_string(), "execution failed: connection refused");
    /// ```
    pub fn fail(error: impl std::fmt::Display) -> Self {
        TaskError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Panic { .. } => "task_panicked",
        }
    }

    /// Whether this fault came from a caught panic rather than a returned error.
    pub fn is_panic(&self) -> bool {
        matches!(self, TaskError::Panic { .. })
    }
}

/// # Per-call outcome of a synchronized call.
///
/// Every call through a [`Synchronizer`](crate::Synchronizer) carries its own
/// completion channel; the fault (if any) is delivered to exactly the caller
/// that issued the failing action. Both the blocking and the awaitable call
/// shapes report faults the same way.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum CallError {
    /// The synchronizer is shut down; the call was never enqueued.
    #[error("call was rejected: synchronizer is shut down")]
    Rejected,

    /// The call was dropped before a result could be delivered.
    #[error("call was abandoned before a result was delivered")]
    Abandoned,

    /// The action itself failed or panicked.
    #[error(transparent)]
    Task(#[from] TaskError),
}

impl CallError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            CallError::Rejected => "call_rejected",
            CallError::Abandoned => "call_abandoned",
            CallError::Task(e) => e.as_label(),
        }
    }

    /// Whether the failure originated in the user action (as opposed to the
    /// call plumbing).
    pub fn is_task(&self) -> bool {
        matches!(self, CallError::Task(_))
    }
}
