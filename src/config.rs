//! # Executor configuration.
//!
//! Provides [`ExecutorConfig`], the settings an [`Executor`](crate::Executor)
//! is built from.
//!
//! ## Sentinel values
//! - `workers = 0` → clamped to 1 (an executor always has at least one worker)

use crate::priority::Priority;

/// Configuration for an [`Executor`](crate::Executor).
///
/// ## Field semantics
/// - `workers`: number of worker threads spawned by `start()` (`0` = 1)
/// - `priority`: initial scheduling hint applied by each worker on entry
/// - `thread_name`: prefix for worker thread names (`<thread_name>-<index>`)
///
/// All fields are public for flexibility. Prefer [`worker_count`] over
/// reading `workers` directly to avoid sprinkling the sentinel clamp across
/// the codebase.
///
/// [`worker_count`]: ExecutorConfig::worker_count
#[derive(Clone, Debug)]
pub struct ExecutorConfig {
    /// Number of worker threads consuming the queue.
    ///
    /// More than one worker keeps FIFO *dequeue* order but gives up any
    /// guarantee on *completion* order. A
    /// [`Synchronizer`](crate::Synchronizer) always uses exactly one.
    pub workers: usize,

    /// Initial scheduling hint for worker threads.
    ///
    /// Advisory; see [`Priority`] for platform caveats.
    pub priority: Priority,

    /// Prefix for worker thread names.
    ///
    /// Helps telling executors apart in debuggers and thread dumps.
    pub thread_name: String,
}

impl ExecutorConfig {
    /// Returns the effective worker count (clamped to a minimum of 1).
    #[inline]
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.workers.max(1)
    }
}

impl Default for ExecutorConfig {
    /// Default configuration:
    ///
    /// - `workers = 1` (serialized consumption)
    /// - `priority = Priority::Normal`
    /// - `thread_name = "taskgate"`
    fn default() -> Self {
        Self {
            workers: 1,
            priority: Priority::Normal,
            thread_name: "taskgate".to_string(),
        }
    }
}
