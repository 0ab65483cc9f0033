//! # Advisory thread-scheduling hint.
//!
//! [`Priority`] is a small ordered hint mapped onto the platform's thread
//! priority primitive. It is best-effort by design: on most Unix systems,
//! raising a thread's priority requires elevated privileges, and a refusal by
//! the OS is logged at `debug` level and otherwise ignored.
//!
//! Workers apply the hint to themselves — at startup and again whenever they
//! are idle and notice the executor's hint has changed. A worker that is
//! mid-execution keeps its prior priority until it returns to the idle wait,
//! so an in-flight work item is never perturbed.

use thread_priority::{set_current_thread_priority, ThreadPriority, ThreadPriorityValue};

/// Scheduling hint for executor worker threads.
///
/// Three ordered levels: `BelowNormal < Normal < AboveNormal`.
///
/// # Example
/// ```
/// use taskgate::Priority;
///
/// assert!(Priority::BelowNormal < Priority::Normal);
/// assert!(Priority::Normal < Priority::AboveNormal);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Priority {
    /// Yield to other threads when the system is busy.
    BelowNormal,
    /// The platform default.
    #[default]
    Normal,
    /// Prefer this thread when the system is busy.
    ///
    /// Usually requires elevated privileges on Unix; silently degrades to
    /// the current priority when the OS refuses.
    AboveNormal,
}

impl Priority {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(self) -> &'static str {
        match self {
            Priority::BelowNormal => "below_normal",
            Priority::Normal => "normal",
            Priority::AboveNormal => "above_normal",
        }
    }

    /// Maps the hint onto the platform priority scale.
    fn as_native(self) -> ThreadPriority {
        match self {
            Priority::BelowNormal => ThreadPriority::Min,
            Priority::Normal => ThreadPriorityValue::try_from(50u8)
                .map_or(ThreadPriority::Min, ThreadPriority::Crossplatform),
            Priority::AboveNormal => ThreadPriority::Max,
        }
    }

    /// Applies the hint to the calling thread, best-effort.
    pub(crate) fn apply_to_current(self) {
        if let Err(e) = set_current_thread_priority(self.as_native()) {
            tracing::debug!(
                priority = self.as_label(),
                error = ?e,
                "could not apply thread priority hint"
            );
        }
    }

    /// Compact encoding for atomic storage.
    pub(crate) fn encode(self) -> u8 {
        match self {
            Priority::BelowNormal => 0,
            Priority::Normal => 1,
            Priority::AboveNormal => 2,
        }
    }

    /// Inverse of [`encode`](Priority::encode); unknown values read as `Normal`.
    pub(crate) fn decode(raw: u8) -> Self {
        match raw {
            0 => Priority::BelowNormal,
            2 => Priority::AboveNormal,
            _ => Priority::Normal,
        }
    }
}
