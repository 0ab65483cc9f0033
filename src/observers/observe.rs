//! # Fault observer trait.
//!
//! Provides [`Observe`], the extension point for plugging fault handlers into
//! an [`Executor`](crate::Executor).
//!
//! ## Rules
//! - Observers run **on the worker thread** that caught the fault, after the
//!   failing item and before the next one. Keep them fast.
//! - Observer calls for one worker are sequential; two workers may invoke the
//!   same observer concurrently, so implementations must be `Sync`.
//! - An observer that panics terminates the worker it runs on — this is the
//!   one internal fault the executor does not absorb. Handle errors inside
//!   the observer; do not panic.

use crate::observers::fault::Fault;

/// Receiver for work-item faults.
///
/// Register with [`Executor::on_fault`](crate::Executor::on_fault) or
/// [`SynchronizerBuilder::observer`](crate::SynchronizerBuilder::observer).
///
/// # Example
/// ```
/// use taskgate::{Fault, Observe};
///
/// struct Metrics;
///
/// impl Observe for Metrics {
///     fn on_fault(&self, fault: &Fault) {
///         // bump a counter, page someone, ...
///         let _ = fault.seq;
///     }
///
///     fn name(&self) -> &'static str { "metrics" }
/// }
/// ```
pub trait Observe: Send + Sync + 'static {
    /// Handles a single caught fault.
    ///
    /// Called on the worker thread; must not panic (see module rules).
    fn on_fault(&self, fault: &Fault);

    /// Returns the observer name used in logs.
    ///
    /// Prefer short, descriptive names (e.g., "metrics", "audit"). The
    /// default uses `type_name::<Self>()`, which can be verbose — override it
    /// when possible.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
