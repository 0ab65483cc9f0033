//! # LogWriter — fault-to-log sink.
//!
//! A minimal observer that forwards every fault to `tracing::error!`.
//! Use it when faults should land in the application log and nothing else
//! needs to react to them.
//!
//! ## Example output
//! ```text
//! ERROR taskgate: work item panicked seq=4 worker=0 info="boom"
//! ```

use crate::observers::fault::Fault;
use crate::observers::observe::Observe;

/// Fault observer that writes to the `tracing` log.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Constructs a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Observe for LogWriter {
    fn on_fault(&self, fault: &Fault) {
        tracing::error!(
            seq = fault.seq,
            worker = fault.worker,
            info = %fault.info,
            "work item panicked"
        );
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
