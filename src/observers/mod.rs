//! Out-of-band fault delivery: observer trait, fault records, built-in sinks.

mod fault;
mod log;
mod observe;

pub use fault::Fault;
pub(crate) use fault::panic_text;
pub use log::LogWriter;
pub use observe::Observe;
