//! # Fault records delivered to observers.
//!
//! A [`Fault`] describes one work item that panicked on a worker thread. The
//! worker catches the panic, builds the record, and hands it to every
//! registered [`Observe`](crate::Observe) implementation; the worker then
//! moves on to the next item.
//!
//! ## Ordering
//! Each fault carries a globally unique sequence number (`seq`) that
//! increases monotonically across all executors in the process. Use `seq` to
//! restore order when faults from several observers are collated later.

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

/// Global sequence counter for fault ordering.
static FAULT_SEQ: AtomicU64 = AtomicU64::new(0);

/// A caught work-item panic.
///
/// Cheap to clone (`info` is a shared `Arc<str>`).
#[derive(Clone, Debug)]
pub struct Fault {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Index of the worker thread the item ran on.
    pub worker: usize,
    /// Text extracted from the panic payload.
    pub info: Arc<str>,
}

impl Fault {
    /// Creates a new fault record with the current timestamp and the next
    /// sequence number.
    pub fn new(worker: usize, info: impl Into<Arc<str>>) -> Self {
        Self {
            seq: FAULT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            worker,
            info: info.into(),
        }
    }

    /// Builds a fault from a caught panic payload.
    pub(crate) fn from_panic(worker: usize, payload: Box<dyn Any + Send>) -> Self {
        Self::new(worker, panic_text(payload.as_ref()))
    }

    /// Returns a human-readable one-line message.
    pub fn as_message(&self) -> String {
        format!("worker {} caught panic: {}", self.worker, self.info)
    }
}

/// Extracts a printable message from a panic payload.
///
/// Payloads raised via `panic!("...")` are `&'static str` or `String`;
/// anything else reads as "unknown panic".
pub(crate) fn panic_text(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_monotonic() {
        let a = Fault::new(0, "first");
        let b = Fault::new(0, "second");
        assert!(b.seq > a.seq);
    }

    #[test]
    fn message_includes_worker_and_info() {
        let fault = Fault::new(3, "boom");
        assert_eq!(fault.as_message(), "worker 3 caught panic: boom");
    }

    #[test]
    fn panic_text_handles_str_and_string() {
        let s: Box<dyn std::any::Any + Send> = Box::new("static text");
        assert_eq!(panic_text(s.as_ref()), "static text");

        let owned: Box<dyn std::any::Any + Send> = Box::new("owned".to_string());
        assert_eq!(panic_text(owned.as_ref()), "owned");

        let opaque: Box<dyn std::any::Any + Send> = Box::new(42u32);
        assert_eq!(panic_text(opaque.as_ref()), "unknown panic");
    }
}
