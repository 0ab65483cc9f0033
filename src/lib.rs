//! # taskgate
//!
//! **Taskgate** is a task-affinity execution library for Rust.
//!
//! It provides two layered primitives: a worker-thread FIFO [`Executor`] and,
//! built on top of it, a [`Synchronizer`] that guarantees
//! exactly-once-at-a-time access to a caller-supplied, possibly
//! non-thread-safe resource — with both blocking and awaitable call styles,
//! lifecycle control, and per-call fault delivery.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   callers (any thread / any async task)
//!     │ synchronize(f)          │ synchronize_async(f)
//!     ▼                         ▼
//! ┌───────────────────────────────────────────────────────────┐
//! │  Synchronizer<T>                                          │
//! │  - Provision strategy (persistent | scoped | custom)      │
//! │  - per-call outcome channels (value or typed fault)       │
//! └───────────────────────────┬───────────────────────────────┘
//!                             ▼
//! ┌───────────────────────────────────────────────────────────┐
//! │  Executor (1 worker)                                      │
//! │  - FIFO job queue (closable, drains on stop)              │
//! │  - lifecycle: NotStarted → Started → Stopping → Stopped   │
//! │  - fault observers (Observe), priority hint (Priority)    │
//! └───────────────────────────┬───────────────────────────────┘
//!                             ▼
//!                     one OS worker thread
//!              acquire → f(&mut resource) → release
//! ```
//!
//! The executor stands on its own, too: configure several workers and it is a
//! plain fixed-size worker pool with FIFO dispatch and panic isolation.
//!
//! ### Serialization guarantee
//! A synchronizer's executor always has exactly one worker. Calls therefore
//! start *and* finish in submission order — a total order — and the wrapped
//! resource is only ever touched by that worker thread. That is the entire
//! locking story: the resource needs no lock of its own and does not need to
//! be `Sync`.
//!
//! ## Features
//! | Area            | Description                                          | Key types                                  |
//! |-----------------|------------------------------------------------------|--------------------------------------------|
//! | **Execution**   | FIFO worker pool with drain-aware shutdown.          | [`Executor`], [`ExecutorConfig`], [`ExecutorState`] |
//! | **Serialization** | One-at-a-time access to a wrapped resource.        | [`Synchronizer`], [`SynchronizerBuilder`]  |
//! | **Provisioning**| Resource lifetime strategies, injectable.            | [`Provision`], [`Persistent`], [`Scoped`], [`ProvisionFn`] |
//! | **Faults**      | Typed per-call outcomes plus out-of-band observers.  | [`CallError`], [`TaskError`], [`Observe`], [`Fault`], [`LogWriter`] |
//! | **Scheduling hint** | Best-effort worker thread priority.              | [`Priority`]                               |
//! | **Periodic**    | Interval re-invocation with cancellation (`ticker` feature). | [`Ticker`]                          |
//!
//! ## Example
//! ```
//! use taskgate::{Synchronizer, TaskError};
//!
//! // Anything that must not be touched by two threads at once; a `Vec`
//! // stands in for a connection, a parser state machine, an FFI handle...
//! let gate = Synchronizer::new(Vec::<i64>::new())?;
//!
//! // Blocking style: runs on the worker, caller waits for the outcome.
//! gate.synchronize(|v| {
//!     v.push(1);
//!     Ok(())
//! })?;
//!
//! // Failures come back typed, to exactly the caller that issued them.
//! let err = gate
//!     .synchronize(|_| -> Result<(), TaskError> { Err(TaskError::fail("boom")) })
//!     .unwrap_err();
//! assert_eq!(err.to_string(), "execution failed: boom");
//!
//! gate.dispose();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Awaitable style, same serialization, same fault contract:
//! ```
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use taskgate::Synchronizer;
//!
//! let gate = Synchronizer::new(0u64)?;
//! let value = gate.synchronize_async(|n| { *n += 42; Ok(*n) }).await?;
//! assert_eq!(value, 42);
//! gate.dispose();
//! # Ok(())
//! # }
//! ```
//!
//! ## Optional features
//! - `ticker` *(default)*: the [`Ticker`] periodic runner (pulls in the tokio
//!   runtime and `tokio-util`).

mod config;
mod error;
mod executor;
mod observers;
mod priority;
mod sync;

// ---- Public re-exports ----

pub use config::ExecutorConfig;
pub use error::{CallError, ExecutorError, TaskError};
pub use executor::{Executor, ExecutorState};
pub use observers::{Fault, LogWriter, Observe};
pub use priority::Priority;
pub use sync::{Persistent, Provision, ProvisionFn, Scoped, Synchronizer, SynchronizerBuilder};

// Optional: periodic runner.
// Enable with: `--features ticker` (on by default)
#[cfg(feature = "ticker")]
mod ticker;
#[cfg(feature = "ticker")]
pub use ticker::Ticker;
