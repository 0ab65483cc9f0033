//! # Ticker — periodic async runner.
//!
//! [`Ticker`] re-invokes a callback on a fixed interval until cancelled:
//!
//! ```text
//! spawn ──► [sleep once unless immediate] ──► loop {
//!               tick().await
//!               select! { cancelled ─► exit, sleep(every) ─► continue }
//!           }
//! ```
//!
//! ## Rules
//! - A tick that is already running is never interrupted; cancellation is
//!   honored at the sleeps between ticks.
//! - Ticks run sequentially on the runtime; a slow tick delays the next one
//!   (interval measured from tick end, not tick start).
//! - No coordination with [`Executor`](crate::Executor) or
//!   [`Synchronizer`](crate::Synchronizer); pair them by calling one from the
//!   tick callback if needed.
//!
//! ## Example
//! ```no_run
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! use std::time::Duration;
//! use taskgate::Ticker;
//!
//! let ticker = Ticker::spawn(Duration::from_secs(30), true, || async {
//!     // poll something, flush something, ...
//! });
//!
//! // ... later:
//! ticker.stop().await;
//! # }
//! ```

use std::future::Future;
use std::time::Duration;

use tokio::select;
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;

/// Handle to a periodic background task.
///
/// Dropping the handle does **not** stop the loop; call
/// [`stop`](Ticker::stop) (or at least [`cancel`](Ticker::cancel)) for a
/// deterministic shutdown.
pub struct Ticker {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl Ticker {
    /// Spawns the periodic loop onto the current tokio runtime.
    ///
    /// With `immediate = true` the first tick runs right away; otherwise the
    /// loop sleeps one full interval first.
    pub fn spawn<F, Fut>(every: Duration, immediate: bool, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let child = token.clone();
        let handle = tokio::spawn(async move {
            if !immediate {
                select! {
                    _ = child.cancelled() => return,
                    _ = time::sleep(every) => {}
                }
            }
            loop {
                if child.is_cancelled() {
                    break;
                }
                tick().await;
                select! {
                    _ = child.cancelled() => break,
                    _ = time::sleep(every) => {}
                }
            }
            tracing::debug!("ticker exited");
        });
        Self { token, handle }
    }

    /// Requests the loop to stop without waiting for it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Cancels the loop and waits for it to exit.
    ///
    /// A tick in progress finishes first.
    pub async fn stop(self) {
        self.token.cancel();
        let _ = self.handle.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn immediate_tick_runs_before_first_interval() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let ticker = Ticker::spawn(Duration::from_secs(3600), true, move || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
            }
        });

        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        ticker.stop().await;
    }

    #[tokio::test]
    async fn delayed_start_waits_one_interval() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let ticker = Ticker::spawn(Duration::from_secs(3600), false, move || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
            }
        });

        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        ticker.stop().await;
    }

    #[tokio::test]
    async fn ticks_repeat_until_cancelled() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let ticker = Ticker::spawn(Duration::from_millis(10), true, move || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
            }
        });

        time::sleep(Duration::from_millis(200)).await;
        ticker.stop().await;
        let seen = count.load(Ordering::SeqCst);
        assert!(seen >= 3, "expected repeated ticks, saw {seen}");

        // No more ticks after stop.
        let frozen = count.load(Ordering::SeqCst);
        time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), frozen);
    }
}
