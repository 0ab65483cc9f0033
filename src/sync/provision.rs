//! # Resource-provisioning strategies.
//!
//! A [`Synchronizer`](crate::Synchronizer) does not manage its resource's
//! lifetime itself — it asks an injected [`Provision`] strategy for an
//! instance before each serialized call and hands it back afterwards.
//!
//! Two strategies ship with the crate:
//! - [`Persistent`] — one long-lived instance, checked out per call and
//!   checked back in, torn down when the synchronizer is disposed.
//! - [`Scoped`] — a fresh instance manufactured per call and dropped as soon
//!   as the call ends, so no call ever observes another call's instance.
//!
//! [`ProvisionFn`] adapts a plain pair of acquire/release closures.

/// Strategy deciding how the guarded resource is produced for each call.
///
/// `acquire` runs on the worker thread right before the user action,
/// `release` right after it — even when the action fails or panics. The
/// synchronizer never holds the strategy locked while the action runs, and
/// never runs two calls at once, so implementations see a strict
/// acquire/release alternation.
pub trait Provision<T>: Send + 'static {
    /// Produces the resource handed to the next serialized call.
    fn acquire(&mut self) -> T;

    /// Takes the resource back after the call completes.
    ///
    /// The default drops it.
    fn release(&mut self, resource: T) {
        drop(resource);
    }
}

/// One long-lived resource instance for the synchronizer's whole lifetime.
///
/// The instance is created by the caller, moved in once, and dropped when the
/// owning synchronizer is disposed.
pub struct Persistent<T> {
    slot: Option<T>,
}

impl<T> Persistent<T> {
    /// Wraps an existing instance.
    pub fn new(resource: T) -> Self {
        Self {
            slot: Some(resource),
        }
    }
}

impl<T: Send + 'static> Provision<T> for Persistent<T> {
    /// Checks the instance out.
    ///
    /// # Panics
    /// Panics if the instance is currently checked out. Serialized calls
    /// alternate acquire/release strictly, so this only fires when the
    /// strategy is driven by hand.
    fn acquire(&mut self) -> T {
        match self.slot.take() {
            Some(resource) => resource,
            None => panic!("persistent resource is already checked out"),
        }
    }

    fn release(&mut self, resource: T) {
        self.slot = Some(resource);
    }
}

/// A fresh resource instance per call.
///
/// `acquire` runs the factory; `release` drops the instance. The factory runs
/// on the worker thread, so `T` itself never crosses threads.
pub struct Scoped<F> {
    make: F,
}

impl<F> Scoped<F> {
    /// Wraps a factory producing one instance per call.
    pub fn new(make: F) -> Self {
        Self { make }
    }
}

impl<T, F> Provision<T> for Scoped<F>
where
    F: FnMut() -> T + Send + 'static,
{
    fn acquire(&mut self) -> T {
        (self.make)()
    }
}

/// Function-backed strategy: an injected acquire/release closure pair.
///
/// # Example
/// ```
/// use taskgate::ProvisionFn;
///
/// // Lease connections from some pool instead of building them fresh.
/// let strategy = ProvisionFn::new(
///     || String::from("connection"),
///     |conn: String| { /* return to pool */ drop(conn); },
/// );
/// # let _ = strategy;
/// ```
pub struct ProvisionFn<A, R> {
    acquire: A,
    release: R,
}

impl<A, R> ProvisionFn<A, R> {
    /// Wraps an acquire/release pair.
    pub fn new(acquire: A, release: R) -> Self {
        Self { acquire, release }
    }
}

impl<T, A, R> Provision<T> for ProvisionFn<A, R>
where
    A: FnMut() -> T + Send + 'static,
    R: FnMut(T) + Send + 'static,
{
    fn acquire(&mut self) -> T {
        (self.acquire)()
    }

    fn release(&mut self, resource: T) {
        (self.release)(resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn persistent_checks_out_and_back_in() {
        let mut strategy = Persistent::new(7u32);
        let resource = strategy.acquire();
        assert_eq!(resource, 7);
        strategy.release(resource + 1);
        assert_eq!(strategy.acquire(), 8);
    }

    #[test]
    #[should_panic(expected = "already checked out")]
    fn persistent_double_acquire_panics() {
        let mut strategy = Persistent::new(0u32);
        let _held = strategy.acquire();
        let _ = strategy.acquire();
    }

    #[test]
    fn scoped_manufactures_fresh_instances() {
        let built = Arc::new(AtomicUsize::new(0));
        let b = Arc::clone(&built);
        let mut strategy = Scoped::new(move || b.fetch_add(1, Ordering::SeqCst));
        let first = strategy.acquire();
        strategy.release(first);
        let second = strategy.acquire();
        assert_ne!(first, second);
        assert_eq!(built.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn provision_fn_invokes_both_halves() {
        let acquired = Arc::new(AtomicUsize::new(0));
        let released = Arc::new(AtomicUsize::new(0));
        let a = Arc::clone(&acquired);
        let r = Arc::clone(&released);
        let mut strategy = ProvisionFn::new(
            move || a.fetch_add(1, Ordering::SeqCst),
            move |_n| {
                r.fetch_add(1, Ordering::SeqCst);
            },
        );
        let resource = strategy.acquire();
        strategy.release(resource);
        assert_eq!(acquired.load(Ordering::SeqCst), 1);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }
}
