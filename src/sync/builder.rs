//! Builder for constructing a [`Synchronizer`](crate::Synchronizer).

use std::sync::Arc;

use crate::config::ExecutorConfig;
use crate::error::ExecutorError;
use crate::executor::Executor;
use crate::observers::Observe;
use crate::priority::Priority;
use crate::sync::provision::Provision;
use crate::sync::synchronizer::Synchronizer;

/// Builder for a [`Synchronizer`] with optional knobs.
///
/// Obtained via [`Synchronizer::builder`].
pub struct SynchronizerBuilder<T: 'static> {
    provision: Box<dyn Provision<T>>,
    priority: Priority,
    observers: Vec<Arc<dyn Observe>>,
    thread_name: String,
}

impl<T: 'static> SynchronizerBuilder<T> {
    /// Creates a new builder around a provisioning strategy.
    pub fn new(provision: impl Provision<T>) -> Self {
        Self {
            provision: Box::new(provision),
            priority: Priority::Normal,
            observers: Vec::new(),
            thread_name: "taskgate-sync".to_string(),
        }
    }

    /// Sets the initial scheduling hint for the worker thread.
    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Registers a fault observer on the internal executor.
    ///
    /// Observers see the panics of serialized actions (in addition to the
    /// per-call error the issuing caller receives).
    pub fn observer(mut self, observer: Arc<dyn Observe>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Sets the worker thread name.
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Builds the synchronizer and starts its worker.
    ///
    /// The internal executor is always configured with exactly one worker
    /// thread — that is what turns "submit work" into "serialize access".
    pub fn build(self) -> Result<Synchronizer<T>, ExecutorError> {
        let executor = Executor::new(ExecutorConfig {
            workers: 1,
            priority: self.priority,
            thread_name: self.thread_name,
        });
        for observer in self.observers {
            executor.on_fault(observer);
        }
        executor.start()?;
        Ok(Synchronizer::from_parts(executor, self.provision))
    }
}
