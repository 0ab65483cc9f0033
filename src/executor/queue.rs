//! # FIFO job queue shared between producers and workers.
//!
//! A `Mutex<VecDeque>` guarded by a `Condvar`. Closing the queue rejects
//! further pushes but leaves queued jobs in place — workers keep draining
//! until the queue is closed *and* empty.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, PoisonError};

/// A unit of work. Consumed exactly once by a worker thread.
pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

/// Result of one blocking dequeue attempt.
pub(crate) enum Dequeued {
    /// A job to run.
    Job(Job),
    /// Queue closed and drained; the worker should exit.
    Closed,
    /// Woken without work (nudge or spurious wake); the worker should run its
    /// idle housekeeping and try again.
    Empty,
}

pub(crate) struct JobQueue {
    inner: Mutex<Inner>,
    available: Condvar,
}

struct Inner {
    jobs: VecDeque<Job>,
    closed: bool,
}

impl JobQueue {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                jobs: VecDeque::new(),
                closed: false,
            }),
            available: Condvar::new(),
        }
    }

    /// Enqueues a job. Returns `false` without queuing when closed.
    pub(crate) fn push(&self, job: Job) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if inner.closed {
            return false;
        }
        inner.jobs.push_back(job);
        self.available.notify_one();
        true
    }

    /// Blocks until a job is available, the queue is closed and drained, or a
    /// wakeup arrives. Waits for at most one wakeup so callers get a chance
    /// to run idle housekeeping between waits.
    pub(crate) fn next(&self) -> Dequeued {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(job) = inner.jobs.pop_front() {
            return Dequeued::Job(job);
        }
        if inner.closed {
            return Dequeued::Closed;
        }
        let mut inner = self
            .available
            .wait(inner)
            .unwrap_or_else(PoisonError::into_inner);
        match inner.jobs.pop_front() {
            Some(job) => Dequeued::Job(job),
            None if inner.closed => Dequeued::Closed,
            None => Dequeued::Empty,
        }
    }

    /// Closes the queue to new pushes and wakes every waiter. Queued jobs
    /// stay queued.
    pub(crate) fn close(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.closed = true;
        self.available.notify_all();
    }

    /// Reopens a closed queue (executor restart).
    pub(crate) fn reopen(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.closed = false;
    }

    /// Wakes all idle waiters without queueing work.
    pub(crate) fn nudge(&self) {
        let _inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        self.available.notify_all();
    }

    /// Discards everything still queued, returning how many jobs were
    /// dropped. Dropping a job releases its completion channel, which wakes
    /// any caller still waiting on it.
    pub(crate) fn drain_remaining(&self) -> usize {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let stranded = inner.jobs.len();
        inner.jobs.clear();
        stranded
    }

    pub(crate) fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .jobs
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn push_pop_preserves_order() {
        let queue = JobQueue::new();
        let log = Arc::new(AtomicUsize::new(0));
        for i in 0..3 {
            let log = Arc::clone(&log);
            assert!(queue.push(Box::new(move || {
                log.store(i, Ordering::Relaxed);
            })));
        }
        for i in 0..3 {
            match queue.next() {
                Dequeued::Job(job) => {
                    job();
                    assert_eq!(log.load(Ordering::Relaxed), i);
                }
                _ => panic!("expected a job"),
            }
        }
    }

    #[test]
    fn close_rejects_push_but_keeps_backlog() {
        let queue = JobQueue::new();
        assert!(queue.push(Box::new(|| {})));
        queue.close();
        assert!(!queue.push(Box::new(|| {})));
        assert_eq!(queue.len(), 1);
        assert!(matches!(queue.next(), Dequeued::Job(_)));
        assert!(matches!(queue.next(), Dequeued::Closed));
    }

    #[test]
    fn reopen_accepts_again() {
        let queue = JobQueue::new();
        queue.close();
        assert!(!queue.push(Box::new(|| {})));
        queue.reopen();
        assert!(queue.push(Box::new(|| {})));
    }

    #[test]
    fn drain_remaining_reports_count() {
        let queue = JobQueue::new();
        queue.push(Box::new(|| {}));
        queue.push(Box::new(|| {}));
        assert_eq!(queue.drain_remaining(), 2);
        assert_eq!(queue.len(), 0);
    }
}
