//! FIFO job queue owned by the pool state.
//!
//! [`JobQueue`] does no locking of its own. It lives inside the pool's
//! `PoolState` and every method is called with the pool mutex held, which is
//! what gives batch pushes their atomicity and guarantees that each job is
//! popped by exactly one worker.

use crate::core::job::QueuedJob;
use std::collections::VecDeque;

/// Ordered queue of pending jobs. Insertion order is dequeue order.
#[derive(Debug, Default)]
pub(crate) struct JobQueue {
    jobs: VecDeque<QueuedJob>,
}

impl JobQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Append one job at the back.
    pub(crate) fn push(&mut self, job: QueuedJob) {
        self.jobs.push_back(job);
    }

    /// Append every job in order.
    pub(crate) fn extend<I>(&mut self, jobs: I)
    where
        I: IntoIterator<Item = QueuedJob>,
    {
        self.jobs.extend(jobs);
    }

    /// Remove the oldest job.
    pub(crate) fn pop(&mut self) -> Option<QueuedJob> {
        self.jobs.pop_front()
    }

    pub(crate) fn len(&self) -> usize {
        self.jobs.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Remove every pending job, handing them back so the caller can drop
    /// them outside the lock.
    pub(crate) fn drain_all(&mut self) -> Vec<QueuedJob> {
        self.jobs.drain(..).collect()
    }
}
