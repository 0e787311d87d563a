//! Lock-protected pool state and the condition variables around it

use crate::core::failure::FailureSlot;
use crate::pool::config::PoolConfig;
use crate::pool::stats::PoolStats;
use crate::queue::JobQueue;
use parking_lot::{Condvar, Mutex};

/// Everything the pool mutex protects.
///
/// `stop_requested` only ever goes from false to true. `active` counts jobs
/// that have been dequeued and not yet completed, so it never exceeds the
/// worker count.
#[derive(Debug)]
pub(crate) struct PoolState {
    pub(crate) queue: JobQueue,
    pub(crate) active: usize,
    pub(crate) paused: bool,
    pub(crate) stop_requested: bool,
    pub(crate) failure: FailureSlot,
    next_job_id: u64,
}

impl PoolState {
    fn new() -> Self {
        Self {
            queue: JobQueue::new(),
            active: 0,
            paused: false,
            stop_requested: false,
            failure: FailureSlot::default(),
            next_job_id: 1,
        }
    }

    /// Reserve `count` consecutive job ids and return the first.
    pub(crate) fn reserve_ids(&mut self, count: u64) -> u64 {
        let first = self.next_job_id;
        self.next_job_id += count;
        first
    }

    /// Wake predicate for idle workers.
    pub(crate) fn worker_should_wake(&self) -> bool {
        self.stop_requested || (!self.paused && !self.queue.is_empty())
    }

    /// Wake predicate for idle waiters: nothing in flight, and either nothing
    /// queued or the queue is stuck behind a pause.
    pub(crate) fn idle_wait_finished(&self) -> bool {
        self.active == 0 && (self.queue.is_empty() || self.paused)
    }
}

/// State shared between the pool handle and its workers.
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) state: Mutex<PoolState>,
    /// Signalled when a job is queued, on resume and on stop.
    pub(crate) work_available: Condvar,
    /// Signalled when the in-flight count drops to zero, on pause and on stop.
    pub(crate) idle: Condvar,
    pub(crate) stats: PoolStats,
    pub(crate) thread_count: usize,
    pub(crate) pool_name: String,
}

impl Shared {
    pub(crate) fn new(config: &PoolConfig) -> Self {
        Self {
            state: Mutex::new(PoolState::new()),
            work_available: Condvar::new(),
            idle: Condvar::new(),
            stats: PoolStats::new(),
            thread_count: config.num_threads,
            pool_name: config.thread_name_prefix.clone(),
        }
    }
}
