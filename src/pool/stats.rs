//! Pool-wide job counters

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics shared by all workers of a pool
#[derive(Debug, Default)]
pub(crate) struct PoolStats {
    jobs_submitted: AtomicU64,
    jobs_completed: AtomicU64,
    jobs_failed: AtomicU64,
    jobs_panicked: AtomicU64,
    jobs_discarded: AtomicU64,
    total_processing_time_us: AtomicU64,
}

impl PoolStats {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_submitted(&self, count: u64) {
        self.jobs_submitted.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn increment_completed(&self) {
        self.jobs_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn increment_failed(&self) {
        self.jobs_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn increment_panicked(&self) {
        self.jobs_panicked.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_discarded(&self, count: u64) {
        self.jobs_discarded.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn add_processing_time(&self, microseconds: u64) {
        self.total_processing_time_us
            .fetch_add(microseconds, Ordering::Relaxed);
    }

    /// Take a point-in-time copy of the counters
    pub(crate) fn snapshot(&self) -> PoolStatsSnapshot {
        PoolStatsSnapshot {
            jobs_submitted: self.jobs_submitted.load(Ordering::Relaxed),
            jobs_completed: self.jobs_completed.load(Ordering::Relaxed),
            jobs_failed: self.jobs_failed.load(Ordering::Relaxed),
            jobs_panicked: self.jobs_panicked.load(Ordering::Relaxed),
            jobs_discarded: self.jobs_discarded.load(Ordering::Relaxed),
            total_processing_time_us: self.total_processing_time_us.load(Ordering::Relaxed),
        }
    }
}

/// Copy of a pool's job counters at one moment, from [`JobPool::stats`]
///
/// [`JobPool::stats`]: crate::JobPool::stats
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolStatsSnapshot {
    /// Jobs accepted by submit or submit_batch
    pub jobs_submitted: u64,
    /// Jobs that returned `Ok`
    pub jobs_completed: u64,
    /// Jobs that returned an error
    pub jobs_failed: u64,
    /// Jobs that panicked
    pub jobs_panicked: u64,
    /// Queued jobs dropped at shutdown without running
    pub jobs_discarded: u64,
    /// Total time spent executing jobs (microseconds)
    pub total_processing_time_us: u64,
}

impl PoolStatsSnapshot {
    /// Jobs that ran to an outcome, successful or not
    pub fn jobs_processed(&self) -> u64 {
        self.jobs_completed + self.jobs_failed + self.jobs_panicked
    }

    /// Get average processing time per job in microseconds
    pub fn average_processing_time_us(&self) -> f64 {
        let count = self.jobs_processed();
        if count > 0 {
            self.total_processing_time_us as f64 / count as f64
        } else {
            0.0
        }
    }
}
