//! Job pool implementation

use crate::core::job::QueuedJob;
use crate::core::{BoxedJob, ClosureJob, Job, PoolError, Result};
use crate::pool::config::PoolConfig;
use crate::pool::state::Shared;
use crate::pool::stats::PoolStatsSnapshot;
use crate::pool::worker::Worker;
use crate::trace::TracedJob;
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::ops::Range;
use std::sync::Arc;
use std::thread;

/// A fixed-size pool of worker threads consuming jobs from one FIFO queue
///
/// # Lifecycle
///
/// All workers are spawned by the constructor. Dropping the pool (or calling
/// [`shutdown`](Self::shutdown)) stops the workers: jobs already running
/// finish, jobs still queued are discarded without running. Call
/// [`wait_for_idle`](Self::wait_for_idle) first if queued work must complete.
///
/// # Failures
///
/// A job that returns an error or panics never takes its worker down. The
/// failure is logged and kept in a single slot; the next
/// [`wait_for_idle`](Self::wait_for_idle) returns it and clears the slot. When
/// several jobs fail between two waits only the latest failure is reported.
///
/// # Example
///
/// ```
/// use job_pool::prelude::*;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// # fn main() -> Result<()> {
/// let pool = JobPool::new(4)?;
/// let counter = Arc::new(AtomicUsize::new(0));
///
/// for _ in 0..100 {
///     let counter = Arc::clone(&counter);
///     pool.execute(move || {
///         counter.fetch_add(1, Ordering::Relaxed);
///         Ok(())
///     })?;
/// }
///
/// pool.wait_for_idle()?;
/// assert_eq!(counter.load(Ordering::Relaxed), 100);
/// # Ok(())
/// # }
/// ```
pub struct JobPool {
    shared: Arc<Shared>,
    workers: Mutex<Vec<Worker>>,
}

impl std::fmt::Debug for JobPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("JobPool")
            .field("name", &self.shared.pool_name)
            .field("thread_count", &self.shared.thread_count)
            .field("queue_size", &state.queue.len())
            .field("active_count", &state.active)
            .field("paused", &state.paused)
            .field("stop_requested", &state.stop_requested)
            .field("failure_pending", &!state.failure.is_empty())
            .finish()
    }
}

impl JobPool {
    /// Create a pool with `num_threads` workers
    ///
    /// # Errors
    ///
    /// - `PoolError::InvalidConfig` - `num_threads` is zero
    /// - `PoolError::SpawnError` - a worker thread could not be created
    pub fn new(num_threads: usize) -> Result<Self> {
        Self::with_config(PoolConfig::new(num_threads))
    }

    /// Create a pool from a configuration
    ///
    /// If any worker fails to spawn, the workers already started are stopped
    /// and joined before the error is returned.
    pub fn with_config(config: PoolConfig) -> Result<Self> {
        config.validate()?;

        let pool = Self {
            shared: Arc::new(Shared::new(&config)),
            workers: Mutex::new(Vec::with_capacity(config.num_threads)),
        };

        for id in 0..config.num_threads {
            let worker = Worker::spawn(id, Arc::clone(&pool.shared), &config)?;
            pool.workers.lock().push(worker);
        }

        info!(
            "Job pool '{}' started with {} workers",
            config.thread_name_prefix, config.num_threads
        );
        #[cfg(feature = "tracing")]
        crate::trace::metrics::record_pool_start(config.num_threads, &config.thread_name_prefix);

        Ok(pool)
    }

    /// Submit a job to the pool and return its job id
    ///
    /// Wakes one idle worker.
    ///
    /// # Errors
    ///
    /// - `PoolError::ShuttingDown` - shutdown has begun; the job is dropped
    pub fn submit<J: Job + 'static>(&self, job: J) -> Result<u64> {
        self.enqueue(Box::new(job))
    }

    /// Submit a closure as a job
    pub fn execute<F>(&self, f: F) -> Result<u64>
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        self.submit(ClosureJob::new(f))
    }

    /// Submit a job that runs inside the caller's current tracing span
    pub fn submit_traced<J: Job + 'static>(&self, job: J) -> Result<u64> {
        self.submit(TracedJob::new(job))
    }

    /// Submit several jobs at once and return the range of ids they received
    ///
    /// The jobs are appended in iteration order within one critical section, so
    /// no worker can dequeue between them, and all idle workers are woken. Jobs
    /// of different types can be batched as [`BoxedJob`]s.
    ///
    /// # Errors
    ///
    /// - `PoolError::ShuttingDown` - shutdown has begun; no job is enqueued
    pub fn submit_batch<I>(&self, jobs: I) -> Result<Range<u64>>
    where
        I: IntoIterator,
        I::Item: Job + 'static,
    {
        let jobs: Vec<BoxedJob> = jobs
            .into_iter()
            .map(|job| Box::new(job) as BoxedJob)
            .collect();
        self.enqueue_batch(jobs)
    }

    /// Submit several closures at once
    pub fn execute_batch<I, F>(&self, closures: I) -> Result<Range<u64>>
    where
        I: IntoIterator<Item = F>,
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        self.submit_batch(closures.into_iter().map(ClosureJob::new))
    }

    fn enqueue(&self, job: BoxedJob) -> Result<u64> {
        let (job_id, queue_size) = {
            let mut state = self.shared.state.lock();
            if state.stop_requested {
                return Err(PoolError::shutting_down(&self.shared.pool_name));
            }
            let job_id = state.reserve_ids(1);
            state.queue.push(QueuedJob { id: job_id, job });
            self.shared.stats.add_submitted(1);
            (job_id, state.queue.len())
        };
        self.shared.work_available.notify_one();

        debug!("Job #{} added to the pool. Queue size: {}", job_id, queue_size);
        #[cfg(feature = "tracing")]
        crate::trace::metrics::record_jobs_queued(job_id, 1, queue_size);

        Ok(job_id)
    }

    fn enqueue_batch(&self, jobs: Vec<BoxedJob>) -> Result<Range<u64>> {
        let count = jobs.len() as u64;
        let (ids, queue_size) = {
            let mut state = self.shared.state.lock();
            if state.stop_requested {
                return Err(PoolError::shutting_down(&self.shared.pool_name));
            }
            let first = state.reserve_ids(count);
            state.queue.extend(
                jobs.into_iter()
                    .zip(first..)
                    .map(|(job, id)| QueuedJob { id, job }),
            );
            self.shared.stats.add_submitted(count);
            (first..first + count, state.queue.len())
        };
        if count > 0 {
            self.shared.work_available.notify_all();
        }

        debug!("{} jobs added to the pool. Queue size: {}", count, queue_size);
        #[cfg(feature = "tracing")]
        crate::trace::metrics::record_jobs_queued(ids.start, count, queue_size);

        Ok(ids)
    }

    /// Block until the queue is empty and no job is running
    ///
    /// Returns immediately when the pool is already idle, so calling it twice in
    /// a row is cheap. Once it returns, the side effects of every job that ran
    /// before are visible to the caller.
    ///
    /// # Errors
    ///
    /// - `PoolError::JobFailed` - a job failed since the previous wait. Only the
    ///   most recent failure is reported; the slot is cleared.
    /// - `PoolError::Paused` - the pool is paused with jobs still queued, so it
    ///   cannot become idle. Returned once running jobs have finished. A stored
    ///   failure is kept for the next wait.
    ///
    /// # Deadlock
    ///
    /// Calling this from inside a job never returns: the calling job itself
    /// counts as in flight.
    pub fn wait_for_idle(&self) -> Result<()> {
        let mut state = self.shared.state.lock();
        while !state.idle_wait_finished() {
            self.shared.idle.wait(&mut state);
        }

        if !state.queue.is_empty() {
            return Err(PoolError::paused(state.queue.len()));
        }

        match state.failure.take() {
            Some((failure, superseded)) => {
                drop(state);
                if superseded > 0 {
                    warn!(
                        "{} earlier job failures superseded by {}",
                        superseded, failure
                    );
                }
                Err(failure.into())
            }
            None => Ok(()),
        }
    }

    /// Get the number of queued jobs (point-in-time snapshot)
    pub fn queue_size(&self) -> usize {
        self.shared.state.lock().queue.len()
    }

    /// Get the number of jobs currently executing
    pub fn active_count(&self) -> usize {
        self.shared.state.lock().active
    }

    /// Get the number of worker threads
    pub fn thread_count(&self) -> usize {
        self.shared.thread_count
    }

    /// Stop dequeuing jobs
    ///
    /// Jobs already running finish; queued jobs stay queued and new
    /// submissions are still accepted.
    pub fn pause(&self) {
        self.shared.state.lock().paused = true;
        // Waiters may now be looking at a queue that cannot drain
        self.shared.idle.notify_all();
        debug!("Job pool '{}' paused", self.shared.pool_name);
    }

    /// Resume dequeuing jobs
    pub fn resume(&self) {
        self.shared.state.lock().paused = false;
        self.shared.work_available.notify_all();
        debug!("Job pool '{}' resumed", self.shared.pool_name);
    }

    /// Check if the pool is paused
    pub fn is_paused(&self) -> bool {
        self.shared.state.lock().paused
    }

    /// Check if shutdown has begun
    pub fn is_shutdown(&self) -> bool {
        self.shared.state.lock().stop_requested
    }

    /// Get a snapshot of the pool counters
    pub fn stats(&self) -> PoolStatsSnapshot {
        self.shared.stats.snapshot()
    }

    /// Stop the workers and wait for them to exit
    ///
    /// # Shutdown
    ///
    /// 1. Marks the pool as stopping, so later submissions fail
    /// 2. Discards every queued job without running it
    /// 3. Wakes all workers and joins them; running jobs finish first
    ///
    /// Only the first call does anything. When called from inside one of the
    /// pool's own jobs, that worker's thread is left to exit on its own
    /// instead of being joined.
    pub fn shutdown(&self) {
        let discarded = {
            let mut state = self.shared.state.lock();
            if state.stop_requested {
                return;
            }
            state.stop_requested = true;
            state.queue.drain_all()
        };
        self.shared.work_available.notify_all();
        self.shared.idle.notify_all();

        let discarded_count = discarded.len();
        drop(discarded);
        self.shared.stats.add_discarded(discarded_count as u64);

        let current = thread::current().id();
        let workers = std::mem::take(&mut *self.workers.lock());
        for worker in workers {
            if worker.thread_id() == Some(current) {
                warn!(
                    "Job pool '{}' shut down from its own worker #{}; not joining it",
                    self.shared.pool_name,
                    worker.id()
                );
                continue;
            }
            if let Err(e) = worker.join() {
                warn!("Job pool '{}': {}", self.shared.pool_name, e);
            }
        }

        let stats = self.shared.stats.snapshot();
        info!(
            "Job pool '{}' shut down: {} jobs processed, {} queued jobs discarded",
            self.shared.pool_name,
            stats.jobs_processed(),
            discarded_count
        );
        #[cfg(feature = "tracing")]
        crate::trace::metrics::record_pool_shutdown(stats.jobs_processed(), stats.jobs_discarded);
    }
}

impl Drop for JobPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
