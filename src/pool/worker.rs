//! Worker thread implementation

use crate::core::job::QueuedJob;
use crate::core::{FailureKind, JobFailure, PoolError, Result};
use crate::pool::config::PoolConfig;
use crate::pool::state::{PoolState, Shared};
use parking_lot::MutexGuard;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

#[cfg(feature = "tracing")]
use tracing::{debug_span, trace};

/// Where a worker is in its loop.
///
/// ```text
/// Idle ──(work, lock held)──> Dequeuing ──(job popped, lock released)──> Running
///  ^  \                                                                    │
///  │   └──(stop requested)──> Terminated                                   v
///  └───────────────────(lock, count down, notify)────────────────── Completing
/// ```
enum WorkerState<'a> {
    /// Blocked on `work_available` until there is work or a stop request.
    Idle,
    /// Holding the lock, about to pop the front job.
    Dequeuing(MutexGuard<'a, PoolState>),
    /// Executing a job with the lock released.
    Running(QueuedJob),
    /// Job finished; its failure, if any, goes to the failure sink.
    Completing(Option<JobFailure>),
    Terminated,
}

/// A worker thread that processes jobs from the shared queue
#[derive(Debug)]
pub(crate) struct Worker {
    id: usize,
    thread: Option<thread::JoinHandle<()>>,
}

impl Worker {
    /// Spawn a worker thread named `{prefix}-{id}`.
    pub(crate) fn spawn(id: usize, shared: Arc<Shared>, config: &PoolConfig) -> Result<Self> {
        let mut builder =
            thread::Builder::new().name(format!("{}-{}", config.thread_name_prefix, id));
        if let Some(stack_size) = config.stack_size {
            builder = builder.stack_size(stack_size);
        }

        let thread = builder
            .spawn(move || Self::run(id, &shared))
            .map_err(|e| PoolError::spawn_with_source(id, "Cannot create worker thread", e))?;

        Ok(Self {
            id,
            thread: Some(thread),
        })
    }

    pub(crate) fn id(&self) -> usize {
        self.id
    }

    pub(crate) fn thread_id(&self) -> Option<thread::ThreadId> {
        self.thread.as_ref().map(|t| t.thread().id())
    }

    /// Join the worker thread
    pub(crate) fn join(mut self) -> Result<()> {
        if let Some(thread) = self.thread.take() {
            thread
                .join()
                .map_err(|_| PoolError::join(self.id, "Worker panicked"))?;
        }
        Ok(())
    }

    /// Main worker loop
    fn run(id: usize, shared: &Shared) {
        #[cfg(feature = "tracing")]
        let worker_span = debug_span!("worker", id = id);
        #[cfg(feature = "tracing")]
        let _guard = worker_span.enter();

        log::debug!("Worker {} started", id);

        let mut state = WorkerState::Idle;
        loop {
            state = match state {
                WorkerState::Idle => {
                    let mut guard = shared.state.lock();
                    while !guard.worker_should_wake() {
                        shared.work_available.wait(&mut guard);
                    }
                    if guard.stop_requested {
                        WorkerState::Terminated
                    } else {
                        WorkerState::Dequeuing(guard)
                    }
                }
                WorkerState::Dequeuing(mut guard) => match guard.queue.pop() {
                    Some(job) => {
                        guard.active += 1;
                        debug_assert!(guard.active <= shared.thread_count);
                        #[cfg(feature = "tracing")]
                        crate::trace::metrics::record_in_flight(
                            id,
                            guard.active,
                            shared.thread_count,
                        );
                        WorkerState::Running(job)
                    }
                    None => WorkerState::Idle,
                },
                WorkerState::Running(job) => {
                    WorkerState::Completing(Self::execute_job(id, job, shared))
                }
                WorkerState::Completing(failure) => {
                    let mut guard = shared.state.lock();
                    guard.active -= 1;
                    #[cfg(feature = "tracing")]
                    crate::trace::metrics::record_in_flight(id, guard.active, shared.thread_count);
                    if let Some(failure) = failure {
                        guard.failure.record(failure);
                    }
                    if guard.active == 0 {
                        shared.idle.notify_all();
                    }
                    WorkerState::Idle
                }
                WorkerState::Terminated => break,
            };
        }

        #[cfg(feature = "tracing")]
        trace!("worker shutting down");
        log::debug!("Worker {} stopped", id);
    }

    /// Execute a single job with panic protection, outside the pool lock.
    fn execute_job(id: usize, queued: QueuedJob, shared: &Shared) -> Option<JobFailure> {
        let QueuedJob { id: job_id, mut job } = queued;
        let job_type = job.job_type().to_string();

        #[cfg(feature = "tracing")]
        let job_span = debug_span!("job_execution", job_id = job_id, job_type = %job_type);
        #[cfg(feature = "tracing")]
        let _job_guard = job_span.enter();

        // The job is dropped inside the guard so a panicking destructor
        // counts as a job panic instead of unwinding the worker.
        let start = Instant::now();
        let result = catch_unwind(AssertUnwindSafe(move || {
            let outcome = job.execute();
            drop(job);
            outcome
        }));
        let elapsed = start.elapsed();

        let stats = &shared.stats;
        stats.add_processing_time(elapsed.as_micros() as u64);

        let kind = match result {
            Ok(Ok(())) => {
                stats.increment_completed();
                #[cfg(feature = "tracing")]
                crate::trace::metrics::record_job_outcome(id, job_id, elapsed, None);
                return None;
            }
            Ok(Err(e)) => {
                stats.increment_failed();
                FailureKind::Error(e.to_string())
            }
            Err(panic_info) => {
                stats.increment_panicked();
                FailureKind::from_panic(panic_info)
            }
        };
        #[cfg(feature = "tracing")]
        crate::trace::metrics::record_job_outcome(id, job_id, elapsed, Some(&kind));

        let failure = JobFailure::new(job_id, job_type, kind);
        log::error!("Worker {}: {}", id, failure);
        Some(failure)
    }
}
