//! Tracing integration for observability.
//!
//! With the `tracing` feature enabled, workers and jobs run inside spans and
//! the pool emits metric-style events. Without it, [`TracedJob`] is a plain
//! pass-through wrapper.
//!
//! # Example
//!
//! ```rust,ignore
//! use job_pool::prelude::*;
//! use tracing_subscriber::{fmt, prelude::*, EnvFilter};
//!
//! tracing_subscriber::registry()
//!     .with(fmt::layer())
//!     .with(EnvFilter::from_default_env()
//!         .add_directive("job_pool=debug".parse().unwrap()))
//!     .init();
//!
//! let pool = JobPool::new(4)?;
//! let _span = tracing::info_span!("request", id = 7).entered();
//! pool.submit_traced(MyJob::new())?;
//! ```

use crate::core::{Job, Result};

/// A job wrapper that carries the submitter's tracing span into the worker.
///
/// The span current at construction time is entered while the job executes.
pub struct TracedJob<J: Job> {
    inner: J,
    #[cfg(feature = "tracing")]
    span: tracing::Span,
}

impl<J: Job> TracedJob<J> {
    /// Wrap `job`, capturing the current span.
    pub fn new(job: J) -> Self {
        Self {
            inner: job,
            #[cfg(feature = "tracing")]
            span: tracing::Span::current(),
        }
    }

    /// Wrap `job` with an explicit span.
    #[cfg(feature = "tracing")]
    pub fn with_span(job: J, span: tracing::Span) -> Self {
        Self { inner: job, span }
    }
}

impl<J: Job> Job for TracedJob<J> {
    fn execute(&mut self) -> Result<()> {
        #[cfg(feature = "tracing")]
        let _guard = self.span.enter();
        self.inner.execute()
    }

    fn job_type(&self) -> &str {
        self.inner.job_type()
    }
}

/// Pool events emitted as `tracing` records.
///
/// Field names are stable so a subscriber can turn them into counters and
/// gauges.
#[cfg(feature = "tracing")]
pub mod metrics {
    use crate::core::FailureKind;
    use std::time::Duration;

    /// Jobs `first_id..first_id + count` were appended to the queue.
    pub fn record_jobs_queued(first_id: u64, count: u64, queue_depth: usize) {
        tracing::trace!(
            first_job_id = first_id,
            jobs = count,
            queue_depth = queue_depth as u64,
            "jobs queued"
        );
    }

    /// A worker picked up or finished a job; `in_flight` is the new count.
    pub fn record_in_flight(worker_id: usize, in_flight: usize, thread_count: usize) {
        tracing::trace!(
            worker = worker_id,
            in_flight = in_flight as u64,
            threads = thread_count as u64,
            "in-flight jobs changed"
        );
    }

    /// A job left its worker, with `failure` set when it did not succeed.
    pub fn record_job_outcome(
        worker_id: usize,
        job_id: u64,
        elapsed: Duration,
        failure: Option<&FailureKind>,
    ) {
        let elapsed_us = elapsed.as_micros() as u64;
        match failure {
            None => tracing::trace!(
                worker = worker_id,
                job_id,
                elapsed_us,
                outcome = "ok",
                "job finished"
            ),
            Some(kind) => tracing::debug!(
                worker = worker_id,
                job_id,
                elapsed_us,
                outcome = if kind.is_panic() { "panic" } else { "error" },
                reason = kind.message(),
                "job finished"
            ),
        }
    }

    /// The pool spawned all of its workers.
    pub fn record_pool_start(num_workers: usize, pool_name: &str) {
        tracing::info!(workers = num_workers, pool = pool_name, "job pool started");
    }

    /// Shutdown joined the workers and dropped `jobs_discarded` queued jobs.
    pub fn record_pool_shutdown(jobs_processed: u64, jobs_discarded: u64) {
        tracing::info!(
            jobs_processed,
            jobs_discarded,
            "job pool shutdown complete"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ClosureJob;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_traced_job_executes() {
        let executed = Arc::new(AtomicBool::new(false));
        let executed_clone = executed.clone();

        let job = ClosureJob::new(move || {
            executed_clone.store(true, Ordering::SeqCst);
            Ok(())
        });

        let mut traced = TracedJob::new(job);
        traced.execute().expect("Job should execute");

        assert!(executed.load(Ordering::SeqCst));
    }

    #[cfg(feature = "tracing")]
    #[test]
    fn test_pool_events_for_every_outcome() {
        use crate::core::PoolError;
        use crate::JobPool;

        let pool = JobPool::new(2).expect("Failed to create job pool");
        let span = tracing::info_span!("request", id = 7);
        let _entered = span.enter();

        pool.execute_batch(vec![
            Box::new(|| Ok(())) as Box<dyn FnOnce() -> Result<()> + Send>,
            Box::new(|| Err(PoolError::execution("lookup failed"))),
        ])
        .expect("batch submit");
        pool.submit_traced(ClosureJob::new(|| panic!("resolver exploded")))
            .expect("submit");

        let err = pool.wait_for_idle().expect_err("a failure should surface");
        assert!(err.job_failure().is_some());
        let stats = pool.stats();
        assert_eq!(stats.jobs_processed(), 3);
        assert_eq!(stats.jobs_failed + stats.jobs_panicked, 2);
    }

    #[test]
    fn test_traced_job_preserves_job_type() {
        let traced = TracedJob::new(ClosureJob::with_name(|| Ok(()), "Dns"));
        assert_eq!(traced.job_type(), "Dns");
    }
}
