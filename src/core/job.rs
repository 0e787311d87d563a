//! Job trait and related types

use crate::core::error::Result;
use std::fmt;

/// A trait representing a unit of work to be executed by the job pool
///
/// Jobs take no arguments and produce no value; anything a job computes is
/// delivered through state it captured. The pool does not synchronize that
/// state: jobs that share buffers must bring their own locking.
pub trait Job: Send {
    /// Execute the job
    ///
    /// # Errors
    ///
    /// Returns an error if the job execution fails. The error is captured by
    /// the worker and surfaced by the next idle wait.
    fn execute(&mut self) -> Result<()>;

    /// Get the job's type name for logging and failure reports
    fn job_type(&self) -> &str {
        "Job"
    }
}

impl fmt::Debug for dyn Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Job({})", self.job_type())
    }
}

/// A boxed job that can be sent across threads
pub type BoxedJob = Box<dyn Job>;

impl<J: Job + ?Sized> Job for Box<J> {
    fn execute(&mut self) -> Result<()> {
        (**self).execute()
    }

    fn job_type(&self) -> &str {
        (**self).job_type()
    }
}

/// Helper to create a job from a closure
pub struct ClosureJob<F>
where
    F: FnOnce() -> Result<()> + Send,
{
    closure: Option<F>,
    name: String,
}

impl<F> ClosureJob<F>
where
    F: FnOnce() -> Result<()> + Send,
{
    /// Create a new closure job
    pub fn new(closure: F) -> Self {
        Self {
            closure: Some(closure),
            name: "ClosureJob".to_string(),
        }
    }

    /// Create a new closure job with a custom name
    pub fn with_name<S: Into<String>>(closure: F, name: S) -> Self {
        Self {
            closure: Some(closure),
            name: name.into(),
        }
    }
}

impl<F> Job for ClosureJob<F>
where
    F: FnOnce() -> Result<()> + Send,
{
    fn execute(&mut self) -> Result<()> {
        match self.closure.take() {
            Some(closure) => closure(),
            None => Err(crate::core::PoolError::other(
                "ClosureJob already executed - cannot execute twice",
            )),
        }
    }

    fn job_type(&self) -> &str {
        &self.name
    }
}

/// A job queued in the pool together with its submission id
pub(crate) struct QueuedJob {
    pub(crate) id: u64,
    pub(crate) job: BoxedJob,
}

impl fmt::Debug for QueuedJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueuedJob")
            .field("id", &self.id)
            .field("job_type", &self.job.job_type())
            .finish()
    }
}
