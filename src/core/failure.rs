//! Captured job failures and the single-slot failure sink
//!
//! A worker that sees a job return an error or panic turns the outcome into a
//! [`JobFailure`] and records it in the pool's [`FailureSlot`]. The slot keeps
//! only the most recent failure: if several jobs fail between two calls to
//! [`JobPool::wait_for_idle`], the caller observes exactly the last one and the
//! earlier ones are counted as superseded. Callers that need every failure
//! should collect them inside their jobs.
//!
//! [`JobPool::wait_for_idle`]: crate::pool::JobPool::wait_for_idle

use std::any::Any;
use std::fmt;

/// How a job failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// The job returned an error
    Error(String),
    /// The job panicked
    Panic(String),
}

impl FailureKind {
    /// Build a panic failure from a `catch_unwind` payload
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        FailureKind::Panic(message)
    }

    /// Whether the job panicked
    pub fn is_panic(&self) -> bool {
        matches!(self, FailureKind::Panic(_))
    }

    /// The error or panic message
    pub fn message(&self) -> &str {
        match self {
            FailureKind::Error(msg) | FailureKind::Panic(msg) => msg,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Error(msg) => write!(f, "returned an error: {}", msg),
            FailureKind::Panic(msg) => write!(f, "panicked: {}", msg),
        }
    }
}

/// A job failure captured by a worker
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("job #{job_id} ({job_type}) {kind}")]
pub struct JobFailure {
    /// Id assigned to the job at submission
    pub job_id: u64,
    /// The job's type name
    pub job_type: String,
    /// What went wrong
    pub kind: FailureKind,
}

impl JobFailure {
    /// Create a new failure record
    pub fn new(job_id: u64, job_type: impl Into<String>, kind: FailureKind) -> Self {
        Self {
            job_id,
            job_type: job_type.into(),
            kind,
        }
    }
}

/// Holds at most one failure; the latest write wins.
#[derive(Debug, Default)]
pub(crate) struct FailureSlot {
    latest: Option<JobFailure>,
    superseded: u64,
}

impl FailureSlot {
    /// Store `failure`, replacing whatever was there.
    pub(crate) fn record(&mut self, failure: JobFailure) {
        if self.latest.replace(failure).is_some() {
            self.superseded += 1;
        }
    }

    /// Take the stored failure along with the number of failures it replaced.
    pub(crate) fn take(&mut self) -> Option<(JobFailure, u64)> {
        let superseded = std::mem::take(&mut self.superseded);
        self.latest.take().map(|failure| (failure, superseded))
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.latest.is_none()
    }
}
