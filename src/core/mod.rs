//! Core types and traits for the job pool

pub mod error;
pub mod failure;
pub mod job;

pub use error::{PoolError, Result};
pub use failure::{FailureKind, JobFailure};
pub use job::{BoxedJob, ClosureJob, Job};
