//! Convenient re-exports for common types and traits

pub use crate::core::{
    BoxedJob, ClosureJob, FailureKind, Job, JobFailure, PoolError, Result,
};
pub use crate::pool::{JobPool, PoolConfig, PoolStatsSnapshot};
