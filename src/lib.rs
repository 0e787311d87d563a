//! # Job Pool
//!
//! A fixed-size worker pool: a set of long-lived threads consuming jobs from
//! one shared FIFO queue, with pause/resume, quiescence waiting and
//! single-slot failure reporting.
//!
//! ## Features
//!
//! - **Fixed Workers**: all threads are spawned at construction and joined on drop
//! - **FIFO Queue**: jobs from a single producer are dequeued in submission order
//! - **Batch Submission**: a batch is enqueued atomically and wakes every worker
//! - **Idle Wait**: block until the queue is empty and nothing is running
//! - **Pause/Resume**: stop and restart dequeuing without losing queued jobs
//! - **Failure Sink**: job errors and panics are caught and the latest one is
//!   returned by the next idle wait
//!
//! ## Quick Start
//!
//! ```rust
//! use job_pool::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let pool = JobPool::new(4)?;
//!
//! for i in 0..10 {
//!     pool.execute(move || {
//!         println!("Job {} executing", i);
//!         Ok(())
//!     })?;
//! }
//!
//! pool.wait_for_idle()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use job_pool::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let config = PoolConfig::new(8).with_thread_name_prefix("resolver");
//! let pool = JobPool::with_config(config)?;
//! assert_eq!(pool.thread_count(), 8);
//! # Ok(())
//! # }
//! ```
//!
//! ## Custom Jobs
//!
//! ```rust
//! use job_pool::prelude::*;
//!
//! struct Collatz {
//!     start: u64,
//! }
//!
//! impl Job for Collatz {
//!     fn execute(&mut self) -> Result<()> {
//!         let (mut n, mut steps) = (self.start, 0);
//!         while n != 1 {
//!             n = if n % 2 == 0 { n / 2 } else { 3 * n + 1 };
//!             steps += 1;
//!         }
//!         println!("{} reaches 1 after {} steps", self.start, steps);
//!         Ok(())
//!     }
//!
//!     fn job_type(&self) -> &str {
//!         "Collatz"
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! let pool = JobPool::new(2)?;
//! pool.submit_batch((1..=5).map(|start| Collatz { start }))?;
//! pool.wait_for_idle()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Failures
//!
//! ```rust
//! use job_pool::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let pool = JobPool::new(2)?;
//! pool.execute(|| Err(PoolError::execution("host not found")))?;
//! pool.execute(|| Ok(()))?;
//!
//! match pool.wait_for_idle() {
//!     Err(PoolError::JobFailed(failure)) => println!("{}", failure),
//!     other => other?,
//! }
//!
//! // The failure was consumed
//! pool.wait_for_idle()?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod core;
pub mod pool;
pub mod prelude;
pub mod trace;

mod queue;

pub use crate::core::{BoxedJob, ClosureJob, FailureKind, Job, JobFailure, PoolError, Result};
pub use crate::pool::{JobPool, PoolConfig, PoolStatsSnapshot};
pub use crate::trace::TracedJob;
