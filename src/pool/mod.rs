//! Job pool, worker threads and their shared state

pub mod config;
pub mod job_pool;
pub mod stats;

mod state;
mod worker;

pub use config::PoolConfig;
pub use job_pool::JobPool;
pub use stats::PoolStatsSnapshot;
