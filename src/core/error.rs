//! Error types for the job pool

use crate::core::failure::JobFailure;

/// Result type for job pool operations
pub type Result<T> = std::result::Result<T, PoolError>;

/// Errors that can occur in the job pool
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PoolError {
    /// Invalid configuration with parameter
    #[error("Invalid configuration for '{parameter}': {message}")]
    InvalidConfig {
        /// Configuration parameter name
        parameter: String,
        /// Error message
        message: String,
    },

    /// Failed to spawn a worker thread with details
    #[error("Failed to spawn worker thread #{thread_id}: {message}")]
    SpawnError {
        /// ID of the thread that failed to spawn
        thread_id: usize,
        /// Error message
        message: String,
        /// Source IO error
        #[source]
        source: Option<std::io::Error>,
    },

    /// Failed to join a worker thread
    #[error("Failed to join worker thread #{thread_id}: {message}")]
    JoinError {
        /// ID of the thread that failed to join
        thread_id: usize,
        /// Error message
        message: String,
    },

    /// The pool has begun shutting down and no longer accepts jobs
    #[error("Job pool '{pool_name}' is shutting down")]
    ShuttingDown {
        /// Name of the job pool
        pool_name: String,
    },

    /// The pool is paused with queued jobs, so it can never become idle
    #[error("Job pool is paused with {pending_jobs} jobs pending")]
    Paused {
        /// Number of queued jobs
        pending_jobs: usize,
    },

    /// A job failed since the last idle wait
    #[error("Job failed: {0}")]
    JobFailed(#[from] JobFailure),

    /// Job execution failed, reported by the job itself
    #[error("Job execution failed: {message}")]
    ExecutionError {
        /// Error message
        message: String,
    },

    /// General error
    #[error("{0}")]
    Other(String),
}

impl PoolError {
    /// Create an invalid config error
    pub fn invalid_config(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        PoolError::InvalidConfig {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create a spawn error
    pub fn spawn(thread_id: usize, message: impl Into<String>) -> Self {
        PoolError::SpawnError {
            thread_id,
            message: message.into(),
            source: None,
        }
    }

    /// Create a spawn error with source
    pub fn spawn_with_source(
        thread_id: usize,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        PoolError::SpawnError {
            thread_id,
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a join error
    pub fn join(thread_id: usize, message: impl Into<String>) -> Self {
        PoolError::JoinError {
            thread_id,
            message: message.into(),
        }
    }

    /// Create a shutting down error
    pub fn shutting_down(pool_name: impl Into<String>) -> Self {
        PoolError::ShuttingDown {
            pool_name: pool_name.into(),
        }
    }

    /// Create a paused error
    pub fn paused(pending_jobs: usize) -> Self {
        PoolError::Paused { pending_jobs }
    }

    /// Create an execution error
    pub fn execution(message: impl Into<String>) -> Self {
        PoolError::ExecutionError {
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        PoolError::Other(msg.into())
    }

    /// Returns the captured job failure if this error carries one
    pub fn job_failure(&self) -> Option<&JobFailure> {
        match self {
            PoolError::JobFailed(failure) => Some(failure),
            _ => None,
        }
    }
}
