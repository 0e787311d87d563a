//! Job pool configuration

use crate::core::{PoolError, Result};
use serde::{Deserialize, Serialize};

/// Configuration for a job pool
///
/// The worker count is fixed for the lifetime of the pool. Unlike some pools,
/// a count of zero is not silently replaced by the CPU count; it is rejected
/// by [`validate`](Self::validate).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Number of worker threads
    pub num_threads: usize,
    /// Thread name prefix, also used as the pool name in errors and logs
    pub thread_name_prefix: String,
    /// Stack size for worker threads (None = platform default)
    pub stack_size: Option<usize>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            num_threads: num_cpus::get(),
            thread_name_prefix: "job-pool".to_string(),
            stack_size: None,
        }
    }
}

impl PoolConfig {
    /// Create a new configuration with specified number of threads
    #[must_use]
    pub fn new(num_threads: usize) -> Self {
        Self {
            num_threads,
            ..Default::default()
        }
    }

    /// Set thread name prefix
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Set the stack size of each worker thread in bytes
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    /// Parse a configuration from JSON and validate it.
    ///
    /// Fields missing from the document keep their defaults.
    ///
    /// ```
    /// use job_pool::PoolConfig;
    ///
    /// let config = PoolConfig::from_json(r#"{ "num_threads": 3 }"#).unwrap();
    /// assert_eq!(config.num_threads, 3);
    /// assert_eq!(config.thread_name_prefix, "job-pool");
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| PoolError::invalid_config("json", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.num_threads == 0 {
            return Err(PoolError::invalid_config(
                "num_threads",
                "Number of threads must be greater than 0",
            ));
        }
        if self.thread_name_prefix.is_empty() {
            return Err(PoolError::invalid_config(
                "thread_name_prefix",
                "Thread name prefix must not be empty",
            ));
        }
        if self.stack_size == Some(0) {
            return Err(PoolError::invalid_config(
                "stack_size",
                "Stack size must be greater than 0",
            ));
        }
        Ok(())
    }
}
