use std::env;
use std::time::Duration;

use crate::models::{DEFAULT_STARGAZER_ATTEMPTS, DEFAULT_USER_ATTEMPTS};
use crate::services::{
    DEFAULT_ADMISSION_TIMEOUT, DEFAULT_PUBLISH_INTERVAL, DEFAULT_TOP_RESULTS,
    DEFAULT_WORKER_POOL_SIZE,
};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Workers per coordinator replica (default: 10)
    pub worker_pool_size: usize,
    /// Coordinator replicas polled on admission (default: 1)
    pub coordinator_replicas: usize,
    /// How long the gatekeeper waits for admission replies (default: 3 seconds)
    pub admission_timeout: Duration,
    /// Interval between progress publications (default: 100 ms)
    pub publish_interval: Duration,
    /// Attempts for the stargazer listing (default: 4)
    pub stargazer_attempts: u32,
    /// Attempts for each starred-repositories listing (default: 3)
    pub user_attempts: u32,
    /// Rows printed by the console presenter (default: 25)
    pub top_results: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            worker_pool_size: DEFAULT_WORKER_POOL_SIZE,
            coordinator_replicas: 1,
            admission_timeout: DEFAULT_ADMISSION_TIMEOUT,
            publish_interval: DEFAULT_PUBLISH_INTERVAL,
            stargazer_attempts: DEFAULT_STARGAZER_ATTEMPTS,
            user_attempts: DEFAULT_USER_ATTEMPTS,
            top_results: DEFAULT_TOP_RESULTS,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let worker_pool_size: usize = lookup("STARGAZER_WORKER_POOL_SIZE")
            .unwrap_or_else(|| "10".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("STARGAZER_WORKER_POOL_SIZE"))?;
        if worker_pool_size == 0 {
            return Err(ConfigError::InvalidValue("STARGAZER_WORKER_POOL_SIZE"));
        }

        let coordinator_replicas: usize = lookup("STARGAZER_COORDINATOR_REPLICAS")
            .unwrap_or_else(|| "1".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("STARGAZER_COORDINATOR_REPLICAS"))?;
        if coordinator_replicas == 0 {
            return Err(ConfigError::InvalidValue("STARGAZER_COORDINATOR_REPLICAS"));
        }

        let admission_timeout_ms: u64 = lookup("STARGAZER_ADMISSION_TIMEOUT_MS")
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("STARGAZER_ADMISSION_TIMEOUT_MS"))?;

        let publish_interval_ms: u64 = lookup("STARGAZER_PUBLISH_INTERVAL_MS")
            .unwrap_or_else(|| "100".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("STARGAZER_PUBLISH_INTERVAL_MS"))?;
        // tokio intervals panic on a zero period
        if publish_interval_ms == 0 {
            return Err(ConfigError::InvalidValue("STARGAZER_PUBLISH_INTERVAL_MS"));
        }

        let stargazer_attempts = lookup("STARGAZER_STARGAZER_ATTEMPTS")
            .unwrap_or_else(|| "4".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("STARGAZER_STARGAZER_ATTEMPTS"))?;

        let user_attempts = lookup("STARGAZER_USER_ATTEMPTS")
            .unwrap_or_else(|| "3".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("STARGAZER_USER_ATTEMPTS"))?;

        let top_results = lookup("STARGAZER_TOP_RESULTS")
            .unwrap_or_else(|| "25".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("STARGAZER_TOP_RESULTS"))?;

        Ok(Self {
            worker_pool_size,
            coordinator_replicas,
            admission_timeout: Duration::from_millis(admission_timeout_ms),
            publish_interval: Duration::from_millis(publish_interval_ms),
            stargazer_attempts,
            user_attempts,
            top_results,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
