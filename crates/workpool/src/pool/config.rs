//! Worker pool configuration

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Environment variable overriding the worker count
pub const ENV_WORKERS: &str = "WORKPOOL_WORKERS";

/// Environment variable overriding the queue capacity
pub const ENV_QUEUE_CAPACITY: &str = "WORKPOOL_QUEUE_CAPACITY";

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A value is out of range
    #[error("invalid worker pool configuration: {0}")]
    Invalid(String),

    /// An environment variable could not be parsed
    #[error("invalid value {value:?} for {name}")]
    InvalidEnv { name: &'static str, value: String },
}

/// Worker pool configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkerPoolConfig {
    /// Unique pool ID (generated if not provided)
    pub pool_id: String,

    /// Number of concurrent workers, fixed once the pool starts
    pub workers: usize,

    /// Maximum buffered tasks before `submit` suspends
    ///
    /// `None` means twice the worker count.
    #[serde(default)]
    pub queue_capacity: Option<usize>,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            pool_id: format!("pool-{}", Uuid::now_v7()),
            workers: default_workers(),
            queue_capacity: None,
        }
    }
}

impl WorkerPoolConfig {
    /// Create a configuration with the given worker count
    pub fn new(workers: usize) -> Self {
        Self::default().with_workers(workers)
    }

    /// Load configuration from `WORKPOOL_*` environment variables
    ///
    /// Unset variables fall back to the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(workers) = parse_env(ENV_WORKERS)? {
            config = config.with_workers(workers);
        }
        if let Some(capacity) = parse_env(ENV_QUEUE_CAPACITY)? {
            config = config.with_queue_capacity(capacity);
        }

        config.validate()?;
        Ok(config)
    }

    /// Set the pool ID
    pub fn with_pool_id(mut self, id: impl Into<String>) -> Self {
        self.pool_id = id.into();
        self
    }

    /// Set the worker count
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Set the queue capacity
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = Some(capacity.max(1));
        self
    }

    /// Effective queue capacity
    pub fn effective_queue_capacity(&self) -> usize {
        self.queue_capacity
            .unwrap_or_else(|| self.workers.saturating_mul(2))
            .max(1)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".into()));
        }
        if self.queue_capacity == Some(0) {
            return Err(ConfigError::Invalid(
                "queue_capacity must be at least 1".into(),
            ));
        }
        if self.pool_id.is_empty() {
            return Err(ConfigError::Invalid("pool_id must not be empty".into()));
        }
        Ok(())
    }
}

/// Number of CPUs available to the process
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn parse_env(name: &'static str) -> Result<Option<usize>, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { name, value }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WorkerPoolConfig::default();
        assert!(config.pool_id.starts_with("pool-"));
        assert!(config.workers >= 1);
        assert_eq!(config.queue_capacity, None);
        assert_eq!(config.effective_queue_capacity(), config.workers * 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = WorkerPoolConfig::new(4)
            .with_pool_id("factorials")
            .with_queue_capacity(16);

        assert_eq!(config.pool_id, "factorials");
        assert_eq!(config.workers, 4);
        assert_eq!(config.effective_queue_capacity(), 16);
    }

    #[test]
    fn test_builder_clamps_zero() {
        let config = WorkerPoolConfig::new(0).with_queue_capacity(0);
        assert_eq!(config.workers, 1);
        assert_eq!(config.queue_capacity, Some(1));
    }

    #[test]
    fn test_validation_rejects_zero_workers() {
        let config = WorkerPoolConfig {
            workers: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_config_deserialization_defaults_capacity() {
        let config: WorkerPoolConfig =
            serde_json::from_str(r#"{"pool_id":"p","workers":3}"#).unwrap();
        assert_eq!(config.queue_capacity, None);
        assert_eq!(config.effective_queue_capacity(), 6);
    }

    #[test]
    fn test_parse_env_missing_is_none() {
        assert_eq!(parse_env("WORKPOOL_TEST_UNSET_VARIABLE").unwrap(), None);
    }

    // Single test so the process environment is not mutated concurrently
    #[test]
    fn test_from_env() {
        std::env::set_var(ENV_WORKERS, "3");
        std::env::set_var(ENV_QUEUE_CAPACITY, " 7 ");
        let config = WorkerPoolConfig::from_env().unwrap();
        assert_eq!(config.workers, 3);
        assert_eq!(config.effective_queue_capacity(), 7);

        std::env::set_var(ENV_WORKERS, "many");
        let err = WorkerPoolConfig::from_env().unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidEnv {
                name: ENV_WORKERS,
                value: "many".to_string()
            }
        );

        std::env::remove_var(ENV_WORKERS);
        std::env::remove_var(ENV_QUEUE_CAPACITY);
        let config = WorkerPoolConfig::from_env().unwrap();
        assert_eq!(config.workers, default_workers());
        assert_eq!(config.queue_capacity, None);
    }
}
