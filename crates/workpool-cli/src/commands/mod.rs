// Example commands

pub mod patterns;
pub mod pool;

use anyhow::Result;
use workpool::WorkerPoolConfig;

use crate::output::OutputFormat;

/// Pool overrides shared by every example
#[derive(Debug, Clone, Default)]
pub struct PoolSettings {
    pub workers: Option<usize>,
    pub queue_capacity: Option<usize>,
}

impl PoolSettings {
    /// Build a pool config, falling back to the example's own worker count
    pub fn config(&self, example: &str, default_workers: usize) -> WorkerPoolConfig {
        let config = WorkerPoolConfig::new(self.workers.unwrap_or(default_workers))
            .with_pool_id(format!("{}-pool", example));

        match self.queue_capacity {
            Some(capacity) => config.with_queue_capacity(capacity),
            None => config,
        }
    }
}

/// Run a shorter version of every example
pub async fn all(settings: &PoolSettings, output: OutputFormat) -> Result<()> {
    if output.is_text() {
        println!("Running all concurrency examples...");
    }

    patterns::mapreduce(settings, output).await?;
    patterns::prodcons(output).await?;
    patterns::fanout(settings, output).await?;
    pool::quick(settings, output).await
}
