//! # Workpool
//!
//! A generic concurrent task executor: a bounded task queue, a fixed-size pool
//! of tokio workers running a caller-supplied handler, and a result stream
//! that tags every outcome with the id of the task that produced it.
//!
//! ## Features
//!
//! - **Backpressure**: `submit` suspends while the queue is full
//! - **No cascading failure**: handler errors and panics become failed results
//! - **Graceful shutdown**: `close` drains every queued task before returning
//! - **Cooperative cancellation**: handlers observe a shared token
//! - **Patterns**: map-reduce, fan-out/fan-in, producer/consumer
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        TaskQueue                             │
//! │  (bounded FIFO, suspends submitters when full)              │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       WorkerPool                             │
//! │  (N workers, one handler call per task, panic recovery)     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      ResultStream                            │
//! │  (completion order, ends after close() and drain)           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use workpool::prelude::*;
//!
//! let pool = WorkerPool::new(WorkerPoolConfig::new(4));
//! let results = pool.results()?;
//!
//! pool.start(|task: Task<u32, String>, _ctx: TaskContext| async move {
//!     if task.payload.is_empty() {
//!         return Err(TaskError::failed("empty payload"));
//!     }
//!     Ok(task.payload.len())
//! })?;
//!
//! pool.submit(Task::new(1, "hello".to_string())).await?;
//! pool.close().await?;
//!
//! for result in results.collect_all().await {
//!     println!("{:?}: {:?}", result.task_id, result.outcome);
//! }
//! ```

pub mod collector;
pub mod error;
pub mod patterns;
pub mod pool;
pub mod queue;
pub mod result;
pub mod task;

/// Prelude for common imports
pub mod prelude {
    pub use crate::collector::{summarize, ResultStream, ResultSummary};
    pub use crate::error::{PoolError, TrySubmitError};
    pub use crate::patterns::{fan_out_fan_in, map_reduce, producer_consumer};
    pub use crate::pool::{PoolStats, WorkerPool, WorkerPoolConfig, WorkerPoolStatus};
    pub use crate::result::{TaskError, TaskErrorKind, TaskResult};
    pub use crate::task::{Task, TaskContext};
}

// Re-export key types at crate root
pub use collector::{summarize, ResultStream, ResultSummary};
pub use error::{PoolError, TrySubmitError};
pub use pool::{ConfigError, PoolStats, WorkerPool, WorkerPoolConfig, WorkerPoolStatus};
pub use result::{TaskError, TaskErrorKind, TaskResult};
pub use task::{Task, TaskContext};
