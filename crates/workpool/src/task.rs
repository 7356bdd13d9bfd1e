//! Task definition and execution context

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// A unit of work submitted to a [`WorkerPool`](crate::WorkerPool)
///
/// The `id` is assigned by the caller and echoed back on the matching
/// [`TaskResult`](crate::TaskResult). Uniqueness is not enforced: two tasks
/// with the same id are processed independently and yield two results.
///
/// The `payload` is opaque to the pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task<I, P> {
    /// Caller-assigned identifier
    pub id: I,

    /// Caller-defined data handed to the task handler
    pub payload: P,
}

impl<I, P> Task<I, P> {
    /// Create a new task
    pub fn new(id: I, payload: P) -> Self {
        Self { id, payload }
    }

    /// Split the task into its id and payload
    pub fn into_parts(self) -> (I, P) {
        (self.id, self.payload)
    }
}

impl<I, P> From<(I, P)> for Task<I, P> {
    fn from((id, payload): (I, P)) -> Self {
        Self::new(id, payload)
    }
}

/// Context handed to the task handler alongside each task
///
/// Cancellation is cooperative: the pool never interrupts a running handler.
/// Long-running handlers should check [`TaskContext::is_cancelled`] or race
/// their work against [`TaskContext::cancelled`].
///
/// # Example
///
/// ```ignore
/// pool.start(|task: Task<u32, u64>, ctx: TaskContext| async move {
///     for step in 0..task.payload {
///         if ctx.is_cancelled() {
///             return Err(TaskError::cancelled("pool cancelled"));
///         }
///         do_step(step).await;
///     }
///     Ok(task.payload)
/// })?;
/// ```
#[derive(Debug, Clone)]
pub struct TaskContext {
    /// Index of the worker running the task (0-based)
    pub worker_id: usize,

    /// Pool that owns the worker
    pub pool_id: String,

    cancellation: CancellationToken,
}

impl TaskContext {
    pub(crate) fn new(worker_id: usize, pool_id: String, cancellation: CancellationToken) -> Self {
        Self {
            worker_id,
            pool_id,
            cancellation,
        }
    }

    /// Check whether the pool has requested cancellation
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Wait until the pool requests cancellation
    pub async fn cancelled(&self) {
        self.cancellation.cancelled().await
    }

    /// Token shared by every task of the pool
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }
}
