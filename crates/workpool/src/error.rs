//! Pool-level errors
//!
//! Per-task failures never show up here; they are captured on the
//! [`TaskResult`](crate::TaskResult) as a [`TaskError`](crate::TaskError).

use crate::pool::ConfigError;
use crate::task::Task;

/// Worker pool errors
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// Submission attempted after close was initiated
    #[error("task queue is closed")]
    QueueClosed,

    /// Submission attempted before the pool was started
    #[error("worker pool has not been started")]
    NotStarted,

    /// Start called on a pool that is already running
    #[error("worker pool is already running")]
    AlreadyStarted,

    /// Start called on a pool that has been closed
    #[error("worker pool has been stopped")]
    AlreadyStopped,

    /// The result stream was already handed out
    #[error("result stream has already been taken")]
    ResultsTaken,

    /// A worker task could not be joined
    #[error("worker join error: {0}")]
    WorkerJoin(String),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl PoolError {
    /// Whether the error stems from calling the pool API out of order
    pub fn is_misuse(&self) -> bool {
        matches!(
            self,
            Self::NotStarted | Self::AlreadyStarted | Self::AlreadyStopped | Self::ResultsTaken
        )
    }
}

/// Error from [`WorkerPool::try_submit`](crate::WorkerPool::try_submit)
///
/// Every variant hands the rejected task back to the caller.
#[derive(thiserror::Error)]
pub enum TrySubmitError<I, P> {
    /// The queue is at capacity
    #[error("task queue is full")]
    Full(Task<I, P>),

    /// The queue has been closed
    #[error("task queue is closed")]
    Closed(Task<I, P>),

    /// The pool has not been started
    #[error("worker pool has not been started")]
    NotStarted(Task<I, P>),
}

impl<I, P> TrySubmitError<I, P> {
    /// Take back the task that could not be submitted
    pub fn into_task(self) -> Task<I, P> {
        match self {
            Self::Full(task) | Self::Closed(task) | Self::NotStarted(task) => task,
        }
    }
}

impl<I, P> std::fmt::Debug for TrySubmitError<I, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Full(_) => write!(f, "Full(..)"),
            Self::Closed(_) => write!(f, "Closed(..)"),
            Self::NotStarted(_) => write!(f, "NotStarted(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_misuse_classification() {
        assert!(PoolError::NotStarted.is_misuse());
        assert!(PoolError::AlreadyStarted.is_misuse());
        assert!(PoolError::ResultsTaken.is_misuse());
        assert!(!PoolError::QueueClosed.is_misuse());
        assert!(!PoolError::WorkerJoin("boom".into()).is_misuse());
    }

    #[test]
    fn test_try_submit_error_returns_task() {
        let err = TrySubmitError::Full(Task::new(3, "payload"));
        assert_eq!(err.to_string(), "task queue is full");
        assert_eq!(format!("{err:?}"), "Full(..)");

        let task = err.into_task();
        assert_eq!(task.id, 3);
    }
}
