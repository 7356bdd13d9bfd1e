//! Task results and per-task errors

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why a task failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskErrorKind {
    /// The handler returned an error
    Failed,

    /// The handler panicked; the worker recovered and kept running
    Panicked,

    /// The handler observed pool cancellation and gave up
    Cancelled,
}

impl std::fmt::Display for TaskErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Failed => write!(f, "failed"),
            Self::Panicked => write!(f, "panicked"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Error captured in a [`TaskResult`] when a task does not succeed
///
/// Task errors are never escalated: they are recorded on the result and the
/// worker moves on to the next task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskError {
    /// Error message
    pub message: String,

    /// Failure category
    pub kind: TaskErrorKind,

    /// Additional error details (for debugging)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl TaskError {
    /// Create an error for a handler that returned a failure
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: TaskErrorKind::Failed,
            details: None,
        }
    }

    /// Create an error for a handler that panicked
    pub fn panicked(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: TaskErrorKind::Panicked,
            details: None,
        }
    }

    /// Create an error for a handler that stopped on cancellation
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: TaskErrorKind::Cancelled,
            details: None,
        }
    }

    /// Add error details
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Build a panic error from a caught panic payload
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "task handler panicked".to_string()
        };
        Self::panicked(message)
    }
}

impl std::fmt::Display for TaskError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TaskError {}

impl From<anyhow::Error> for TaskError {
    fn from(err: anyhow::Error) -> Self {
        Self::failed(format!("{err:#}"))
    }
}

impl From<String> for TaskError {
    fn from(message: String) -> Self {
        Self::failed(message)
    }
}

impl From<&str> for TaskError {
    fn from(message: &str) -> Self {
        Self::failed(message)
    }
}

/// Outcome of processing exactly one [`Task`](crate::Task)
///
/// `outcome` holds either the handler's value or its error, never both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult<I, O> {
    /// Id of the task that produced this result
    pub task_id: I,

    /// Handler output or captured error
    pub outcome: Result<O, TaskError>,

    /// Index of the worker that ran the task
    pub worker_id: usize,

    /// When the worker finished the task
    pub completed_at: DateTime<Utc>,

    /// Time spent inside the handler
    #[serde(with = "duration_millis")]
    pub duration: Duration,
}

impl<I, O> TaskResult<I, O> {
    /// Whether the handler succeeded
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// The handler's value, if it succeeded
    pub fn value(&self) -> Option<&O> {
        self.outcome.as_ref().ok()
    }

    /// The captured error, if the handler failed
    pub fn error(&self) -> Option<&TaskError> {
        self.outcome.as_ref().err()
    }

    /// Consume the result, keeping only the outcome
    pub fn into_result(self) -> Result<O, TaskError> {
        self.outcome
    }
}

/// Serde support for Duration as milliseconds
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with(outcome: Result<u64, TaskError>) -> TaskResult<u32, u64> {
        TaskResult {
            task_id: 1,
            outcome,
            worker_id: 0,
            completed_at: Utc::now(),
            duration: Duration::from_millis(12),
        }
    }

    #[test]
    fn test_success_has_value_and_no_error() {
        let result = result_with(Ok(6));
        assert!(result.is_success());
        assert_eq!(result.value(), Some(&6));
        assert!(result.error().is_none());
    }

    #[test]
    fn test_failure_has_error_and_no_value() {
        let result = result_with(Err(TaskError::failed("boom")));
        assert!(!result.is_success());
        assert!(result.value().is_none());
        assert_eq!(result.error().map(|e| e.kind), Some(TaskErrorKind::Failed));
        assert_eq!(result.into_result().unwrap_err().to_string(), "boom");
    }

    #[test]
    fn test_error_conversions() {
        let from_str: TaskError = "bad input".into();
        assert_eq!(from_str.kind, TaskErrorKind::Failed);

        let from_anyhow: TaskError = anyhow::anyhow!("disk full").into();
        assert_eq!(from_anyhow.message, "disk full");
    }

    #[test]
    fn test_panic_payload_message() {
        let err = TaskError::from_panic(Box::new("index out of bounds"));
        assert_eq!(err.kind, TaskErrorKind::Panicked);
        assert_eq!(err.message, "index out of bounds");

        let err = TaskError::from_panic(Box::new(42_u8));
        assert_eq!(err.message, "task handler panicked");
    }

    #[test]
    fn test_result_serialization() {
        let result = result_with(Err(
            TaskError::cancelled("stopped").with_details(serde_json::json!({"step": 3}))
        ));

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["duration"], 12);
        assert_eq!(json["outcome"]["Err"]["kind"], "cancelled");

        let parsed: TaskResult<u32, u64> = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.error(), result.error());
    }
}
