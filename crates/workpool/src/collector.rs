//! Result collection
//!
//! Workers publish into a [`ResultSink`]; the caller drains the matching
//! [`ResultStream`]. Results arrive in completion order, which differs from
//! submission order whenever more than one worker is running. Callers that
//! need submission order sort downstream, e.g. with
//! [`ResultStream::collect_sorted_by_id`].

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::result::TaskResult;

/// Create a connected sink/stream pair
pub(crate) fn channel<I, O>() -> (ResultSink<I, O>, ResultStream<I, O>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        ResultSink { tx },
        ResultStream {
            inner: UnboundedReceiverStream::new(rx),
        },
    )
}

/// Publishing side held by workers
///
/// The stream closes once every sink clone has been dropped.
pub(crate) struct ResultSink<I, O> {
    tx: mpsc::UnboundedSender<TaskResult<I, O>>,
}

impl<I, O> Clone for ResultSink<I, O> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<I, O> ResultSink<I, O> {
    /// Publish a result
    ///
    /// Returns `false` if the consumer dropped the stream; the result is
    /// discarded in that case.
    pub(crate) fn publish(&self, result: TaskResult<I, O>) -> bool {
        self.tx.send(result).is_ok()
    }
}

/// Stream of results produced by a pool
///
/// Terminates once the pool is closed and every result has been drained.
/// After that it stays terminated.
///
/// # Example
///
/// ```ignore
/// use futures::StreamExt;
///
/// let mut results = pool.results()?;
/// pool.close().await?;
///
/// while let Some(result) = results.next().await {
///     match result.outcome {
///         Ok(value) => println!("task {} -> {}", result.task_id, value),
///         Err(err) => println!("task {} failed: {}", result.task_id, err),
///     }
/// }
/// ```
pub struct ResultStream<I, O> {
    inner: UnboundedReceiverStream<TaskResult<I, O>>,
}

impl<I, O> ResultStream<I, O> {
    /// Wait for the next result
    ///
    /// Returns `None` once the pool is stopped and the stream is drained.
    pub async fn recv(&mut self) -> Option<TaskResult<I, O>> {
        self.inner.as_mut().recv().await
    }

    /// Drain every remaining result
    ///
    /// Only completes after the pool has been closed.
    pub async fn collect_all(mut self) -> Vec<TaskResult<I, O>> {
        let mut results = Vec::new();
        while let Some(result) = self.recv().await {
            results.push(result);
        }
        results
    }

    /// Drain every remaining result and sort by task id
    pub async fn collect_sorted_by_id(self) -> Vec<TaskResult<I, O>>
    where
        I: Ord,
    {
        let mut results = self.collect_all().await;
        results.sort_by(|a, b| a.task_id.cmp(&b.task_id));
        results
    }
}

impl<I, O> Stream for ResultStream<I, O> {
    type Item = TaskResult<I, O>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

/// Success/failure counts over a set of results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSummary {
    /// Results carrying a value
    pub succeeded: usize,

    /// Results carrying an error
    pub failed: usize,
}

impl ResultSummary {
    /// Total number of results
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Count successes and failures
pub fn summarize<'a, I: 'a, O: 'a>(
    results: impl IntoIterator<Item = &'a TaskResult<I, O>>,
) -> ResultSummary {
    results
        .into_iter()
        .fold(ResultSummary::default(), |mut summary, result| {
            if result.is_success() {
                summary.succeeded += 1;
            } else {
                summary.failed += 1;
            }
            summary
        })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;
    use futures::StreamExt;

    use super::*;
    use crate::result::TaskError;

    fn result(task_id: u32, outcome: Result<u32, TaskError>) -> TaskResult<u32, u32> {
        TaskResult {
            task_id,
            outcome,
            worker_id: 0,
            completed_at: Utc::now(),
            duration: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn test_stream_ends_when_sinks_dropped() {
        let (sink, mut stream) = channel::<u32, u32>();
        let other = sink.clone();

        assert!(sink.publish(result(1, Ok(1))));
        drop(sink);
        assert!(other.publish(result(2, Ok(2))));
        drop(other);

        assert_eq!(stream.recv().await.map(|r| r.task_id), Some(1));
        assert_eq!(stream.next().await.map(|r| r.task_id), Some(2));
        assert!(stream.recv().await.is_none());
        assert!(stream.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_collect_sorted_by_id() {
        let (sink, stream) = channel::<u32, u32>();
        for id in [3, 1, 2] {
            sink.publish(result(id, Ok(id * 2)));
        }
        drop(sink);

        let ids: Vec<u32> = stream
            .collect_sorted_by_id()
            .await
            .into_iter()
            .map(|r| r.task_id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_publish_after_stream_dropped() {
        let (sink, stream) = channel::<u32, u32>();
        drop(stream);
        assert!(!sink.publish(result(1, Ok(1))));
    }

    #[test]
    fn test_summarize() {
        let results = vec![
            result(1, Ok(1)),
            result(2, Err(TaskError::failed("even"))),
            result(3, Ok(3)),
        ];

        let summary = summarize(&results);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.total(), 3);
    }
}
