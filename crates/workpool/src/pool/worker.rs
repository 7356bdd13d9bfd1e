//! Worker loop

use std::fmt::Debug;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::future::BoxFuture;
use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::stats::PoolCounters;
use crate::collector::ResultSink;
use crate::queue::QueueReceiver;
use crate::result::{TaskError, TaskResult};
use crate::task::{Task, TaskContext};

/// Task handler function type
pub type TaskHandler<I, P, O> = Arc<
    dyn Fn(Task<I, P>, TaskContext) -> BoxFuture<'static, Result<O, TaskError>> + Send + Sync,
>;

/// One execution unit of the pool
pub(crate) struct Worker<I, P, O> {
    pub(crate) id: usize,
    pub(crate) pool_id: String,
    pub(crate) queue: QueueReceiver<I, P>,
    pub(crate) sink: ResultSink<I, O>,
    pub(crate) handler: TaskHandler<I, P, O>,
    pub(crate) counters: Arc<PoolCounters>,
    pub(crate) cancellation: CancellationToken,
}

impl<I, P, O> Worker<I, P, O>
where
    I: Clone + Debug + Send + 'static,
    P: Send + 'static,
    O: Send + 'static,
{
    /// Process tasks until the queue is closed and drained
    ///
    /// Returns the number of tasks this worker processed.
    pub(crate) async fn run(self) -> usize {
        debug!(pool_id = %self.pool_id, worker_id = self.id, "Worker started");

        let mut processed = 0;
        while let Some(task) = self.queue.next().await {
            debug!(worker_id = self.id, task_id = ?task.id, "Worker processing task");

            let result = self.execute(task).await;
            processed += 1;

            if !self.sink.publish(result) {
                debug!(worker_id = self.id, "Result stream dropped, discarding result");
            }
        }

        debug!(pool_id = %self.pool_id, worker_id = self.id, processed, "Worker exited");
        processed
    }

    async fn execute(&self, task: Task<I, P>) -> TaskResult<I, O> {
        let task_id = task.id.clone();
        let ctx = TaskContext::new(self.id, self.pool_id.clone(), self.cancellation.clone());
        let handler = Arc::clone(&self.handler);

        self.counters.task_started();
        let started = Instant::now();

        // The handler call sits inside the future so a panic while building
        // the future is caught as well.
        let outcome = match AssertUnwindSafe(async move { handler(task, ctx).await })
            .catch_unwind()
            .await
        {
            Ok(outcome) => outcome,
            Err(payload) => {
                let err = TaskError::from_panic(payload);
                warn!(
                    worker_id = self.id,
                    task_id = ?task_id,
                    error = %err,
                    "Task handler panicked"
                );
                Err(err)
            }
        };

        let duration = started.elapsed();
        self.counters
            .task_finished(outcome.as_ref().err().map(|err| err.kind));

        if let Err(err) = &outcome {
            debug!(
                worker_id = self.id,
                task_id = ?task_id,
                kind = %err.kind,
                error = %err,
                "Task failed"
            );
        }

        TaskResult {
            task_id,
            outcome,
            worker_id: self.id,
            completed_at: Utc::now(),
            duration,
        }
    }
}
