//! Worker pool for task execution
//!
//! This module provides:
//! - [`WorkerPool`] - Fixed-size pool running a caller-supplied handler
//! - [`WorkerPoolConfig`] - Worker count and queue capacity
//! - [`PoolStats`] - Snapshot of pool activity
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       WorkerPool                             │
//! │                                                              │
//! │   submit() ──► ┌──────────────────────────────┐              │
//! │                │   TaskQueue (bounded, FIFO)  │              │
//! │                └──────────────┬───────────────┘              │
//! │                               │                              │
//! │            ┌──────────────────┼──────────────────┐           │
//! │            ▼                  ▼                  ▼           │
//! │      [Worker 0]         [Worker 1]   ...   [Worker N-1]      │
//! │            │                  │                  │           │
//! │            └──────────────────┼──────────────────┘           │
//! │                               ▼                              │
//! │                ┌──────────────────────────────┐              │
//! │                │  ResultSink ──► ResultStream │ ──► results() │
//! │                └──────────────────────────────┘              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Lifecycle
//!
//! `Created` ──start()──► `Running` ──close()──► `Draining` ──► `Stopped`
//!
//! A stopped pool cannot be restarted; create a new one instead.

mod config;
mod stats;
mod worker;

use std::fmt::Debug;
use std::future::Future;
use std::sync::{Arc, Mutex};

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

pub use config::{default_workers, ConfigError, WorkerPoolConfig, ENV_QUEUE_CAPACITY, ENV_WORKERS};
pub use stats::PoolStats;
pub use worker::TaskHandler;

use self::stats::PoolCounters;
use self::worker::Worker;
use crate::collector::{self, ResultSink, ResultStream};
use crate::error::{PoolError, TrySubmitError};
use crate::queue::TaskQueue;
use crate::result::{TaskError, TaskResult};
use crate::task::{Task, TaskContext};

/// Worker pool status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerPoolStatus {
    /// Pool built, workers not spawned yet
    Created,
    /// Workers are running and the queue accepts tasks
    Running,
    /// Queue closed, workers finishing buffered and in-flight tasks
    Draining,
    /// All workers exited and the result stream is closed
    Stopped,
}

impl std::fmt::Display for WorkerPoolStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Running => write!(f, "running"),
            Self::Draining => write!(f, "draining"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// Fixed-size pool of concurrent workers
///
/// `I` is the task id type, `P` the payload type and `O` the handler's
/// output type. Workers are tokio tasks, so [`WorkerPool::start`] must be
/// called from within a tokio runtime.
///
/// # Example
///
/// ```ignore
/// use workpool::prelude::*;
///
/// let pool = WorkerPool::new(WorkerPoolConfig::new(4));
/// let results = pool.results()?;
///
/// pool.start(|task: Task<u32, u64>, _ctx: TaskContext| async move {
///     Ok((1..=task.payload).product::<u64>())
/// })?;
///
/// for (id, n) in [(1, 3), (2, 1), (3, 2)] {
///     pool.submit(Task::new(id, n)).await?;
/// }
///
/// // Graceful shutdown: waits for every queued task
/// pool.close().await?;
///
/// let results = results.collect_sorted_by_id().await;
/// ```
pub struct WorkerPool<I, P, O> {
    config: WorkerPoolConfig,
    queue: TaskQueue<I, P>,
    sink: Mutex<Option<ResultSink<I, O>>>,
    results: Mutex<Option<ResultStream<I, O>>>,
    status: Arc<watch::Sender<WorkerPoolStatus>>,
    join_error: Arc<Mutex<Option<String>>>,
    counters: Arc<PoolCounters>,
    cancellation: CancellationToken,
}

impl<I, P, O> WorkerPool<I, P, O>
where
    I: Clone + Debug + Send + 'static,
    P: Send + 'static,
    O: Send + 'static,
{
    /// Create a new worker pool
    pub fn new(config: WorkerPoolConfig) -> Self {
        let queue = TaskQueue::new(config.effective_queue_capacity());
        let (sink, results) = collector::channel();
        let (status, _) = watch::channel(WorkerPoolStatus::Created);

        Self {
            config,
            queue,
            sink: Mutex::new(Some(sink)),
            results: Mutex::new(Some(results)),
            status: Arc::new(status),
            join_error: Arc::new(Mutex::new(None)),
            counters: Arc::new(PoolCounters::default()),
            cancellation: CancellationToken::new(),
        }
    }

    /// Create a pool after validating its configuration
    pub fn try_new(config: WorkerPoolConfig) -> Result<Self, PoolError> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Spawn the workers
    ///
    /// Exactly `config.workers` workers are spawned. Each one repeatedly takes
    /// the next task, runs `handler` on it and publishes the result. Handler
    /// errors and panics are captured on the result; the worker keeps going.
    #[instrument(skip(self, handler), fields(pool_id = %self.config.pool_id))]
    pub fn start<F, Fut>(&self, handler: F) -> Result<(), PoolError>
    where
        F: Fn(Task<I, P>, TaskContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, TaskError>> + Send + 'static,
    {
        let mut outcome = Ok(());
        self.status.send_if_modified(|status| match *status {
            WorkerPoolStatus::Created => {
                *status = WorkerPoolStatus::Running;
                true
            }
            WorkerPoolStatus::Running => {
                outcome = Err(PoolError::AlreadyStarted);
                false
            }
            WorkerPoolStatus::Draining | WorkerPoolStatus::Stopped => {
                outcome = Err(PoolError::AlreadyStopped);
                false
            }
        });
        outcome?;

        let sink = self
            .sink
            .lock()
            .unwrap()
            .take()
            .ok_or(PoolError::AlreadyStopped)?;

        let handler: TaskHandler<I, P, O> =
            Arc::new(move |task: Task<I, P>, ctx: TaskContext| handler(task, ctx).boxed());

        info!(
            pool_id = %self.config.pool_id,
            workers = self.config.workers,
            queue_capacity = self.queue.capacity(),
            "Starting worker pool"
        );

        let mut workers = Vec::with_capacity(self.config.workers);
        for id in 0..self.config.workers {
            let worker = Worker {
                id,
                pool_id: self.config.pool_id.clone(),
                queue: self.queue.receiver(),
                sink: sink.clone(),
                handler: Arc::clone(&handler),
                counters: Arc::clone(&self.counters),
                cancellation: self.cancellation.clone(),
            };
            workers.push(tokio::spawn(worker.run()));
        }

        // Workers now hold the only sinks; the stream ends when they exit
        drop(sink);

        tokio::spawn(supervise(
            self.config.pool_id.clone(),
            workers,
            Arc::clone(&self.status),
            Arc::clone(&self.join_error),
            Arc::clone(&self.counters),
        ));
        Ok(())
    }

    /// Submit a task, waiting while the queue is full
    pub async fn submit(&self, task: Task<I, P>) -> Result<(), PoolError> {
        match self.status() {
            WorkerPoolStatus::Created => return Err(PoolError::NotStarted),
            WorkerPoolStatus::Running => {}
            WorkerPoolStatus::Draining | WorkerPoolStatus::Stopped => {
                return Err(PoolError::QueueClosed)
            }
        }

        self.queue.submit(task).await?;
        self.counters.task_submitted();
        Ok(())
    }

    /// Submit a task without waiting
    pub fn try_submit(&self, task: Task<I, P>) -> Result<(), TrySubmitError<I, P>> {
        match self.status() {
            WorkerPoolStatus::Created => return Err(TrySubmitError::NotStarted(task)),
            WorkerPoolStatus::Running => {}
            WorkerPoolStatus::Draining | WorkerPoolStatus::Stopped => {
                return Err(TrySubmitError::Closed(task))
            }
        }

        self.queue.try_submit(task)?;
        self.counters.task_submitted();
        Ok(())
    }

    /// Take the result stream
    ///
    /// The stream can be taken once, before or after [`start`](Self::start).
    pub fn results(&self) -> Result<ResultStream<I, O>, PoolError> {
        self.results
            .lock()
            .unwrap()
            .take()
            .ok_or(PoolError::ResultsTaken)
    }

    /// Shut the pool down gracefully
    ///
    /// Closes the queue, waits for every worker to drain it and exit, then
    /// closes the result stream. No result is published after this returns.
    ///
    /// Calling it again, or concurrently, waits for the same shutdown. The
    /// move to `Stopped` does not depend on this future being polled, so a
    /// call abandoned mid-drain (e.g. under a timeout) can simply be retried.
    #[instrument(skip(self), fields(pool_id = %self.config.pool_id))]
    pub async fn close(&self) -> Result<(), PoolError> {
        let mut previous = WorkerPoolStatus::Created;
        self.status.send_if_modified(|status| {
            previous = *status;
            match *status {
                WorkerPoolStatus::Created => {
                    *status = WorkerPoolStatus::Stopped;
                    true
                }
                WorkerPoolStatus::Running => {
                    *status = WorkerPoolStatus::Draining;
                    true
                }
                WorkerPoolStatus::Draining | WorkerPoolStatus::Stopped => false,
            }
        });

        match previous {
            WorkerPoolStatus::Created => {
                self.queue.close();
                drop(self.sink.lock().unwrap().take());
                info!(pool_id = %self.config.pool_id, "Worker pool closed before start");
                return Ok(());
            }
            WorkerPoolStatus::Running => {
                info!(pool_id = %self.config.pool_id, "Initiating graceful shutdown");
                self.queue.close();
            }
            WorkerPoolStatus::Draining | WorkerPoolStatus::Stopped => {
                debug!(status = %previous, "Shutdown already in progress, waiting");
            }
        }

        // The supervisor publishes Stopped once every worker has exited
        let mut status = self.status.subscribe();
        let _ = status
            .wait_for(|status| *status == WorkerPoolStatus::Stopped)
            .await;

        match self.join_error.lock().unwrap().clone() {
            Some(message) => Err(PoolError::WorkerJoin(message)),
            None => Ok(()),
        }
    }

    /// Run a batch of tasks to completion on a fresh pool
    ///
    /// Results are returned in completion order.
    pub async fn run_batch<F, Fut>(
        config: WorkerPoolConfig,
        tasks: impl IntoIterator<Item = Task<I, P>>,
        handler: F,
    ) -> Result<Vec<TaskResult<I, O>>, PoolError>
    where
        F: Fn(Task<I, P>, TaskContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, TaskError>> + Send + 'static,
    {
        let pool = Self::try_new(config)?;
        let results = pool.results()?;
        pool.start(handler)?;

        for task in tasks {
            pool.submit(task).await?;
        }
        pool.close().await?;

        Ok(results.collect_all().await)
    }
}

impl<I, P, O> WorkerPool<I, P, O> {
    /// Get current status
    pub fn status(&self) -> WorkerPoolStatus {
        *self.status.borrow()
    }

    /// Subscribe to status changes
    pub fn status_receiver(&self) -> watch::Receiver<WorkerPoolStatus> {
        self.status.subscribe()
    }

    /// Whether `submit` currently accepts tasks
    pub fn is_accepting(&self) -> bool {
        self.status() == WorkerPoolStatus::Running && !self.queue.is_closed()
    }

    /// Get a snapshot of the pool counters
    pub fn stats(&self) -> PoolStats {
        self.counters.snapshot()
    }

    /// Number of tasks waiting in the queue
    pub fn pending(&self) -> usize {
        self.queue.pending()
    }

    /// Get the configuration
    pub fn config(&self) -> &WorkerPoolConfig {
        &self.config
    }

    /// Get the pool ID
    pub fn pool_id(&self) -> &str {
        &self.config.pool_id
    }

    /// Request cooperative cancellation
    ///
    /// Handlers observe it through [`TaskContext`]. Workers keep draining the
    /// queue; call [`close`](Self::close) to shut the pool down.
    pub fn cancel(&self) {
        info!(pool_id = %self.config.pool_id, "Cancellation requested");
        self.cancellation.cancel();
    }

    /// Token cancelled by [`cancel`](Self::cancel)
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }
}

/// Join every worker, then mark the pool stopped
///
/// Workers exit once the queue is closed and drained, or once the pool is
/// dropped. By then every result sink is gone, so `Stopped` always implies a
/// closed result stream.
async fn supervise(
    pool_id: String,
    workers: Vec<JoinHandle<usize>>,
    status: Arc<watch::Sender<WorkerPoolStatus>>,
    join_error: Arc<Mutex<Option<String>>>,
    counters: Arc<PoolCounters>,
) {
    for handle in workers {
        match handle.await {
            Ok(processed) => debug!(pool_id = %pool_id, processed, "Worker joined"),
            Err(e) => {
                error!(pool_id = %pool_id, "Worker join failed: {}", e);
                join_error
                    .lock()
                    .unwrap()
                    .get_or_insert_with(|| e.to_string());
            }
        }
    }

    status.send_replace(WorkerPoolStatus::Stopped);

    let stats = counters.snapshot();
    info!(
        pool_id = %pool_id,
        completed = stats.completed,
        failed = stats.failed,
        "Worker pool stopped"
    );
}
