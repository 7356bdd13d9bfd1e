//! Bounded FIFO task queue
//!
//! Decouples the submission rate from the processing rate. Submitters
//! suspend while the buffer is full; workers suspend while it is empty and
//! still open. Closing the queue rejects further submissions but keeps
//! everything already buffered available to the workers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::debug;

use crate::error::{PoolError, TrySubmitError};
use crate::task::Task;

/// Intake side of the pool
pub struct TaskQueue<I, P> {
    sender: Mutex<Option<mpsc::Sender<Task<I, P>>>>,
    receiver: QueueReceiver<I, P>,
    capacity: usize,
    closed: AtomicBool,
}

impl<I, P> TaskQueue<I, P> {
    /// Create a queue holding at most `capacity` pending tasks
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);

        Self {
            sender: Mutex::new(Some(tx)),
            receiver: QueueReceiver {
                inner: Arc::new(tokio::sync::Mutex::new(rx)),
            },
            capacity,
            closed: AtomicBool::new(false),
        }
    }

    /// Enqueue a task, waiting for a free slot if the buffer is full
    pub async fn submit(&self, task: Task<I, P>) -> Result<(), PoolError> {
        let sender = self.sender().ok_or(PoolError::QueueClosed)?;
        sender
            .send(task)
            .await
            .map_err(|_| PoolError::QueueClosed)
    }

    /// Enqueue a task without waiting
    pub fn try_submit(&self, task: Task<I, P>) -> Result<(), TrySubmitError<I, P>> {
        let Some(sender) = self.sender() else {
            return Err(TrySubmitError::Closed(task));
        };

        sender.try_send(task).map_err(|err| match err {
            TrySendError::Full(task) => TrySubmitError::Full(task),
            TrySendError::Closed(task) => TrySubmitError::Closed(task),
        })
    }

    /// Stop accepting tasks
    ///
    /// Returns `true` if this call closed the queue.
    pub fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::SeqCst) {
            return false;
        }
        let dropped = self.sender.lock().unwrap().take();
        debug!(capacity = self.capacity, "Task queue closed");
        drop(dropped);
        true
    }

    /// Whether the queue has been closed
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Maximum number of buffered tasks
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of tasks waiting to be picked up
    ///
    /// Reports zero once the queue is closed.
    pub fn pending(&self) -> usize {
        match self.sender.lock().unwrap().as_ref() {
            Some(sender) => sender.max_capacity() - sender.capacity(),
            None => 0,
        }
    }

    pub(crate) fn receiver(&self) -> QueueReceiver<I, P> {
        self.receiver.clone()
    }

    fn sender(&self) -> Option<mpsc::Sender<Task<I, P>>> {
        if self.is_closed() {
            return None;
        }
        self.sender.lock().unwrap().clone()
    }
}

/// Consumer handle shared by every worker
///
/// The receiver sits behind a fair async mutex, so waiting workers are served
/// in turn and tasks leave the queue in submission order.
pub(crate) struct QueueReceiver<I, P> {
    inner: Arc<tokio::sync::Mutex<mpsc::Receiver<Task<I, P>>>>,
}

impl<I, P> Clone for QueueReceiver<I, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<I, P> QueueReceiver<I, P> {
    /// Next task, or `None` once the queue is closed and drained
    pub(crate) async fn next(&self) -> Option<Task<I, P>> {
        self.inner.lock().await.recv().await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_fifo_order() {
        let queue = TaskQueue::new(4);
        for id in 1..=3 {
            queue.submit(Task::new(id, id * 10)).await.unwrap();
        }
        assert_eq!(queue.pending(), 3);
        queue.close();

        let rx = queue.receiver();
        let mut seen = Vec::new();
        while let Some(task) = rx.next().await {
            seen.push(task.id);
        }
        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_submit_after_close_fails() {
        let queue: TaskQueue<u32, ()> = TaskQueue::new(2);
        assert!(queue.close());
        assert!(!queue.close());
        assert!(queue.is_closed());

        let err = queue.submit(Task::new(1, ())).await.unwrap_err();
        assert!(matches!(err, PoolError::QueueClosed));

        let err = queue.try_submit(Task::new(2, ())).unwrap_err();
        assert!(matches!(err, TrySubmitError::Closed(_)));
    }

    #[tokio::test]
    async fn test_close_keeps_buffered_tasks() {
        let queue = TaskQueue::new(2);
        queue.submit(Task::new("a", ())).await.unwrap();
        queue.submit(Task::new("b", ())).await.unwrap();
        queue.close();

        let rx = queue.receiver();
        assert_eq!(rx.next().await.map(|t| t.id), Some("a"));
        assert_eq!(rx.next().await.map(|t| t.id), Some("b"));
        assert!(rx.next().await.is_none());
    }

    #[tokio::test]
    async fn test_try_submit_full_returns_task() {
        let queue = TaskQueue::new(1);
        queue.try_submit(Task::new(1, "first")).unwrap();

        let err = queue.try_submit(Task::new(2, "second")).unwrap_err();
        match err {
            TrySubmitError::Full(task) => assert_eq!(task.payload, "second"),
            other => panic!("expected Full, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_submit_waits_for_free_slot() {
        let queue = Arc::new(TaskQueue::new(1));
        queue.submit(Task::new(1, ())).await.unwrap();

        // Buffer is full: the second submit must not complete yet
        let blocked = tokio::time::timeout(
            Duration::from_millis(50),
            queue.submit(Task::new(2, ())),
        )
        .await;
        assert!(blocked.is_err());

        let rx = queue.receiver();
        let submitter = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.submit(Task::new(3, ())).await })
        };

        assert_eq!(rx.next().await.map(|t| t.id), Some(1));
        submitter.await.unwrap().unwrap();
        assert_eq!(rx.next().await.map(|t| t.id), Some(3));
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let queue: TaskQueue<u8, u8> = TaskQueue::new(0);
        assert_eq!(queue.capacity(), 1);
    }
}
