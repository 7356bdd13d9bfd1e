//! Fan-out / fan-in over dedicated worker channels
//!
//! Unlike [`WorkerPool`](crate::WorkerPool), where every worker pulls from one
//! shared queue, each worker here owns its own channel and inputs are dealt
//! round-robin. All worker outputs merge into a single stream.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::result::TaskError;

/// One merged output of [`fan_out_fan_in`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FanOutRecord<O> {
    /// Worker that produced the output
    pub worker_id: usize,

    /// Position of the input in the original sequence
    pub sequence: usize,

    /// Output, or the error if the function panicked
    pub output: Result<O, TaskError>,
}

/// Deal `inputs` round-robin to `workers` dedicated workers and merge outputs
///
/// Input `i` goes to worker `i % workers`. Each worker channel holds a single
/// pending input, so the distributor waits on a busy worker instead of
/// skipping ahead. Records are returned in completion order, one per input.
pub async fn fan_out_fan_in<T, O, F, Fut>(
    workers: usize,
    inputs: impl IntoIterator<Item = T>,
    f: F,
) -> Vec<FanOutRecord<O>>
where
    T: Send + 'static,
    O: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = O> + Send + 'static,
{
    let workers = workers.max(1);
    let f = Arc::new(f);
    let (out_tx, mut out_rx) = mpsc::unbounded_channel();

    let mut lanes = Vec::with_capacity(workers);
    for worker_id in 0..workers {
        let (tx, mut rx) = mpsc::channel::<(usize, T)>(1);
        let f = Arc::clone(&f);
        let out_tx = out_tx.clone();

        tokio::spawn(async move {
            while let Some((sequence, input)) = rx.recv().await {
                // Calling `f` inside the future catches panics raised before
                // it returns its own future too
                let call = &f;
                let output = match AssertUnwindSafe(async move { call(input).await })
                    .catch_unwind()
                    .await
                {
                    Ok(output) => Ok(output),
                    Err(payload) => {
                        let err = TaskError::from_panic(payload);
                        warn!(worker_id, sequence, error = %err, "Fan-out worker panicked");
                        Err(err)
                    }
                };
                debug!(worker_id, sequence, "Fan-out worker finished input");

                if out_tx
                    .send(FanOutRecord {
                        worker_id,
                        sequence,
                        output,
                    })
                    .is_err()
                {
                    break;
                }
            }
        });

        lanes.push(tx);
    }

    // The distributor keeps `out_tx` to report inputs a dead worker never took
    let distribute = async move {
        for (sequence, input) in inputs.into_iter().enumerate() {
            let worker_id = sequence % workers;
            if lanes[worker_id].send((sequence, input)).await.is_err() {
                warn!(worker_id, sequence, "Fan-out worker exited, input not processed");
                let _ = out_tx.send(FanOutRecord {
                    worker_id,
                    sequence,
                    output: Err(TaskError::failed(format!(
                        "fan-out worker {worker_id} exited before input {sequence}"
                    ))),
                });
            }
        }
        // Dropping the lanes lets every worker finish
    };

    let collect = async move {
        let mut records = Vec::new();
        while let Some(record) = out_rx.recv().await {
            records.push(record);
        }
        records
    };

    let ((), records) = tokio::join!(distribute, collect);
    records
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_squares_round_robin() {
        let mut records = fan_out_fan_in(3, 1..=9u32, |n| async move { n * n }).await;
        assert_eq!(records.len(), 9);

        records.sort_by_key(|r| r.sequence);
        for record in &records {
            assert_eq!(record.worker_id, record.sequence % 3);
            let n = record.sequence as u32 + 1;
            assert_eq!(record.output, Ok(n * n));
        }
    }

    #[tokio::test]
    async fn test_panic_before_future_is_recorded() {
        let mut records = fan_out_fan_in(3, 1..=9u32, |n| {
            assert!(n != 2, "two is rejected up front");
            async move { n * n }
        })
        .await;
        assert_eq!(records.len(), 9);

        records.sort_by_key(|r| r.sequence);
        let err = records[1].output.as_ref().unwrap_err();
        assert_eq!(err.kind, crate::result::TaskErrorKind::Panicked);
        assert_eq!(err.message, "two is rejected up front");

        // The lane that panicked kept serving its later inputs
        assert_eq!(records[4].worker_id, 1);
        assert_eq!(records[4].output, Ok(25));
        assert_eq!(records.iter().filter(|r| r.output.is_ok()).count(), 8);
    }

    #[tokio::test]
    async fn test_panic_is_recorded() {
        let records = fan_out_fan_in(2, vec![1u32, 2, 3], |n| async move {
            if n == 2 {
                panic!("cannot handle two");
            }
            n
        })
        .await;

        assert_eq!(records.len(), 3);
        let failed: Vec<_> = records.iter().filter(|r| r.output.is_err()).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].sequence, 1);
    }

    #[tokio::test]
    async fn test_outputs_merge_in_completion_order() {
        // Worker 0 gets the slow input, worker 1 the fast one
        let records = fan_out_fan_in(2, vec![100u64, 1], |ms| async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            ms
        })
        .await;

        let order: Vec<usize> = records.iter().map(|r| r.sequence).collect();
        assert_eq!(order, vec![1, 0]);
    }

    #[tokio::test]
    async fn test_no_inputs() {
        let records = fan_out_fan_in(4, Vec::<u8>::new(), |n| async move { n }).await;
        assert!(records.is_empty());
    }
}
