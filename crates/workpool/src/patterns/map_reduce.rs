//! Map-reduce on top of the worker pool

use std::future::Future;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PoolError;
use crate::pool::{WorkerPool, WorkerPoolConfig};
use crate::result::TaskError;
use crate::task::Task;

/// Outcome of [`map_reduce`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapReduceOutput<R> {
    /// Reduced value over every successful map output
    pub value: R,

    /// Number of inputs that mapped successfully
    pub mapped: usize,

    /// Failed inputs, by input position
    pub errors: Vec<(usize, TaskError)>,
}

impl<R> MapReduceOutput<R> {
    /// Whether every input mapped successfully
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Map every input on a worker pool, then fold the outputs
///
/// The map phase runs concurrently on `config.workers` workers. The reduce
/// phase runs on the caller, in input order, so `reduce` does not need to be
/// commutative. Failed inputs are skipped by the reduce and reported in
/// [`MapReduceOutput::errors`].
///
/// # Example
///
/// ```ignore
/// let output = map_reduce(
///     WorkerPoolConfig::new(4),
///     1..=10u64,
///     |n| async move { Ok(n * n) },
///     0,
///     |acc, sq| acc + sq,
/// )
/// .await?;
///
/// assert_eq!(output.value, 385);
/// ```
pub async fn map_reduce<T, M, R, MapFn, MapFut, ReduceFn>(
    config: WorkerPoolConfig,
    inputs: impl IntoIterator<Item = T>,
    map: MapFn,
    init: R,
    mut reduce: ReduceFn,
) -> Result<MapReduceOutput<R>, PoolError>
where
    T: Send + 'static,
    M: Send + 'static,
    MapFn: Fn(T) -> MapFut + Send + Sync + 'static,
    MapFut: Future<Output = Result<M, TaskError>> + Send + 'static,
    ReduceFn: FnMut(R, M) -> R,
{
    let tasks = inputs
        .into_iter()
        .enumerate()
        .map(|(index, input)| Task::new(index, input));

    let mut results =
        WorkerPool::run_batch(config, tasks, move |task: Task<usize, T>, _ctx| map(task.payload))
            .await?;
    results.sort_by_key(|result| result.task_id);

    let mut value = init;
    let mut mapped = 0;
    let mut errors = Vec::new();

    for result in results {
        match result.outcome {
            Ok(output) => {
                value = reduce(value, output);
                mapped += 1;
            }
            Err(err) => errors.push((result.task_id, err)),
        }
    }

    debug!(mapped, failed = errors.len(), "Map-reduce finished");

    Ok(MapReduceOutput {
        value,
        mapped,
        errors,
    })
}
