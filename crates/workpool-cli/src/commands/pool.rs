// Worker pool examples: cpu, io, web and the quick run used by `all`

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::task::JoinHandle;
use workpool::pool::default_workers;
use workpool::{
    summarize, PoolError, PoolStats, ResultSummary, Task, TaskContext, TaskError, TaskResult, WorkerPool,
    WorkerPoolConfig,
};

use super::PoolSettings;
use crate::output::{print_elapsed, print_header, print_result, OutputFormat};
use crate::workloads;

/// Labels for one example run
struct Example {
    name: &'static str,
    title: &'static str,
    label: &'static str,
    verb: &'static str,
}

/// JSON report for one example run
#[derive(Debug, Serialize)]
struct PoolReport {
    example: &'static str,
    pool_id: String,
    workers: usize,
    elapsed_ms: u64,
    summary: ResultSummary,
    stats: PoolStats,
    results: Vec<TaskResult<u32, String>>,
}

pub async fn cpu(settings: &PoolSettings, output: OutputFormat, jobs: u32) -> Result<()> {
    let example = Example {
        name: "cpu",
        title: "CPU-Intensive Work Example",
        label: "Job",
        verb: "result",
    };
    // Factorial of (id + 5)
    let tasks = (1..=jobs).map(|id| Task::new(id, id + 5)).collect();

    run_example(
        example,
        settings.config("cpu", default_workers()),
        tasks,
        workloads::factorial,
        output,
    )
    .await
}

pub async fn io(settings: &PoolSettings, output: OutputFormat, jobs: u32) -> Result<()> {
    let example = Example {
        name: "io",
        title: "I/O-Intensive Work Example",
        label: "Job",
        verb: "created",
    };
    let tasks = (1..=jobs)
        .map(|id| Task::new(id, format!("file_{}", id)))
        .collect();

    // More workers for I/O bound tasks
    run_example(
        example,
        settings.config("io", default_workers() * 2),
        tasks,
        workloads::temp_file,
        output,
    )
    .await
}

pub async fn web(settings: &PoolSettings, output: OutputFormat) -> Result<()> {
    let example = Example {
        name: "web",
        title: "Web Request Example",
        label: "Job",
        verb: "result",
    };
    let tasks = workloads::URLS
        .iter()
        .zip(1..)
        .map(|(url, id)| Task::new(id, url.to_string()))
        .collect();

    run_example(
        example,
        settings.config("web", 5),
        tasks,
        workloads::simulated_request,
        output,
    )
    .await
}

pub async fn quick(settings: &PoolSettings, output: OutputFormat) -> Result<()> {
    let example = Example {
        name: "quick",
        title: "Quick Worker Pool Example",
        label: "Quick job",
        verb: "result",
    };
    let tasks = (1..=3).map(|id| Task::new(id, id + 3)).collect();

    run_example(
        example,
        settings.config("quick", 2),
        tasks,
        workloads::factorial,
        output,
    )
    .await
}

/// Submit every task, then close the pool
///
/// The pool is closed even when a submit fails, so the result stream always
/// ends.
fn spawn_submitter<P, O>(
    pool: Arc<WorkerPool<u32, P, O>>,
    tasks: Vec<Task<u32, P>>,
) -> JoinHandle<Result<(), PoolError>>
where
    P: Send + 'static,
    O: Send + 'static,
{
    tokio::spawn(async move {
        let mut submitted = Ok(());
        for task in tasks {
            if let Err(e) = pool.submit(task).await {
                submitted = Err(e);
                break;
            }
        }
        pool.close().await?;
        submitted
    })
}

/// Submit from a background task while draining results as they complete
async fn run_example<P, F, Fut>(
    example: Example,
    config: WorkerPoolConfig,
    tasks: Vec<Task<u32, P>>,
    handler: F,
    output: OutputFormat,
) -> Result<()>
where
    P: Send + 'static,
    F: Fn(Task<u32, P>, TaskContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<String, TaskError>> + Send + 'static,
{
    if output.is_text() {
        print_header(example.title);
    }

    let workers = config.workers;
    let pool = Arc::new(WorkerPool::try_new(config)?);
    let mut results = pool.results()?;
    pool.start(handler)?;

    let submitter = spawn_submitter(Arc::clone(&pool), tasks);

    let started = Instant::now();
    let mut collected = Vec::new();
    while let Some(result) = results.recv().await {
        if output.is_text() {
            print_result(&result, example.label, example.verb);
        }
        collected.push(result);
    }
    let elapsed = started.elapsed();

    submitter
        .await
        .context("submitter task failed")?
        .with_context(|| format!("{} example failed", example.name))?;

    let summary = summarize(&collected);
    tracing::info!(
        example = example.name,
        succeeded = summary.succeeded,
        failed = summary.failed,
        "Example finished"
    );

    if output.is_text() {
        print_elapsed(elapsed);
        return Ok(());
    }

    output.print_value(&PoolReport {
        example: example.name,
        pool_id: pool.pool_id().to_string(),
        workers,
        elapsed_ms: elapsed.as_millis() as u64,
        summary,
        stats: pool.stats(),
        results: collected,
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_submitter_closes_pool_on_submit_error() {
        // Never started, so the first submit fails
        let pool: Arc<WorkerPool<u32, u32, String>> =
            Arc::new(WorkerPool::new(WorkerPoolConfig::new(1)));
        let results = pool.results().unwrap();

        let tasks = (1..=3).map(|id| Task::new(id, id)).collect();
        let err = spawn_submitter(Arc::clone(&pool), tasks)
            .await
            .unwrap()
            .unwrap_err();
        assert!(matches!(err, PoolError::NotStarted));

        let drained = tokio::time::timeout(Duration::from_secs(1), results.collect_all())
            .await
            .expect("result stream should end after a failed submit");
        assert!(drained.is_empty());
    }
}
