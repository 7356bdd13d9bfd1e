// Task handlers used by the worker pool examples
//
// Each handler is an ordinary async fn with the (Task, TaskContext) shape the
// pool expects, so it can be passed straight to `WorkerPool::start`.

use std::time::Duration;

use workpool::{Task, TaskContext, TaskError};

/// URLs used by the simulated web example
pub const URLS: [&str; 5] = [
    "https://api.github.com",
    "https://httpbin.org/get",
    "https://jsonplaceholder.typicode.com/posts/1",
    "https://api.github.com/users/octocat",
    "https://httpbin.org/delay/1",
];

/// Factorial of the payload, pausing briefly per step to simulate work
pub async fn factorial(task: Task<u32, u32>, ctx: TaskContext) -> Result<String, TaskError> {
    let n = task.payload;
    let mut result: u128 = 1;

    for i in 1..=u128::from(n) {
        if ctx.is_cancelled() {
            return Err(TaskError::cancelled(format!("factorial({n}) cancelled at step {i}")));
        }
        result = result
            .checked_mul(i)
            .ok_or_else(|| TaskError::failed(format!("factorial({n}) overflows u128")))?;
        tokio::time::sleep(Duration::from_micros(100)).await;
    }

    Ok(result.to_string())
}

/// Create a temp file named after the payload, write to it, then remove it
pub async fn temp_file(task: Task<u32, String>, _ctx: TaskContext) -> Result<String, TaskError> {
    let path = std::env::temp_dir().join(format!("temp_{}_{}.txt", task.payload, task.id));
    let data = format!("This is test data for job {}\n", task.id);

    tokio::fs::write(&path, data)
        .await
        .map_err(|e| TaskError::failed(format!("write {}: {}", path.display(), e)))?;
    tokio::fs::remove_file(&path)
        .await
        .map_err(|e| TaskError::failed(format!("remove {}: {}", path.display(), e)))?;

    Ok(path.display().to_string())
}

/// Simulated request: waits 100ms plus 10ms per job id
pub async fn simulated_request(
    task: Task<u32, String>,
    _ctx: TaskContext,
) -> Result<String, TaskError> {
    let delay = Duration::from_millis(100 + u64::from(task.id) * 10);
    tokio::time::sleep(delay).await;
    Ok(format!("Response from {}", task.payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use workpool::{TaskErrorKind, WorkerPool, WorkerPoolConfig};

    #[tokio::test]
    async fn test_factorial_values() {
        let results = WorkerPool::run_batch(
            WorkerPoolConfig::new(2),
            vec![Task::new(1, 3), Task::new(2, 0), Task::new(3, 10)],
            factorial,
        )
        .await
        .unwrap();

        let mut values: Vec<(u32, String)> = results
            .into_iter()
            .map(|r| (r.task_id, r.outcome.unwrap()))
            .collect();
        values.sort();
        assert_eq!(
            values,
            vec![
                (1, "6".to_string()),
                (2, "1".to_string()),
                (3, "3628800".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_factorial_overflow_is_task_error() {
        let results =
            WorkerPool::run_batch(WorkerPoolConfig::new(1), vec![Task::new(1, 40)], factorial)
                .await
                .unwrap();

        let err = results[0].error().unwrap();
        assert_eq!(err.kind, TaskErrorKind::Failed);
        assert!(err.message.contains("overflows"));
    }

    #[tokio::test]
    async fn test_temp_file_is_cleaned_up() {
        let results = WorkerPool::run_batch(
            WorkerPoolConfig::new(1),
            vec![Task::new(42, "workpool_cli_test".to_string())],
            temp_file,
        )
        .await
        .unwrap();

        let path = results[0].value().unwrap();
        assert!(path.ends_with("temp_workpool_cli_test_42.txt"));
        assert!(!std::path::Path::new(path).exists());
    }

    #[tokio::test]
    async fn test_simulated_request() {
        let results = WorkerPool::run_batch(
            WorkerPoolConfig::new(1),
            vec![Task::new(0, URLS[0].to_string())],
            simulated_request,
        )
        .await
        .unwrap();

        assert_eq!(
            results[0].value().map(String::as_str),
            Some("Response from https://api.github.com")
        );
        assert!(results[0].duration >= Duration::from_millis(100));
    }
}
