// Output formatting for CLI

use std::fmt::Display;
use std::time::Duration;

use anyhow::Result;
use serde::Serialize;
use workpool::TaskResult;

#[derive(Clone, Copy)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Self {
        match s {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Text,
        }
    }

    pub fn print_value<T: Serialize>(&self, value: &T) -> Result<()> {
        match self {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(value)?);
            }
            OutputFormat::Text => {
                // Text format is handled by each command
            }
        }
        Ok(())
    }

    pub fn is_text(&self) -> bool {
        matches!(self, OutputFormat::Text)
    }
}

/// Print a section header
pub fn print_header(title: &str) {
    println!("\n=== {} ===", title);
}

/// Print one task result as "<label> <id> <verb>: <value>" or "<label> <id> failed: <error>"
pub fn print_result<O: Display>(result: &TaskResult<u32, O>, label: &str, verb: &str) {
    println!("{}", format_result(result, label, verb));
}

fn format_result<O: Display>(result: &TaskResult<u32, O>, label: &str, verb: &str) -> String {
    match &result.outcome {
        Ok(value) => format!("{} {} {}: {}", label, result.task_id, verb, value),
        Err(err) => format!("{} {} failed: {} ({})", label, result.task_id, err, err.kind),
    }
}

/// Print elapsed time
pub fn print_elapsed(elapsed: Duration) {
    println!("Completed in: {:?}", elapsed);
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;
    use workpool::TaskError;

    use super::*;

    fn result(outcome: Result<String, TaskError>) -> TaskResult<u32, String> {
        TaskResult {
            task_id: 2,
            outcome,
            worker_id: 0,
            completed_at: Utc::now(),
            duration: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_format_result_uses_label() {
        let ok = result(Ok("6".to_string()));
        assert_eq!(format_result(&ok, "Quick job", "result"), "Quick job 2 result: 6");
        assert_eq!(format_result(&ok, "Job", "created"), "Job 2 created: 6");

        let failed = result(Err(TaskError::failed("boom")));
        assert_eq!(format_result(&failed, "Job", "result"), "Job 2 failed: boom (failed)");
    }
}
