//! Pool counters
//!
//! Lock-free counters updated by submitters and workers, readable at any time
//! through [`PoolStats`] snapshots.

use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

use crate::result::TaskErrorKind;

/// Point-in-time view of pool activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    /// Tasks accepted by the queue
    pub submitted: usize,

    /// Tasks that produced a result
    pub completed: usize,

    /// Completed tasks carrying a value
    pub succeeded: usize,

    /// Completed tasks carrying an error (panics included)
    pub failed: usize,

    /// Failed tasks whose handler panicked
    pub panicked: usize,

    /// Workers currently inside a task handler
    pub active: usize,

    /// Highest `active` value observed
    pub peak_active: usize,
}

impl PoolStats {
    /// Accepted tasks that have not produced a result yet
    pub fn outstanding(&self) -> usize {
        self.submitted.saturating_sub(self.completed)
    }
}

#[derive(Debug, Default)]
pub(crate) struct PoolCounters {
    submitted: AtomicUsize,
    completed: AtomicUsize,
    succeeded: AtomicUsize,
    failed: AtomicUsize,
    panicked: AtomicUsize,
    active: AtomicUsize,
    peak_active: AtomicUsize,
}

impl PoolCounters {
    pub(crate) fn task_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn task_started(&self) {
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_active.fetch_max(active, Ordering::SeqCst);
    }

    pub(crate) fn task_finished(&self, error: Option<TaskErrorKind>) {
        self.active.fetch_sub(1, Ordering::SeqCst);
        match error {
            None => {
                self.succeeded.fetch_add(1, Ordering::Relaxed);
            }
            Some(kind) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                if kind == TaskErrorKind::Panicked {
                    self.panicked.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
        self.completed.fetch_add(1, Ordering::Release);
    }

    pub(crate) fn snapshot(&self) -> PoolStats {
        PoolStats {
            submitted: self.submitted.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Acquire),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            panicked: self.panicked.load(Ordering::Relaxed),
            active: self.active.load(Ordering::SeqCst),
            peak_active: self.peak_active.load(Ordering::SeqCst),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_track_outcomes() {
        let counters = PoolCounters::default();
        for _ in 0..3 {
            counters.task_submitted();
        }

        counters.task_started();
        counters.task_started();
        counters.task_finished(None);
        counters.task_finished(Some(TaskErrorKind::Panicked));
        counters.task_started();

        let stats = counters.snapshot();
        assert_eq!(stats.submitted, 3);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.succeeded, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.panicked, 1);
        assert_eq!(stats.active, 1);
        assert_eq!(stats.peak_active, 2);
        assert_eq!(stats.outstanding(), 1);
    }
}
