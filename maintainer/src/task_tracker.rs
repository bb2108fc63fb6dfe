// File: maintainer/src/task_tracker.rs

use crate::scheduler::MaintenanceTask;
use chrono::{Local, NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use tracing::debug;

/// Last recorded outcome of a tracked task.
///
/// `success` and `details` only carry meaning once `last_run` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskResult {
    pub last_run: Option<NaiveDateTime>,
    pub success: Option<bool>,
    pub details: Option<String>,
}

impl TaskResult {
    pub fn ran_on(&self, date: NaiveDate) -> bool {
        self.last_run.map(|at| at.date() == date).unwrap_or(false)
    }
}

/// In-memory record of the latest outcome per task.
///
/// Owned by the scheduler and lent to runners by `&mut`, so writes and the
/// report's reads never overlap. Nothing is persisted across restarts.
#[derive(Debug, Clone)]
pub struct TaskResultStore {
    results: HashMap<MaintenanceTask, TaskResult>,
}

impl TaskResultStore {
    pub fn new() -> Self {
        let results = MaintenanceTask::ALL
            .iter()
            .map(|task| (*task, TaskResult::default()))
            .collect();
        Self { results }
    }

    /// Overwrite the entry for `task`, stamped with the current local time.
    pub fn record(&mut self, task: MaintenanceTask, success: bool, details: Option<String>) {
        self.record_at(task, success, details, Local::now().naive_local());
    }

    pub fn record_at(
        &mut self,
        task: MaintenanceTask,
        success: bool,
        details: Option<String>,
        at: NaiveDateTime,
    ) {
        debug!(
            "Recording {} result for {} at {}: {:?}",
            if success { "success" } else { "failure" },
            task,
            at.format("%Y-%m-%d %H:%M:%S"),
            details
        );
        self.results.insert(
            task,
            TaskResult {
                last_run: Some(at),
                success: Some(success),
                details,
            },
        );
    }

    pub fn get(&self, task: MaintenanceTask) -> TaskResult {
        self.results.get(&task).cloned().unwrap_or_default()
    }
}

impl Default for TaskResultStore {
    fn default() -> Self {
        Self::new()
    }
}
