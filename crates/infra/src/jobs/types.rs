//! Named task types and errors.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use rentwatch_core::ReminderWindow;

use crate::reminders::ScanError;

/// Stable name of a recurring job (e.g. `"J-5"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskName(String);

impl TaskName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::borrow::Borrow<str> for TaskName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<ReminderWindow> for TaskName {
    fn from(window: ReminderWindow) -> Self {
        Self::new(window.label())
    }
}

/// Task execution status.
///
/// `Completed`/`Failed` are not final: the next trigger moves the task back
/// to `Running` and overwrites the previous outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Registered, never run since startup
    Pending,
    /// A scan is in flight
    Running,
    /// Last scan finished without a job-level error
    Completed,
    /// Last scan hit a job-level error (repository down, timeout)
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, TaskStatus::Running)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registry entry known at startup: a task name bound to the window it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDefinition {
    pub name: TaskName,
    pub window: ReminderWindow,
}

impl TaskDefinition {
    pub fn new(name: impl Into<String>, window: ReminderWindow) -> Self {
        Self {
            name: TaskName::new(name),
            window,
        }
    }

    /// `J-5 → FiveDaysOut`, `J-3 → ThreeDaysOut`.
    pub fn defaults() -> Vec<TaskDefinition> {
        ReminderWindow::ALL
            .into_iter()
            .map(|w| TaskDefinition {
                name: w.into(),
                window: w,
            })
            .collect()
    }
}

/// Task registry error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    /// The name is not in the registry.
    #[error("task {0} not found")]
    UnknownTask(String),
    /// The task is already running; rejected without waiting.
    #[error("task {0} is already running")]
    TaskBusy(String),
    /// The scan could not fetch rentals.
    #[error("rental repository unavailable: {0}")]
    RepositoryUnavailable(String),
    /// The scan exceeded the soft timeout.
    #[error("scan timed out after {0:?}")]
    Timeout(Duration),
}

impl TaskError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            TaskError::UnknownTask(_) => "unknown_task",
            TaskError::TaskBusy(_) => "task_busy",
            TaskError::RepositoryUnavailable(_) => "repository_unavailable",
            TaskError::Timeout(_) => "timeout",
        }
    }
}

impl From<ScanError> for TaskError {
    fn from(err: ScanError) -> Self {
        match err {
            ScanError::RepositoryUnavailable(msg) => TaskError::RepositoryUnavailable(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_definitions() {
        let defs = TaskDefinition::defaults();
        assert_eq!(
            defs,
            vec![
                TaskDefinition::new("J-5", ReminderWindow::FiveDaysOut),
                TaskDefinition::new("J-3", ReminderWindow::ThreeDaysOut),
            ]
        );
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&TaskStatus::Completed).unwrap(), "\"completed\"");
        assert_eq!(TaskStatus::Running.to_string(), "running");
    }
}
