//! Results produced by workers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

use crate::task::TaskId;

/// Failure raised by a task while it was running on a worker.
///
/// A failed task still counts as completed: the failure travels inside the
/// result and is handed to the client like any other outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskFailure {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<JsonValue>,
}

impl TaskFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: JsonValue) -> Self {
        self.details = Some(details);
        self
    }
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for TaskFailure {}

/// Result of one task, immutable once accepted by the master
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub task_id: TaskId,
    pub outcome: Result<JsonValue, TaskFailure>,
    /// Name of the worker that produced the result
    pub worker: String,
    pub completed_at: DateTime<Utc>,
}

impl TaskResult {
    /// Create a successful result
    pub fn success(task_id: TaskId, output: JsonValue, worker: impl Into<String>) -> Self {
        Self {
            task_id,
            outcome: Ok(output),
            worker: worker.into(),
            completed_at: Utc::now(),
        }
    }

    /// Create a failed result
    pub fn failure(task_id: TaskId, failure: TaskFailure, worker: impl Into<String>) -> Self {
        Self {
            task_id,
            outcome: Err(failure),
            worker: worker.into(),
            completed_at: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Output of a successful task
    pub fn output(&self) -> Option<&JsonValue> {
        self.outcome.as_ref().ok()
    }

    pub fn into_output(self) -> Result<JsonValue, TaskFailure> {
        self.outcome
    }
}
