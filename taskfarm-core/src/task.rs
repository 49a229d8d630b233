//! Task identity, payload and scheduling state

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// Unique identifier for a submitted task (newtype pattern for type safety)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl TaskId {
    /// Get the raw integer value
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TaskId {
    fn from(value: u64) -> Self {
        TaskId(value)
    }
}

/// A unit of work as handed to a worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub payload: JsonValue,
}

impl Task {
    pub fn new(id: impl Into<TaskId>, payload: JsonValue) -> Self {
        Self {
            id: id.into(),
            payload,
        }
    }
}

/// The three disjoint queue memberships a submitted task moves through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Waiting for a worker
    Pending,
    /// Handed to a worker, no accepted result yet
    Launched,
    /// A result has been accepted
    Completed,
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TaskState::Pending => "pending",
            TaskState::Launched => "launched",
            TaskState::Completed => "completed",
        };
        f.write_str(label)
    }
}

/// Answer to a worker asking for work.
///
/// `NoTask` is not an error: the worker should poll again later, or as soon
/// as it is woken up.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskAssignment {
    Task(Task),
    NoTask,
}

impl TaskAssignment {
    pub fn is_task(&self) -> bool {
        matches!(self, TaskAssignment::Task(_))
    }

    /// Id of the assigned task, if any
    pub fn task_id(&self) -> Option<TaskId> {
        match self {
            TaskAssignment::Task(task) => Some(task.id),
            TaskAssignment::NoTask => None,
        }
    }

    pub fn into_task(self) -> Option<Task> {
        match self {
            TaskAssignment::Task(task) => Some(task),
            TaskAssignment::NoTask => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_task_id_serializes_as_integer() {
        let id = TaskId(42);
        assert_eq!(serde_json::to_value(id).unwrap(), json!(42));
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn test_assignment_accessors() {
        let assignment = TaskAssignment::Task(Task::new(TaskId(7), json!({"n": 7})));
        assert!(assignment.is_task());
        assert_eq!(assignment.task_id(), Some(TaskId(7)));

        assert_eq!(TaskAssignment::NoTask.task_id(), None);
        assert!(TaskAssignment::NoTask.into_task().is_none());
    }
}
