//! Task payload storage interface

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use taskfarm_core::{Task, TaskId};

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Errors raised by task repositories
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Task not found in repository: {0}")]
    NotFound(TaskId),

    #[error("Failed to (de)serialize task {id}: {message}")]
    Serialization { id: TaskId, message: String },

    #[error("Repository backend error: {0}")]
    Backend(String),
}

/// Storage of task payloads addressed by task id.
///
/// Payloads live here until a result for them is accepted. The master only
/// keeps ids; the payload of an in-flight task travels with the response
/// handed to the worker.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Store a new payload and allocate its id
    async fn store(&self, payload: JsonValue) -> RepositoryResult<TaskId>;

    /// Fetch a task for dispatch.
    ///
    /// Must return a fully resolved task, wherever the payload currently
    /// lives (hot or staged).
    async fn fetch(&self, id: TaskId) -> RepositoryResult<Task>;

    /// Demote a dispatched task out of hot storage.
    ///
    /// The task must stay fetchable: it is dispatched again if its worker
    /// dies before reporting.
    async fn stage(&self, id: TaskId) -> RepositoryResult<()>;

    /// Drop a task whose result has been accepted
    async fn evict(&self, id: TaskId) -> RepositoryResult<()>;

    /// Number of tasks currently held
    async fn len(&self) -> RepositoryResult<usize>;

    /// Check if the repository holds no task
    async fn is_empty(&self) -> RepositoryResult<bool> {
        Ok(self.len().await? == 0)
    }
}
