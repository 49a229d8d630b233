//! In-memory task repository

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use taskfarm_core::{Task, TaskId};
use taskfarm_interfaces::{RepositoryError, RepositoryResult, TaskRepository};
use tracing::debug;

/// Task payloads held in process memory.
///
/// Newly stored payloads live in the hot map. Staging a dispatched task
/// moves its payload to the staged map in serialized form, so that the only
/// live copy of an in-flight payload is the one handed to the worker.
pub struct InMemoryTaskRepository {
    hot: Arc<RwLock<HashMap<TaskId, JsonValue>>>,
    staged: Arc<RwLock<HashMap<TaskId, Vec<u8>>>>,
    next_id: AtomicU64,
}

impl InMemoryTaskRepository {
    /// Create an empty repository; ids are allocated from 1
    pub fn new() -> Self {
        Self {
            hot: Arc::new(RwLock::new(HashMap::new())),
            staged: Arc::new(RwLock::new(HashMap::new())),
            next_id: AtomicU64::new(1),
        }
    }

    /// Put a task with a caller-chosen id straight into hot storage
    pub fn insert(&self, task: Task) {
        self.next_id.fetch_max(task.id.value() + 1, Ordering::SeqCst);
        self.staged.write().remove(&task.id);
        self.hot.write().insert(task.id, task.payload);
    }

    pub fn hot_len(&self) -> usize {
        self.hot.read().len()
    }

    pub fn staged_len(&self) -> usize {
        self.staged.read().len()
    }
}

impl Default for InMemoryTaskRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn store(&self, payload: JsonValue) -> RepositoryResult<TaskId> {
        let id = TaskId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.hot.write().insert(id, payload);
        Ok(id)
    }

    async fn fetch(&self, id: TaskId) -> RepositoryResult<Task> {
        if let Some(payload) = self.hot.read().get(&id) {
            return Ok(Task::new(id, payload.clone()));
        }

        let staged = self.staged.read();
        let bytes = staged.get(&id).ok_or(RepositoryError::NotFound(id))?;
        let payload =
            serde_json::from_slice(bytes).map_err(|e| RepositoryError::Serialization {
                id,
                message: e.to_string(),
            })?;
        Ok(Task::new(id, payload))
    }

    async fn stage(&self, id: TaskId) -> RepositoryResult<()> {
        let Some(payload) = self.hot.write().remove(&id) else {
            // Already staged when dispatched a second time
            if self.staged.read().contains_key(&id) {
                return Ok(());
            }
            return Err(RepositoryError::NotFound(id));
        };

        let bytes = serde_json::to_vec(&payload).map_err(|e| RepositoryError::Serialization {
            id,
            message: e.to_string(),
        })?;
        self.staged.write().insert(id, bytes);
        debug!(task_id = %id, "Task staged");
        Ok(())
    }

    async fn evict(&self, id: TaskId) -> RepositoryResult<()> {
        let hot = self.hot.write().remove(&id);
        let staged = self.staged.write().remove(&id);
        if hot.is_none() && staged.is_none() {
            return Err(RepositoryError::NotFound(id));
        }
        Ok(())
    }

    async fn len(&self) -> RepositoryResult<usize> {
        Ok(self.hot_len() + self.staged_len())
    }
}
