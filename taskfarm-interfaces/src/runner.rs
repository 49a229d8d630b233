//! User code executed by workers

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use taskfarm_core::{Task, TaskFailure, WorkerMemory};

/// Runs a task on a worker.
///
/// A returned [`TaskFailure`] is not a worker failure: it is reported to the
/// master as the task's result.
#[async_trait]
pub trait TaskRunner: Send + Sync {
    async fn run(&self, task: &Task, memory: &mut WorkerMemory) -> Result<JsonValue, TaskFailure>;
}
