//! Calls workers and watchers make back into the master

use async_trait::async_trait;
use taskfarm_core::{TaskAssignment, TaskResult};

use crate::worker::WorkerHandle;

/// Errors seen by a worker talking to the master
#[derive(Debug, Clone, thiserror::Error)]
pub enum SourceError {
    /// The master is gone; the worker should stop
    #[error("Master has terminated")]
    Terminated,

    #[error("Master unavailable: {0}")]
    Unavailable(String),
}

/// Worker-facing protocol of the master
#[async_trait]
pub trait TaskSource: Send + Sync {
    /// Ask for a task. The first call registers the worker.
    async fn request_task(&self, worker: WorkerHandle) -> Result<TaskAssignment, SourceError>;

    /// Hand back a result and ask for the next task in the same round trip
    async fn submit_result_and_request_task(
        &self,
        result: TaskResult,
        worker: WorkerHandle,
    ) -> Result<TaskAssignment, SourceError>;
}

/// Receives death reports from a liveness watcher
#[async_trait]
pub trait DeathListener: Send + Sync {
    /// Report that the worker registered under `worker_name` stopped
    /// responding. Reporting an unknown worker is a no-op.
    async fn report_dead(&self, worker_name: &str);
}
