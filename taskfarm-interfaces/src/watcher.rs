//! Worker liveness interface

use async_trait::async_trait;

use crate::worker::WorkerHandle;

/// Errors raised by liveness watchers
#[derive(Debug, thiserror::Error)]
pub enum WatcherError {
    #[error("Watcher has been shut down")]
    ShutDown,

    #[error("Watcher error: {0}")]
    Internal(String),
}

/// Probes registered workers.
///
/// Implementations report a worker that stops responding through the
/// [`DeathListener`](crate::DeathListener) they were built with.
#[async_trait]
pub trait LivenessWatcher: Send + Sync {
    /// Start probing a worker
    async fn watch(&self, worker: WorkerHandle) -> Result<(), WatcherError>;

    /// Stop probing a worker; unknown workers are ignored
    async fn unwatch(&self, worker: &WorkerHandle) -> Result<(), WatcherError>;

    /// Stop probing altogether
    async fn shutdown(&self) -> Result<(), WatcherError>;
}
