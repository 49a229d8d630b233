//! Worker handles

use async_trait::async_trait;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use uuid::Uuid;

/// Errors raised while talking to a worker
#[derive(Debug, Clone, thiserror::Error)]
pub enum LinkError {
    #[error("Worker {0} is unreachable")]
    Unreachable(String),

    #[error("Worker {0} has stopped")]
    Stopped(String),
}

/// Transport to one worker process
#[async_trait]
pub trait WorkerLink: Send + Sync + fmt::Debug {
    /// Liveness probe
    async fn ping(&self) -> Result<(), LinkError>;

    /// Ask the worker to poll for work now instead of waiting out its
    /// backoff. Fire and forget.
    fn wake(&self);
}

/// Opaque handle on a registered worker.
///
/// Two handles are equal when they refer to the same worker instance,
/// whatever name it reports.
#[derive(Clone)]
pub struct WorkerHandle {
    id: Uuid,
    name: String,
    link: Arc<dyn WorkerLink>,
}

impl WorkerHandle {
    pub fn new(name: impl Into<String>, link: Arc<dyn WorkerLink>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            link,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn link(&self) -> &Arc<dyn WorkerLink> {
        &self.link
    }

    pub fn wake(&self) {
        self.link.wake();
    }

    pub async fn ping(&self) -> Result<(), LinkError> {
        self.link.ping().await
    }
}

impl fmt::Debug for WorkerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerHandle")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

impl PartialEq for WorkerHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for WorkerHandle {}

impl Hash for WorkerHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
