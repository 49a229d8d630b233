//! Transport to a worker running in this process

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use taskfarm_interfaces::{LinkError, WorkerLink};
use tokio::sync::Notify;

/// Wake channel and liveness flag shared by a local worker and the master
#[derive(Debug)]
pub struct LocalLink {
    name: String,
    wake: Notify,
    alive: AtomicBool,
}

impl LocalLink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            wake: Notify::new(),
            alive: AtomicBool::new(true),
        }
    }

    /// Resolves on the next wake signal, or at once if one arrived since
    /// the last call
    pub async fn notified(&self) {
        self.wake.notified().await
    }

    pub fn mark_stopped(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WorkerLink for LocalLink {
    async fn ping(&self) -> Result<(), LinkError> {
        if self.is_alive() {
            Ok(())
        } else {
            Err(LinkError::Stopped(self.name.clone()))
        }
    }

    fn wake(&self) {
        // Keeps a permit if the worker is not waiting right now
        self.wake.notify_one();
    }
}
