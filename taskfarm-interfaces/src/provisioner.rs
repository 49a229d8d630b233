//! Worker provisioning interface

use async_trait::async_trait;
use taskfarm_core::ResourceDescriptor;

use crate::worker::WorkerHandle;

/// Errors raised by worker provisioners
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("Unsupported resource descriptor: {0}")]
    Unsupported(String),

    #[error("Failed to start worker: {0}")]
    Spawn(String),

    #[error("Provisioner has been shut down")]
    ShutDown,
}

/// Supplies worker processes to the master and takes them back
#[async_trait]
pub trait WorkerProvisioner: Send + Sync {
    /// Start workers described by `descriptor`.
    ///
    /// New workers make themselves known to the master on their first
    /// request for work.
    async fn add_resources(&self, descriptor: ResourceDescriptor) -> Result<(), ProvisionError>;

    /// Take back workers the master no longer uses
    async fn release(&self, workers: Vec<WorkerHandle>) -> Result<(), ProvisionError>;

    /// Tear the provisioner down. With `free_resources` every worker it
    /// started is stopped as well.
    async fn shutdown(&self, free_resources: bool) -> Result<(), ProvisionError>;
}
