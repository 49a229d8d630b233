//! Error types for the in-process runtime

use taskfarm_config::ConfigError;
use taskfarm_interfaces::ProvisionError;
use taskfarm_master::MasterError;
use thiserror::Error;

pub type ExecutionResult<T> = Result<T, ExecutionError>;

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Provisioning error: {0}")]
    Provision(#[from] ProvisionError),

    #[error("Master error: {0}")]
    Master(#[from] MasterError),

    #[error("Coordinator task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
