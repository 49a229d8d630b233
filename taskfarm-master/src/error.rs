//! Error types for the master coordinator

use taskfarm_interfaces::{ProvisionError, RepositoryError};
use thiserror::Error;

/// Result type for master operations
pub type MasterResult<T> = Result<T, MasterError>;

/// Errors surfaced to callers of the master
#[derive(Error, Debug)]
pub enum MasterError {
    /// Another wait call is already parked
    #[error("A wait request is already pending")]
    AlreadyWaiting,

    #[error("Cannot wait for {k} results: {total} results are expected")]
    InvalidWaitCount { k: usize, total: usize },

    #[error("Master has terminated")]
    Terminated,

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Provisioning error: {0}")]
    Provision(#[from] ProvisionError),
}

impl MasterError {
    /// Clean rejections leave the master untouched; the caller may retry
    /// with a valid call.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::AlreadyWaiting | Self::InvalidWaitCount { .. })
    }
}
