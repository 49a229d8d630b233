//! # Taskfarm Interfaces
//!
//! Contracts between the master coordinator and the collaborators it drives.
//!
//! The master only knows these traits; the in-process runtime and the
//! storage crate implement them. Keeping them here lets both sides depend on
//! a neutral crate instead of on each other.
//!
//! ## Main Interfaces
//!
//! - [`TaskRepository`] - payload storage addressed by task id
//! - [`WorkerProvisioner`] - supplies and reclaims workers
//! - [`LivenessWatcher`] - probes workers and reports deaths
//! - [`TaskSource`] / [`DeathListener`] - what workers and watchers call back
//! - [`TaskRunner`] - user code executed by workers

pub mod protocol;
pub mod provisioner;
pub mod repository;
pub mod runner;
pub mod watcher;
pub mod worker;

// Re-export commonly used types
pub use protocol::{DeathListener, SourceError, TaskSource};
pub use provisioner::{ProvisionError, WorkerProvisioner};
pub use repository::{RepositoryError, RepositoryResult, TaskRepository};
pub use runner::TaskRunner;
pub use watcher::{LivenessWatcher, WatcherError};
pub use worker::{LinkError, WorkerHandle, WorkerLink};
