//! In-process runtime for taskfarm
//!
//! Runs workers as tokio tasks next to the master. This is what the CLI and
//! the integration tests use; a distributed deployment would provide its
//! own [`WorkerProvisioner`](taskfarm_interfaces::WorkerProvisioner) and
//! [`LivenessWatcher`](taskfarm_interfaces::LivenessWatcher).

pub mod error;
pub mod farm;
pub mod link;
pub mod provisioner;
pub mod runner;
pub mod watcher;
pub mod worker;

pub use error::{ExecutionError, ExecutionResult};
pub use farm::LocalFarm;
pub use link::LocalLink;
pub use provisioner::LocalProvisioner;
pub use runner::FnRunner;
pub use watcher::HeartbeatWatcher;
pub use worker::{LocalWorker, StopReason, WorkerReport};
