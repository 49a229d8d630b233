//! # Taskfarm Master
//!
//! The coordinator that distributes tasks to a dynamic pool of workers and
//! collects their results.
//!
//! A [`Coordinator`] runs as a single tokio task and is the only writer of
//! the scheduling state: the [`TaskQueue`], the [`ResultQueue`] and the
//! [`WorkerPool`]. Clients, workers and liveness watchers talk to it through
//! a cloneable [`MasterHandle`].
//!
//! ```ignore
//! let (handle, inbox) = master_channel();
//! // build the provisioner and watcher from `handle` ...
//! Coordinator::new(inbox, repository.clone(), provisioner, watcher, OrderingMode::default()).spawn();
//! let master = Master::new(handle, repository);
//! master.solve(payloads).await?;
//! let results = master.wait_all().await?;
//! ```

pub mod command;
pub mod coordinator;
pub mod error;
pub mod handle;
pub mod master;
pub mod pool;
pub mod result_queue;
pub mod task_queue;

pub use command::{MasterCommand, WaitRequest};
pub use coordinator::Coordinator;
pub use error::{MasterError, MasterResult};
pub use handle::{master_channel, MasterHandle, MasterInbox};
pub use master::Master;
pub use pool::{RemovedWorker, WorkerPool};
pub use result_queue::ResultQueue;
pub use task_queue::TaskQueue;
