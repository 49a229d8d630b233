//! Core domain types for taskfarm
//!
//! This crate holds the plain data shared by the master coordinator, the
//! collaborators and the workers. It carries no coordination logic and has
//! minimal dependencies.

pub mod memory;
pub mod result;
pub mod task;
pub mod types;

// Re-export commonly used types at the crate root
pub use memory::WorkerMemory;
pub use result::{TaskFailure, TaskResult};
pub use task::{Task, TaskAssignment, TaskId, TaskState};
pub use types::{OrderingMode, ParseError, ResourceDescriptor};
