//! Task payload storage for taskfarm
//!
//! Implementations of [`taskfarm_interfaces::TaskRepository`].

pub mod memory;

pub use memory::InMemoryTaskRepository;
