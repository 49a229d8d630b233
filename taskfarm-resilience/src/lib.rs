//! Resilience patterns for taskfarm
//!
//! Idle workers poll the master with a growing delay between attempts,
//! unless the master wakes them up first.

pub mod backoff;

// Re-export commonly used types
pub use backoff::{BackoffCalculator, BackoffStrategy, PollBackoff};
