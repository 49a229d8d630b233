//! Logging setup for taskfarm binaries
//!
//! Library crates only emit `tracing` events; binaries call one of the
//! initialisers here once at startup.

pub mod init;

pub use init::{build_env_filter, init_logging_from_config, init_simple_tracing};
