//! Configuration management for taskfarm
//!
//! Settings are split by functional domain (master, worker, watcher,
//! logging). Each domain has defaults, can be overridden from a YAML file
//! and from `TASKFARM_*` environment variables, and validates itself.

pub mod domains;
pub mod error;
pub mod loader;
pub mod validation;

// Re-export main types
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use validation::Validatable;

// Re-export domain configurations
pub use domains::{
    logging::{LogFormat, LogLevel, LoggingConfig},
    master::MasterConfig,
    watcher::WatcherConfig,
    worker::{PollConfig, WorkerConfig},
    FarmConfig,
};

// Re-export utilities
pub use domains::utils::serde_duration_ms;
