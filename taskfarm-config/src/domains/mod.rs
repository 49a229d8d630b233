//! Domain-specific configuration modules

pub mod logging;
pub mod master;
pub mod utils;
pub mod watcher;
pub mod worker;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Complete taskfarm configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FarmConfig {
    pub master: master::MasterConfig,
    pub worker: worker::WorkerConfig,
    pub watcher: watcher::WatcherConfig,
    pub logging: logging::LoggingConfig,
}

impl FarmConfig {
    /// Validate all domain configurations
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.master.validate()?;
        self.worker.validate()?;
        self.watcher.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Render the default configuration as YAML
    pub fn generate_sample() -> String {
        serde_yaml::to_string(&FarmConfig::default())
            .unwrap_or_else(|_| "# Failed to generate sample config".to_string())
    }
}
