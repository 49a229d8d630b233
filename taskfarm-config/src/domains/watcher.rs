//! Liveness watcher configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigResult;
use crate::validation::{validate_positive, Validatable};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    /// Time between two probe rounds
    #[serde(with = "crate::domains::utils::serde_duration_ms")]
    pub ping_interval: Duration,

    /// A worker that does not answer within this delay is reported dead
    #[serde(with = "crate::domains::utils::serde_duration_ms")]
    pub ping_timeout: Duration,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            ping_interval: Duration::from_secs(1),
            ping_timeout: Duration::from_millis(500),
        }
    }
}

impl Validatable for WatcherConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.ping_interval.as_millis(), "ping_interval", self.domain_name())?;
        validate_positive(self.ping_timeout.as_millis(), "ping_timeout", self.domain_name())?;

        if self.ping_timeout > self.ping_interval {
            return Err(self.validation_error("ping_timeout must not exceed ping_interval"));
        }
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "watcher"
    }
}
