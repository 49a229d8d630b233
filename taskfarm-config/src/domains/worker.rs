//! Local worker configuration

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::time::Duration;
use taskfarm_resilience::{BackoffCalculator, BackoffStrategy, PollBackoff};

use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_required_string, Validatable};

/// Workers started by the local provisioner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Workers started with the farm
    pub count: usize,

    /// Workers are named `<name_prefix>-<n>`
    pub name_prefix: String,

    /// Initial contents of every worker's memory
    pub memory: HashMap<String, JsonValue>,

    pub poll: PollConfig,
}

/// Backoff of a worker that was told there is no task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub strategy: BackoffStrategy,

    #[serde(with = "crate::domains::utils::serde_duration_ms")]
    pub initial_delay: Duration,

    #[serde(with = "crate::domains::utils::serde_duration_ms")]
    pub max_delay: Duration,

    #[serde(default = "crate::domains::utils::default_true")]
    pub jitter: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            count: 4,
            name_prefix: "worker".to_string(),
            memory: HashMap::new(),
            poll: PollConfig::default(),
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            strategy: BackoffStrategy::default(),
            initial_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(2),
            jitter: true,
        }
    }
}

impl PollConfig {
    /// Fresh backoff state for one worker
    pub fn backoff(&self) -> PollBackoff {
        PollBackoff::new(BackoffCalculator::new(
            self.strategy.clone(),
            self.initial_delay,
            self.max_delay,
            self.jitter,
        ))
    }
}

impl Validatable for WorkerConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.name_prefix, "name_prefix", self.domain_name())?;
        validate_positive(
            self.poll.initial_delay.as_millis(),
            "poll.initial_delay",
            self.domain_name(),
        )?;

        if self.poll.max_delay < self.poll.initial_delay {
            return Err(self.validation_error("poll.max_delay must not be below poll.initial_delay"));
        }

        if let BackoffStrategy::Exponential { base } = self.poll.strategy {
            if base.is_nan() || base < 1.0 {
                return Err(self.validation_error(format!(
                    "poll.strategy base must be at least 1.0, got {}",
                    base
                )));
            }
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "worker"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_worker_config_is_valid() {
        assert!(WorkerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_shrinking_backoff_is_rejected() {
        let mut config = WorkerConfig::default();
        config.poll.strategy = BackoffStrategy::Exponential { base: 0.5 };
        assert!(config.validate().is_err());

        let mut config = WorkerConfig::default();
        config.poll.max_delay = Duration::from_millis(10);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_backoff_follows_poll_settings() {
        let poll = PollConfig {
            strategy: BackoffStrategy::Linear,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(25),
            jitter: false,
        };
        let mut backoff = poll.backoff();
        assert_eq!(backoff.next_delay(), Duration::from_millis(10));
        assert_eq!(backoff.next_delay(), Duration::from_millis(20));
        assert_eq!(backoff.next_delay(), Duration::from_millis(25));
    }
}
