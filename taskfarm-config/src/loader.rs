//! Configuration loading and environment variable handling

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use taskfarm_core::OrderingMode;

use crate::domains::logging::{LogFormat, LogLevel, LoggingConfig};
use crate::domains::master::MasterConfig;
use crate::domains::watcher::WatcherConfig;
use crate::domains::worker::WorkerConfig;
use crate::domains::FarmConfig;
use crate::error::{ConfigError, ConfigResult};

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl ConfigLoader {
    /// Create a loader reading `TASKFARM_*` variables
    pub fn new() -> Self {
        Self {
            prefix: "TASKFARM".to_string(),
        }
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load configuration from a YAML file with environment overrides
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<FarmConfig> {
        let content = std::fs::read_to_string(path)?;
        let mut config: FarmConfig = serde_yaml::from_str(&content)?;

        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;

        Ok(config)
    }

    /// Load configuration from defaults and environment variables only
    pub fn from_env(&self) -> ConfigResult<FarmConfig> {
        let mut config = FarmConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<FarmConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    fn apply_env_overrides(&self, config: &mut FarmConfig) -> ConfigResult<()> {
        self.apply_master_overrides(&mut config.master)?;
        self.apply_worker_overrides(&mut config.worker)?;
        self.apply_watcher_overrides(&mut config.watcher)?;
        self.apply_logging_overrides(&mut config.logging)?;
        Ok(())
    }

    fn apply_master_overrides(&self, config: &mut MasterConfig) -> ConfigResult<()> {
        if let Ok(order) = self.get_env_var("RESULT_ORDER") {
            config.ordering = OrderingMode::from_str(&order)
                .map_err(|e| ConfigError::EnvError(format!("Invalid RESULT_ORDER: {}", e)))?;
        }
        Ok(())
    }

    fn apply_worker_overrides(&self, config: &mut WorkerConfig) -> ConfigResult<()> {
        if let Ok(count) = self.get_env_var("WORKER_COUNT") {
            config.count = count
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid WORKER_COUNT: {}", e)))?;
        }

        if let Ok(prefix) = self.get_env_var("WORKER_PREFIX") {
            config.name_prefix = prefix;
        }

        if let Ok(millis) = self.get_env_var("POLL_INITIAL_MS") {
            config.poll.initial_delay = parse_millis("POLL_INITIAL_MS", &millis)?;
        }

        if let Ok(millis) = self.get_env_var("POLL_MAX_MS") {
            config.poll.max_delay = parse_millis("POLL_MAX_MS", &millis)?;
        }

        Ok(())
    }

    fn apply_watcher_overrides(&self, config: &mut WatcherConfig) -> ConfigResult<()> {
        if let Ok(millis) = self.get_env_var("PING_INTERVAL_MS") {
            config.ping_interval = parse_millis("PING_INTERVAL_MS", &millis)?;
        }

        if let Ok(millis) = self.get_env_var("PING_TIMEOUT_MS") {
            config.ping_timeout = parse_millis("PING_TIMEOUT_MS", &millis)?;
        }

        Ok(())
    }

    fn apply_logging_overrides(&self, config: &mut LoggingConfig) -> ConfigResult<()> {
        if let Ok(log_level) = self.get_env_var("LOG_LEVEL") {
            config.level = LogLevel::from_str(&log_level)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_LEVEL: {}", log_level)))?;
        }

        if let Ok(format) = self.get_env_var("LOG_FORMAT") {
            config.format = LogFormat::from_str(&format)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_FORMAT: {}", format)))?;
        }

        Ok(())
    }

    fn get_env_var(&self, name: &str) -> Result<String, std::env::VarError> {
        std::env::var(format!("{}_{}", self.prefix, name))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_millis(name: &str, value: &str) -> ConfigResult<Duration> {
    let millis: u64 = value
        .parse()
        .map_err(|e| ConfigError::EnvError(format!("Invalid {}: {}", name, e)))?;
    Ok(Duration::from_millis(millis))
}
