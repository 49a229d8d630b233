//! Integration tests for taskfarm-config

use std::io::Write;
use std::time::Duration;

use taskfarm_config::*;
use taskfarm_core::OrderingMode;
use taskfarm_resilience::BackoffStrategy;
use temp_env::with_vars;

#[test]
fn test_default_config_validation() {
    let config = FarmConfig::default();
    assert!(config.validate_all().is_ok());
    assert_eq!(config.master.ordering, OrderingMode::CompletionOrder);
    assert_eq!(config.worker.count, 4);
}

#[test]
fn test_config_loader_from_env() {
    let vars = vec![
        ("TASKFARM_RESULT_ORDER", Some("submission")),
        ("TASKFARM_WORKER_COUNT", Some("8")),
        ("TASKFARM_WORKER_PREFIX", Some("node")),
        ("TASKFARM_POLL_INITIAL_MS", Some("20")),
        ("TASKFARM_POLL_MAX_MS", Some("400")),
        ("TASKFARM_PING_INTERVAL_MS", Some("250")),
        ("TASKFARM_PING_TIMEOUT_MS", Some("100")),
        ("TASKFARM_LOG_LEVEL", Some("debug")),
        ("TASKFARM_LOG_FORMAT", Some("json")),
    ];

    with_vars(vars, || {
        let config = ConfigLoader::new().from_env().unwrap();

        assert_eq!(config.master.ordering, OrderingMode::SubmissionOrder);
        assert_eq!(config.worker.count, 8);
        assert_eq!(config.worker.name_prefix, "node");
        assert_eq!(config.worker.poll.initial_delay, Duration::from_millis(20));
        assert_eq!(config.worker.poll.max_delay, Duration::from_millis(400));
        assert_eq!(config.watcher.ping_interval, Duration::from_millis(250));
        assert_eq!(config.watcher.ping_timeout, Duration::from_millis(100));
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.format, LogFormat::Json);
    });
}

#[test]
fn test_invalid_env_value_is_reported() {
    with_vars(vec![("TASKFARM_WORKER_COUNT", Some("many"))], || {
        let err = ConfigLoader::new().from_env().unwrap_err();
        assert!(matches!(err, ConfigError::EnvError(_)));
        assert!(err.to_string().contains("WORKER_COUNT"));
    });

    with_vars(vec![("TASKFARM_RESULT_ORDER", Some("random"))], || {
        assert!(ConfigLoader::new().from_env().is_err());
    });
}

#[test]
fn test_env_overrides_are_validated() {
    with_vars(
        vec![
            ("TASKFARM_PING_INTERVAL_MS", Some("100")),
            ("TASKFARM_PING_TIMEOUT_MS", Some("500")),
        ],
        || {
            let err = ConfigLoader::new().from_env().unwrap_err();
            assert!(matches!(err, ConfigError::DomainError { ref domain, .. } if domain == "watcher"));
        },
    );
}

#[test]
fn test_custom_prefix() {
    with_vars(vec![("FARM_WORKER_COUNT", Some("2"))], || {
        let config = ConfigLoader::with_prefix("FARM").from_env().unwrap();
        assert_eq!(config.worker.count, 2);
    });
}

#[test]
fn test_yaml_file_with_env_override() {
    let yaml = r#"
master:
  ordering: submission_order

worker:
  count: 3
  name_prefix: "farmhand"
  memory:
    offset: 10
  poll:
    strategy:
      type: linear
    initial_delay: 5
    max_delay: 50
    jitter: false

watcher:
  ping_interval: 200
  ping_timeout: 50

logging:
  level: warn
  format: compact
"#;
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();

    with_vars(vec![("TASKFARM_WORKER_COUNT", Some("6"))], || {
        let config = ConfigLoader::new().from_file(file.path()).unwrap();

        assert_eq!(config.master.ordering, OrderingMode::SubmissionOrder);
        assert_eq!(config.worker.count, 6);
        assert_eq!(config.worker.name_prefix, "farmhand");
        assert_eq!(config.worker.memory["offset"], serde_json::json!(10));
        assert_eq!(config.worker.poll.strategy, BackoffStrategy::Linear);
        assert_eq!(config.worker.poll.max_delay, Duration::from_millis(50));
        assert!(!config.worker.poll.jitter);
        assert_eq!(config.watcher.ping_timeout, Duration::from_millis(50));
        assert_eq!(config.logging.format, LogFormat::Compact);
    });
}

#[test]
fn test_partial_yaml_uses_defaults() {
    let config: FarmConfig = serde_yaml::from_str("worker:\n  count: 1\n").unwrap();
    assert_eq!(config.worker.count, 1);
    assert_eq!(config.worker.name_prefix, "worker");
    assert_eq!(config.watcher, WatcherConfig::default());
}

#[test]
fn test_missing_file_is_a_read_error() {
    let err = ConfigLoader::new()
        .from_file("/definitely/not/here.yaml")
        .unwrap_err();
    assert!(matches!(err, ConfigError::FileReadError(_)));
}

#[test]
fn test_generated_sample_round_trips() {
    let sample = FarmConfig::generate_sample();
    let parsed: FarmConfig = serde_yaml::from_str(&sample).unwrap();
    assert_eq!(parsed, FarmConfig::default());
    assert!(parsed.validate_all().is_ok());
}
