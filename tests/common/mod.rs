//! Shared setup for the integration tests

#![allow(dead_code)]

use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use std::time::Duration;
use taskfarm_config::FarmConfig;
use taskfarm_core::{OrderingMode, TaskFailure};
use taskfarm_execution::{FnRunner, LocalFarm};
use taskfarm_interfaces::TaskRunner;
use taskfarm_storage::InMemoryTaskRepository;

/// Config with fast heartbeats and polling, suitable for tests
pub fn test_config(workers: usize, ordering: OrderingMode) -> FarmConfig {
    let mut config = FarmConfig::default();
    config.worker.count = workers;
    config.master.ordering = ordering;
    config.worker.poll.initial_delay = Duration::from_millis(5);
    config.worker.poll.max_delay = Duration::from_millis(50);
    config.watcher.ping_interval = Duration::from_millis(20);
    config.watcher.ping_timeout = Duration::from_millis(10);
    config
}

/// Squares `n` after a random pause of up to `max_pause_ms`; negative `n` fails
pub fn square_runner(max_pause_ms: u64) -> Arc<dyn TaskRunner> {
    Arc::new(FnRunner::new(move |payload: JsonValue| async move {
        let pause = fastrand::u64(0..=max_pause_ms);
        tokio::time::sleep(Duration::from_millis(pause)).await;
        match payload["n"].as_i64() {
            Some(n) if n >= 0 => Ok(json!(n * n)),
            Some(n) => Err(TaskFailure::new(format!("cannot square {}", n))),
            None => Err(TaskFailure::new("missing n")),
        }
    }))
}

pub fn payloads(range: std::ops::Range<i64>) -> Vec<JsonValue> {
    range.map(|n| json!({ "n": n })).collect()
}

pub async fn start_farm(config: &FarmConfig, runner: Arc<dyn TaskRunner>) -> LocalFarm {
    LocalFarm::start(config, runner, Arc::new(InMemoryTaskRepository::new()))
        .await
        .expect("farm starts")
}

/// Fails the test instead of hanging when results never arrive
pub async fn within<F: std::future::Future>(future: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(10), future)
        .await
        .expect("operation finished in time")
}
