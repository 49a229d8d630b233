use anyhow::{anyhow, Context, Result};
use rand::Rng;
use serde_json::{json, Value as JsonValue};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use taskfarm_config::{ConfigLoader, FarmConfig, LogLevel};
use taskfarm_core::{TaskFailure, TaskResult};
use taskfarm_execution::{FnRunner, LocalFarm};
use taskfarm_logging::init_logging_from_config;
use taskfarm_storage::InMemoryTaskRepository;
use tracing::{info, warn};

use crate::cli::RunArgs;

pub async fn execute(config_path: Option<&Path>, log_level: Option<&str>, args: RunArgs) -> Result<()> {
    let config = load_config(config_path, log_level, &args)?;
    init_logging_from_config(&config.logging)?;

    let repository = Arc::new(InMemoryTaskRepository::new());
    let farm = LocalFarm::start(&config, Arc::new(FnRunner::new(square)), repository)
        .await
        .context("Failed to start local farm")?;

    let payloads: Vec<JsonValue> = (0..args.tasks).map(|n| json!({ "n": n })).collect();
    let ids = farm
        .master()
        .solve(payloads)
        .await
        .context("Failed to submit tasks")?;
    info!(tasks = ids.len(), workers = config.worker.count, "Demo started");

    if let Some(name) = args.kill.clone() {
        let provisioner = farm.provisioner().clone();
        let delay = Duration::from_millis(args.kill_after_ms);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if !provisioner.kill(&name) {
                warn!(worker = %name, "No such worker to kill");
            }
        });
    }

    if !ids.is_empty() {
        let outcome = tokio::select! {
            results = farm.master().wait_all() => Some(results),
            _ = tokio::signal::ctrl_c() => None,
        };
        match outcome {
            Some(results) => print_results(&results.context("Waiting for results failed")?)?,
            None => {
                warn!("Interrupted, terminating master");
                farm.shutdown(true).await?;
                return Err(anyhow!("interrupted before all results arrived"));
            }
        }
    }

    farm.shutdown(true).await.context("Failed to shut down local farm")?;
    Ok(())
}

fn load_config(config_path: Option<&Path>, log_level: Option<&str>, args: &RunArgs) -> Result<FarmConfig> {
    let mut config = ConfigLoader::new()
        .load(config_path)
        .context("Failed to load configuration")?;

    if let Some(level) = log_level {
        config.logging.level = level.parse::<LogLevel>().map_err(|e| anyhow!(e))?;
    }
    if let Some(workers) = args.workers {
        config.worker.count = workers;
    }
    if let Some(order) = args.order {
        config.master.ordering = order;
    }
    Ok(config)
}

/// Demo task: square `n` after a short random pause
async fn square(payload: JsonValue) -> Result<JsonValue, TaskFailure> {
    let n = payload["n"]
        .as_i64()
        .ok_or_else(|| TaskFailure::new("payload has no integer 'n'"))?;
    let pause = rand::thread_rng().gen_range(1..=25);
    tokio::time::sleep(Duration::from_millis(pause)).await;
    Ok(json!({ "n": n, "square": n * n }))
}

fn print_results(results: &[TaskResult]) -> Result<()> {
    for result in results {
        println!("{}", serde_json::to_string(result)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_square_payloads() {
        assert_eq!(
            square(json!({ "n": 7 })).await.unwrap(),
            json!({ "n": 7, "square": 49 })
        );
        assert!(square(json!({ "n": "seven" })).await.is_err());
    }

    #[test]
    fn test_arguments_override_configuration() {
        let args = RunArgs {
            tasks: 3,
            workers: Some(2),
            order: Some(taskfarm_core::OrderingMode::SubmissionOrder),
            kill: None,
            kill_after_ms: 0,
        };
        let config = load_config(None, Some("debug"), &args).unwrap();
        assert_eq!(config.worker.count, 2);
        assert_eq!(config.master.ordering, taskfarm_core::OrderingMode::SubmissionOrder);
        assert_eq!(config.logging.level, LogLevel::Debug);
    }
}
