//! How and when results reach the client

mod common;

use anyhow::Result;
use common::{payloads, square_runner, start_farm, test_config, within};
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use std::time::Duration;
use taskfarm_core::{OrderingMode, TaskFailure};
use taskfarm_execution::FnRunner;
use taskfarm_interfaces::TaskRunner;
use taskfarm_master::MasterError;

/// Sleeps for the payload's `delay` in milliseconds and echoes it
fn delay_runner() -> Arc<dyn TaskRunner> {
    Arc::new(FnRunner::new(|payload: JsonValue| async move {
        let delay = payload["delay"]
            .as_u64()
            .ok_or_else(|| TaskFailure::new("missing delay"))?;
        tokio::time::sleep(Duration::from_millis(delay)).await;
        Ok(json!(delay))
    }))
}

fn delays(values: &[u64]) -> Vec<JsonValue> {
    values.iter().map(|d| json!({ "delay": d })).collect()
}

#[tokio::test]
async fn test_submission_order_despite_random_durations() -> Result<()> {
    let farm = start_farm(&test_config(4, OrderingMode::SubmissionOrder), square_runner(10)).await;

    let ids = farm.master().solve(payloads(0..30)).await?;
    let results = within(farm.master().wait_all()).await?;

    let returned: Vec<_> = results.iter().map(|r| r.task_id).collect();
    assert_eq!(returned, ids);

    farm.shutdown(true).await?;
    Ok(())
}

#[tokio::test]
async fn test_completion_order_follows_finishing_time() -> Result<()> {
    let farm = start_farm(&test_config(3, OrderingMode::CompletionOrder), delay_runner()).await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    let ids = farm.master().solve(delays(&[150, 10, 80])).await?;
    let mut order = Vec::new();
    for _ in 0..3 {
        order.push(within(farm.master().wait_one()).await?.task_id);
    }
    assert_eq!(order, vec![ids[1], ids[2], ids[0]]);

    farm.shutdown(true).await?;
    Ok(())
}

#[tokio::test]
async fn test_wait_k_blocks_until_enough_results() -> Result<()> {
    let farm = start_farm(&test_config(2, OrderingMode::CompletionOrder), delay_runner()).await;

    farm.master().solve(delays(&[20, 20, 20, 20])).await?;
    assert!(matches!(
        farm.master().wait_k(5).await,
        Err(MasterError::InvalidWaitCount { k: 5, total: 4 })
    ));

    let first = within(farm.master().wait_k(3)).await?;
    assert_eq!(first.len(), 3);
    let last = within(farm.master().wait_one()).await?;
    assert!(!first.iter().any(|r| r.task_id == last.task_id));

    assert!(farm.master().is_empty().await?);
    assert!(matches!(
        farm.master().wait_k(1).await,
        Err(MasterError::InvalidWaitCount { k: 1, total: 0 })
    ));

    farm.shutdown(true).await?;
    Ok(())
}

#[tokio::test]
async fn test_only_one_client_may_wait() -> Result<()> {
    let farm = start_farm(&test_config(1, OrderingMode::CompletionOrder), delay_runner()).await;
    farm.master().solve(delays(&[100])).await?;

    let master = farm.master().clone();
    let parked = tokio::spawn(async move { master.wait_all().await });
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(matches!(
        farm.master().wait_one().await,
        Err(MasterError::AlreadyWaiting)
    ));

    let results = within(parked).await??;
    assert_eq!(results.len(), 1);

    farm.shutdown(true).await?;
    Ok(())
}

#[tokio::test]
async fn test_switching_to_submission_order_mid_run() -> Result<()> {
    let farm = start_farm(&test_config(3, OrderingMode::CompletionOrder), square_runner(10)).await;

    let ids = farm.master().solve(payloads(0..20)).await?;
    farm.master()
        .set_result_reception_order(OrderingMode::SubmissionOrder)
        .await?;
    let results = within(farm.master().wait_all()).await?;

    // Results released before the switch keep their place; everything after
    // follows submission order
    let returned: Vec<_> = results.iter().map(|r| r.task_id).collect();
    let mut sorted = returned.clone();
    sorted.sort();
    assert_eq!(sorted, ids);

    farm.shutdown(true).await?;
    Ok(())
}

#[tokio::test]
async fn test_parked_wait_fails_on_terminate() -> Result<()> {
    let farm = start_farm(&test_config(1, OrderingMode::CompletionOrder), delay_runner()).await;
    farm.master().solve(delays(&[5_000])).await?;

    let master = farm.master().clone();
    let parked = tokio::spawn(async move { master.wait_all().await });
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(farm.shutdown(false).await?);
    assert!(matches!(within(parked).await?, Err(MasterError::Terminated)));
    Ok(())
}
