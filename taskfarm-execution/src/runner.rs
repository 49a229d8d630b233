//! Closure-backed task runner

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::future::Future;
use taskfarm_core::{Task, TaskFailure, WorkerMemory};
use taskfarm_interfaces::TaskRunner;

/// Runs every task through an async function of its payload.
///
/// Runners that need the worker's memory implement
/// [`TaskRunner`] directly.
pub struct FnRunner<F> {
    f: F,
}

impl<F> FnRunner<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> TaskRunner for FnRunner<F>
where
    F: Fn(JsonValue) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<JsonValue, TaskFailure>> + Send + 'static,
{
    async fn run(&self, task: &Task, _memory: &mut WorkerMemory) -> Result<JsonValue, TaskFailure> {
        (self.f)(task.payload.clone()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use taskfarm_core::TaskId;

    #[tokio::test]
    async fn test_closure_sees_payload() {
        let runner = FnRunner::new(|payload: JsonValue| async move {
            match payload["n"].as_i64() {
                Some(n) => Ok(json!(n + 1)),
                None => Err(TaskFailure::new("missing n")),
            }
        });
        let mut memory = WorkerMemory::new();

        let ok = runner
            .run(&Task::new(TaskId(1), json!({"n": 41})), &mut memory)
            .await;
        assert_eq!(ok.unwrap(), json!(42));

        let failed = runner.run(&Task::new(TaskId(2), json!({})), &mut memory).await;
        assert_eq!(failed.unwrap_err().message, "missing n");
    }
}
