//! Worker loop running tasks pulled from the master

use std::future::Future;
use std::sync::Arc;

use taskfarm_core::{Task, TaskAssignment, TaskResult, WorkerMemory};
use taskfarm_interfaces::{SourceError, TaskRunner, TaskSource, WorkerHandle};
use taskfarm_resilience::PollBackoff;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::link::LocalLink;

/// Why a worker loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The master answered that it has terminated
    MasterTerminated,
    /// The provisioner took the worker back
    Cancelled,
}

/// Summary returned by a finished worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerReport {
    pub name: String,
    pub completed: usize,
    pub reason: StopReason,
}

/// One worker: asks for a task, runs it, hands back the result together
/// with the next request.
///
/// When told there is no task it sleeps for its backoff delay, or less if
/// the master wakes it up.
pub struct LocalWorker {
    handle: WorkerHandle,
    link: Arc<LocalLink>,
    source: Arc<dyn TaskSource>,
    runner: Arc<dyn TaskRunner>,
    memory: WorkerMemory,
    backoff: PollBackoff,
    cancel: CancellationToken,
}

impl LocalWorker {
    pub fn new(
        handle: WorkerHandle,
        link: Arc<LocalLink>,
        source: Arc<dyn TaskSource>,
        runner: Arc<dyn TaskRunner>,
        memory: WorkerMemory,
        backoff: PollBackoff,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            handle,
            link,
            source,
            runner,
            memory,
            backoff,
            cancel,
        }
    }

    pub fn name(&self) -> &str {
        self.handle.name()
    }

    pub async fn run(mut self) -> WorkerReport {
        info!(worker = %self.name(), "Worker started");
        let mut completed = 0;
        let mut next = self
            .call(self.source.request_task(self.handle.clone()))
            .await;

        let reason = loop {
            let assignment = match next {
                None => break StopReason::Cancelled,
                Some(Ok(assignment)) => assignment,
                Some(Err(SourceError::Terminated)) => break StopReason::MasterTerminated,
                Some(Err(e)) => {
                    warn!(worker = %self.name(), "Master call failed: {}", e);
                    TaskAssignment::NoTask
                }
            };

            next = match assignment {
                TaskAssignment::Task(task) => {
                    self.backoff.reset();
                    let result = self.execute(task).await;
                    completed += 1;
                    self.call(
                        self.source
                            .submit_result_and_request_task(result, self.handle.clone()),
                    )
                    .await
                }
                TaskAssignment::NoTask => {
                    if !self.idle().await {
                        break StopReason::Cancelled;
                    }
                    self.call(self.source.request_task(self.handle.clone()))
                        .await
                }
            };
        };

        self.link.mark_stopped();
        info!(worker = %self.name(), completed, ?reason, "Worker stopped");
        WorkerReport {
            name: self.name().to_string(),
            completed,
            reason,
        }
    }

    /// Await a master call unless cancelled first
    async fn call(
        &self,
        request: impl Future<Output = Result<TaskAssignment, SourceError>>,
    ) -> Option<Result<TaskAssignment, SourceError>> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            outcome = request => Some(outcome),
        }
    }

    async fn execute(&mut self, task: Task) -> TaskResult {
        debug!(worker = %self.handle.name(), task_id = %task.id, "Running task");
        match self.runner.run(&task, &mut self.memory).await {
            Ok(output) => TaskResult::success(task.id, output, self.handle.name()),
            Err(failure) => {
                debug!(task_id = %task.id, "Task failed: {}", failure);
                TaskResult::failure(task.id, failure, self.handle.name())
            }
        }
    }

    /// Wait before polling again; false if cancelled meanwhile
    async fn idle(&mut self) -> bool {
        let delay = self.backoff.next_delay();
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = self.link.notified() => {
                debug!(worker = %self.handle.name(), "Woken by master");
                true
            }
            _ = tokio::time::sleep(delay) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::{json, Value as JsonValue};
    use std::collections::VecDeque;
    use std::time::Duration;
    use taskfarm_core::{TaskFailure, TaskId};
    use taskfarm_interfaces::WorkerLink;
    use taskfarm_resilience::{BackoffCalculator, BackoffStrategy};

    /// Answers polls from a script, then reports termination
    #[derive(Default)]
    struct ScriptedSource {
        script: Mutex<VecDeque<TaskAssignment>>,
        results: Mutex<Vec<TaskResult>>,
        requests: Mutex<usize>,
    }

    impl ScriptedSource {
        fn new(script: Vec<TaskAssignment>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                ..Default::default()
            }
        }

        fn next(&self) -> Result<TaskAssignment, SourceError> {
            *self.requests.lock() += 1;
            self.script.lock().pop_front().ok_or(SourceError::Terminated)
        }
    }

    #[async_trait]
    impl TaskSource for ScriptedSource {
        async fn request_task(&self, _worker: WorkerHandle) -> Result<TaskAssignment, SourceError> {
            self.next()
        }

        async fn submit_result_and_request_task(
            &self,
            result: TaskResult,
            _worker: WorkerHandle,
        ) -> Result<TaskAssignment, SourceError> {
            self.results.lock().push(result);
            self.next()
        }
    }

    /// Squares `n`, fails on negative input, counts calls in memory
    struct SquareRunner;

    #[async_trait]
    impl TaskRunner for SquareRunner {
        async fn run(&self, task: &Task, memory: &mut WorkerMemory) -> Result<JsonValue, TaskFailure> {
            let runs = memory.get("runs").and_then(JsonValue::as_u64).unwrap_or(0);
            memory.insert("runs", json!(runs + 1));

            let n = task.payload["n"].as_i64().unwrap_or(0);
            if n < 0 {
                return Err(TaskFailure::new("negative input"));
            }
            Ok(json!({ "square": n * n, "runs": runs + 1 }))
        }
    }

    fn task(id: u64, n: i64) -> TaskAssignment {
        TaskAssignment::Task(Task::new(TaskId(id), json!({ "n": n })))
    }

    fn worker(source: Arc<ScriptedSource>, poll: Duration) -> (LocalWorker, Arc<LocalLink>, CancellationToken) {
        let link = Arc::new(LocalLink::new("worker-0"));
        let handle = WorkerHandle::new("worker-0", link.clone());
        let backoff = PollBackoff::new(BackoffCalculator::new(
            BackoffStrategy::Fixed,
            poll,
            poll,
            false,
        ));
        let cancel = CancellationToken::new();
        let worker = LocalWorker::new(
            handle,
            link.clone(),
            source,
            Arc::new(SquareRunner),
            WorkerMemory::new(),
            backoff,
            cancel.clone(),
        );
        (worker, link, cancel)
    }

    #[tokio::test]
    async fn test_runs_tasks_until_master_terminates() {
        let source = Arc::new(ScriptedSource::new(vec![task(1, 3), task(2, -1)]));
        let (worker, link, _) = worker(source.clone(), Duration::from_millis(5));

        let report = worker.run().await;
        assert_eq!(report.reason, StopReason::MasterTerminated);
        assert_eq!(report.completed, 2);
        assert!(!link.is_alive());

        let results = source.results.lock();
        assert_eq!(results[0].output(), Some(&json!({ "square": 9, "runs": 1 })));
        assert!(!results[1].is_success());
        assert_eq!(results[1].worker, "worker-0");
    }

    #[tokio::test]
    async fn test_wake_cuts_backoff_short() {
        let source = Arc::new(ScriptedSource::new(vec![TaskAssignment::NoTask, task(1, 2)]));
        let (worker, link, _) = worker(source.clone(), Duration::from_secs(30));

        let running = tokio::spawn(worker.run());
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(*source.requests.lock(), 1);

        link.wake();
        let report = tokio::time::timeout(Duration::from_secs(1), running)
            .await
            .expect("worker polled again after wake")
            .unwrap();
        assert_eq!(report.completed, 1);
    }

    #[tokio::test]
    async fn test_cancel_stops_idle_worker() {
        let source = Arc::new(ScriptedSource::new(vec![TaskAssignment::NoTask]));
        let (worker, _, cancel) = worker(source, Duration::from_secs(30));

        let running = tokio::spawn(worker.run());
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();

        let report = tokio::time::timeout(Duration::from_secs(1), running)
            .await
            .expect("cancelled worker stops")
            .unwrap();
        assert_eq!(report.reason, StopReason::Cancelled);
        assert_eq!(report.completed, 0);
    }
}
