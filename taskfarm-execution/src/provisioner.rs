//! Provisioner starting workers as tokio tasks

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use taskfarm_config::WorkerConfig;
use taskfarm_core::{ResourceDescriptor, WorkerMemory};
use taskfarm_interfaces::{ProvisionError, TaskRunner, TaskSource, WorkerHandle, WorkerProvisioner};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::link::LocalLink;
use crate::worker::{LocalWorker, WorkerReport};

struct RunningWorker {
    link: Arc<LocalLink>,
    cancel: CancellationToken,
    task: JoinHandle<WorkerReport>,
}

/// Starts named in-process workers on request.
///
/// Workers introduce themselves to the master on their first poll; the
/// provisioner only keeps what it needs to stop them again.
pub struct LocalProvisioner {
    source: Arc<dyn TaskSource>,
    runner: Arc<dyn TaskRunner>,
    config: WorkerConfig,
    workers: Mutex<HashMap<String, RunningWorker>>,
    next_index: AtomicUsize,
    shut_down: AtomicBool,
}

impl LocalProvisioner {
    pub fn new(source: Arc<dyn TaskSource>, runner: Arc<dyn TaskRunner>, config: WorkerConfig) -> Self {
        Self {
            source,
            runner,
            config,
            workers: Mutex::new(HashMap::new()),
            next_index: AtomicUsize::new(0),
            shut_down: AtomicBool::new(false),
        }
    }

    fn spawn_worker(&self) -> String {
        let index = self.next_index.fetch_add(1, Ordering::SeqCst);
        let name = format!("{}-{}", self.config.name_prefix, index);

        let link = Arc::new(LocalLink::new(name.clone()));
        let handle = WorkerHandle::new(name.clone(), link.clone());
        let cancel = CancellationToken::new();
        let worker = LocalWorker::new(
            handle,
            link.clone(),
            self.source.clone(),
            self.runner.clone(),
            WorkerMemory::from(self.config.memory.clone()),
            self.config.poll.backoff(),
            cancel.clone(),
        );

        let task = tokio::spawn(worker.run());
        self.workers
            .lock()
            .insert(name.clone(), RunningWorker { link, cancel, task });
        name
    }

    /// Abort a worker without letting it finish its task, as a crash would.
    ///
    /// The master only learns about it through its liveness watcher.
    pub fn kill(&self, name: &str) -> bool {
        let Some(worker) = self.workers.lock().remove(name) else {
            return false;
        };
        warn!(worker = %name, "Killing worker");
        worker.link.mark_stopped();
        worker.task.abort();
        true
    }

    /// Names of the workers started and not yet taken back, sorted
    pub fn worker_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.workers.lock().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WorkerProvisioner for LocalProvisioner {
    async fn add_resources(&self, descriptor: ResourceDescriptor) -> Result<(), ProvisionError> {
        if self.is_shut_down() {
            return Err(ProvisionError::ShutDown);
        }

        match descriptor {
            ResourceDescriptor::Local { count } => {
                let names: Vec<String> = (0..count).map(|_| self.spawn_worker()).collect();
                info!(count, workers = ?names, "Started local workers");
                Ok(())
            }
            other => Err(ProvisionError::Unsupported(format!(
                "local provisioner cannot start '{}' resources",
                other.kind()
            ))),
        }
    }

    async fn release(&self, workers: Vec<WorkerHandle>) -> Result<(), ProvisionError> {
        for handle in workers {
            let removed = self.workers.lock().remove(handle.name());
            match removed {
                Some(worker) => {
                    debug!(worker = %handle.name(), "Releasing worker");
                    worker.cancel.cancel();
                }
                None => debug!(worker = %handle.name(), "Released worker is not running here"),
            }
        }
        Ok(())
    }

    async fn shutdown(&self, free_resources: bool) -> Result<(), ProvisionError> {
        self.shut_down.store(true, Ordering::SeqCst);
        let workers: Vec<(String, RunningWorker)> = self.workers.lock().drain().collect();
        info!(free_resources, remaining = workers.len(), "Shutting down local provisioner");

        if !free_resources {
            // Left running: they stop once the master answers that it has
            // terminated
            return Ok(());
        }

        for (_, worker) in &workers {
            worker.cancel.cancel();
        }
        for (name, worker) in workers {
            match worker.task.await {
                Ok(report) => debug!(worker = %name, completed = report.completed, "Worker joined"),
                Err(e) => warn!(worker = %name, "Worker task failed: {}", e),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value as JsonValue};
    use std::time::Duration;
    use taskfarm_core::{Task, TaskAssignment, TaskFailure, TaskResult};
    use taskfarm_interfaces::SourceError;

    /// Never has work
    struct IdleSource {
        polls: AtomicUsize,
    }

    #[async_trait]
    impl TaskSource for IdleSource {
        async fn request_task(&self, _worker: WorkerHandle) -> Result<TaskAssignment, SourceError> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            Ok(TaskAssignment::NoTask)
        }

        async fn submit_result_and_request_task(
            &self,
            _result: TaskResult,
            _worker: WorkerHandle,
        ) -> Result<TaskAssignment, SourceError> {
            Ok(TaskAssignment::NoTask)
        }
    }

    struct EchoRunner;

    #[async_trait]
    impl TaskRunner for EchoRunner {
        async fn run(&self, task: &Task, _memory: &mut WorkerMemory) -> Result<JsonValue, TaskFailure> {
            Ok(task.payload.clone())
        }
    }

    fn provisioner() -> (LocalProvisioner, Arc<IdleSource>) {
        let source = Arc::new(IdleSource {
            polls: AtomicUsize::new(0),
        });
        let mut config = WorkerConfig::default();
        config.name_prefix = "local".to_string();
        config.memory.insert("seed".to_string(), json!(1));
        let provisioner = LocalProvisioner::new(source.clone(), Arc::new(EchoRunner), config);
        (provisioner, source)
    }

    #[tokio::test]
    async fn test_local_descriptor_starts_named_workers() {
        let (provisioner, source) = provisioner();
        provisioner
            .add_resources(ResourceDescriptor::Local { count: 2 })
            .await
            .unwrap();
        provisioner
            .add_resources(ResourceDescriptor::Local { count: 1 })
            .await
            .unwrap();

        assert_eq!(provisioner.worker_names(), vec!["local-0", "local-1", "local-2"]);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(source.polls.load(Ordering::SeqCst) >= 3);

        provisioner.shutdown(true).await.unwrap();
        assert!(provisioner.worker_names().is_empty());
    }

    #[tokio::test]
    async fn test_remote_descriptors_are_unsupported() {
        let (provisioner, _) = provisioner();
        let result = provisioner
            .add_resources(ResourceDescriptor::Nodes {
                urls: vec!["rmi://host/node".to_string()],
            })
            .await;
        assert!(matches!(result, Err(ProvisionError::Unsupported(_))));
    }

    #[tokio::test]
    async fn test_release_and_kill_remove_workers() {
        let (provisioner, _) = provisioner();
        provisioner
            .add_resources(ResourceDescriptor::Local { count: 2 })
            .await
            .unwrap();

        let released = WorkerHandle::new("local-0", Arc::new(LocalLink::new("local-0")));
        provisioner.release(vec![released]).await.unwrap();
        assert_eq!(provisioner.worker_names(), vec!["local-1"]);

        assert!(provisioner.kill("local-1"));
        assert!(!provisioner.kill("local-1"));
        assert!(provisioner.worker_names().is_empty());
    }

    #[tokio::test]
    async fn test_no_resources_after_shutdown() {
        let (provisioner, _) = provisioner();
        provisioner.shutdown(false).await.unwrap();

        let result = provisioner
            .add_resources(ResourceDescriptor::Local { count: 1 })
            .await;
        assert!(matches!(result, Err(ProvisionError::ShutDown)));
    }
}
