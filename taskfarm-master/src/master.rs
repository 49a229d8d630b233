//! Client facade over a running coordinator

use std::sync::Arc;

use serde_json::Value as JsonValue;
use taskfarm_core::{OrderingMode, ResourceDescriptor, TaskId, TaskResult};
use taskfarm_interfaces::TaskRepository;
use tracing::info;

use crate::error::MasterResult;
use crate::handle::MasterHandle;

/// What the submitting client holds.
///
/// Payloads go to the repository; only their ids travel to the coordinator.
#[derive(Clone)]
pub struct Master {
    handle: MasterHandle,
    repository: Arc<dyn TaskRepository>,
}

impl Master {
    pub fn new(handle: MasterHandle, repository: Arc<dyn TaskRepository>) -> Self {
        Self { handle, repository }
    }

    /// Store payloads and submit them as new tasks, in order
    pub async fn solve(&self, payloads: Vec<JsonValue>) -> MasterResult<Vec<TaskId>> {
        let mut ids = Vec::with_capacity(payloads.len());
        for payload in payloads {
            ids.push(self.repository.store(payload).await?);
        }
        info!(count = ids.len(), "Submitting tasks");
        self.handle.submit(ids.clone()).await?;
        Ok(ids)
    }

    /// Submit ids whose payloads are already in the repository
    pub async fn submit(&self, ids: Vec<TaskId>) -> MasterResult<()> {
        self.handle.submit(ids).await
    }

    pub async fn wait_one(&self) -> MasterResult<TaskResult> {
        self.handle.wait_one().await
    }

    pub async fn wait_all(&self) -> MasterResult<Vec<TaskResult>> {
        self.handle.wait_all().await
    }

    pub async fn wait_k(&self, k: usize) -> MasterResult<Vec<TaskResult>> {
        self.handle.wait_k(k).await
    }

    pub async fn count_available_results(&self) -> MasterResult<usize> {
        self.handle.count_available_results().await
    }

    /// True when no result is owed and none is left to collect
    pub async fn is_empty(&self) -> MasterResult<bool> {
        self.handle.is_empty().await
    }

    pub async fn set_result_reception_order(&self, mode: OrderingMode) -> MasterResult<()> {
        self.handle.set_ordering_mode(mode).await
    }

    pub async fn pool_size(&self) -> MasterResult<usize> {
        self.handle.pool_size().await
    }

    pub async fn add_resources(&self, descriptor: ResourceDescriptor) -> MasterResult<()> {
        self.handle.add_resources(descriptor).await
    }

    /// Stop the coordinator. With `free_resources` the provisioner also
    /// stops every worker it started.
    pub async fn terminate(&self, free_resources: bool) -> MasterResult<bool> {
        self.handle.terminate(free_resources).await
    }

    pub fn handle(&self) -> &MasterHandle {
        &self.handle
    }

    pub fn repository(&self) -> &Arc<dyn TaskRepository> {
        &self.repository
    }
}
