//! Cloneable access to a running coordinator

use async_trait::async_trait;
use taskfarm_core::{OrderingMode, ResourceDescriptor, TaskAssignment, TaskId, TaskResult};
use taskfarm_interfaces::{DeathListener, SourceError, TaskSource, WorkerHandle};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::command::{MasterCommand, Reply, WaitRequest};
use crate::error::{MasterError, MasterResult};

/// Receiving end of the coordinator's inbox
pub type MasterInbox = mpsc::UnboundedReceiver<MasterCommand>;

/// Create the inbox of a coordinator together with the first handle on it.
///
/// Collaborators that call back into the master (workers through a
/// provisioner, the liveness watcher) are built from the handle before the
/// coordinator itself is constructed from the inbox.
pub fn master_channel() -> (MasterHandle, MasterInbox) {
    let (sender, inbox) = mpsc::unbounded_channel();
    (MasterHandle { sender }, inbox)
}

/// Handle for sending calls to the coordinator.
///
/// Every call is answered once the coordinator has processed it. A
/// coordinator that has stopped answers everything with
/// [`MasterError::Terminated`].
#[derive(Debug, Clone)]
pub struct MasterHandle {
    sender: mpsc::UnboundedSender<MasterCommand>,
}

impl MasterHandle {
    async fn call<T>(&self, command: impl FnOnce(Reply<T>) -> MasterCommand) -> MasterResult<T> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(command(reply))
            .map_err(|_| MasterError::Terminated)?;
        response.await.map_err(|_| MasterError::Terminated)?
    }

    /// Queue task ids for dispatch
    pub async fn submit(&self, ids: Vec<TaskId>) -> MasterResult<()> {
        self.call(|reply| MasterCommand::Submit { ids, reply }).await
    }

    pub async fn request_task(&self, worker: WorkerHandle) -> MasterResult<TaskAssignment> {
        self.call(|reply| MasterCommand::RequestTask { worker, reply })
            .await
    }

    pub async fn submit_result_and_request_task(
        &self,
        result: TaskResult,
        worker: WorkerHandle,
    ) -> MasterResult<TaskAssignment> {
        self.call(|reply| MasterCommand::SubmitResult {
            result,
            worker,
            reply,
        })
        .await
    }

    pub async fn report_dead(&self, name: &str) -> MasterResult<()> {
        let name = name.to_string();
        self.call(|reply| MasterCommand::ReportDead { name, reply })
            .await
    }

    /// Block until one result is available and take it
    pub async fn wait_one(&self) -> MasterResult<TaskResult> {
        self.call(|reply| MasterCommand::Wait(WaitRequest::One(reply)))
            .await
    }

    /// Block until every submitted task has a result and take them all
    pub async fn wait_all(&self) -> MasterResult<Vec<TaskResult>> {
        self.call(|reply| MasterCommand::Wait(WaitRequest::All(reply)))
            .await
    }

    /// Block until `k` results are available and take them
    pub async fn wait_k(&self, k: usize) -> MasterResult<Vec<TaskResult>> {
        self.call(|reply| MasterCommand::Wait(WaitRequest::K { k, reply }))
            .await
    }

    pub async fn set_ordering_mode(&self, mode: OrderingMode) -> MasterResult<()> {
        self.call(|reply| MasterCommand::SetOrdering { mode, reply })
            .await
    }

    pub async fn count_available_results(&self) -> MasterResult<usize> {
        self.call(|reply| MasterCommand::CountAvailable { reply })
            .await
    }

    pub async fn is_empty(&self) -> MasterResult<bool> {
        self.call(|reply| MasterCommand::IsEmpty { reply }).await
    }

    pub async fn pool_size(&self) -> MasterResult<usize> {
        self.call(|reply| MasterCommand::PoolSize { reply }).await
    }

    pub async fn add_resources(&self, descriptor: ResourceDescriptor) -> MasterResult<()> {
        self.call(|reply| MasterCommand::AddResources { descriptor, reply })
            .await
    }

    pub async fn terminate(&self, free_resources: bool) -> MasterResult<bool> {
        self.call(|reply| MasterCommand::Terminate {
            free_resources,
            reply,
        })
        .await
    }

    /// Check if the coordinator has stopped receiving calls
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

fn to_source_error(error: MasterError) -> SourceError {
    match error {
        MasterError::Terminated => SourceError::Terminated,
        other => SourceError::Unavailable(other.to_string()),
    }
}

#[async_trait]
impl TaskSource for MasterHandle {
    async fn request_task(&self, worker: WorkerHandle) -> Result<TaskAssignment, SourceError> {
        MasterHandle::request_task(self, worker)
            .await
            .map_err(to_source_error)
    }

    async fn submit_result_and_request_task(
        &self,
        result: TaskResult,
        worker: WorkerHandle,
    ) -> Result<TaskAssignment, SourceError> {
        MasterHandle::submit_result_and_request_task(self, result, worker)
            .await
            .map_err(to_source_error)
    }
}

#[async_trait]
impl DeathListener for MasterHandle {
    async fn report_dead(&self, worker_name: &str) {
        if let Err(e) = MasterHandle::report_dead(self, worker_name).await {
            debug!(worker = %worker_name, "Death report not delivered: {}", e);
        }
    }
}
