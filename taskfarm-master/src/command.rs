//! Messages understood by the coordinator

use taskfarm_core::{OrderingMode, ResourceDescriptor, TaskAssignment, TaskId, TaskResult};
use taskfarm_interfaces::WorkerHandle;
use tokio::sync::oneshot;

use crate::error::{MasterError, MasterResult};

/// Deferred answer to one call
pub type Reply<T> = oneshot::Sender<MasterResult<T>>;

/// A call queued in the coordinator's inbox
#[derive(Debug)]
pub enum MasterCommand {
    Submit {
        ids: Vec<TaskId>,
        reply: Reply<()>,
    },
    RequestTask {
        worker: WorkerHandle,
        reply: Reply<TaskAssignment>,
    },
    SubmitResult {
        result: TaskResult,
        worker: WorkerHandle,
        reply: Reply<TaskAssignment>,
    },
    ReportDead {
        name: String,
        reply: Reply<()>,
    },
    Wait(WaitRequest),
    SetOrdering {
        mode: OrderingMode,
        reply: Reply<()>,
    },
    CountAvailable {
        reply: Reply<usize>,
    },
    IsEmpty {
        reply: Reply<bool>,
    },
    PoolSize {
        reply: Reply<usize>,
    },
    AddResources {
        descriptor: ResourceDescriptor,
        reply: Reply<()>,
    },
    Terminate {
        free_resources: bool,
        reply: Reply<bool>,
    },
}

/// Serving class of a command within one drained batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    /// Calls made by workers and watchers; the only ones that can make a
    /// parked wait satisfiable
    Worker,
    Client,
    Wait,
}

impl MasterCommand {
    pub fn priority(&self) -> Priority {
        match self {
            Self::RequestTask { .. } | Self::SubmitResult { .. } | Self::ReportDead { .. } => {
                Priority::Worker
            }
            Self::Wait(_) => Priority::Wait,
            _ => Priority::Client,
        }
    }

    /// Answer the command with `error` without executing it
    pub fn fail(self, error: MasterError) {
        // A dropped receiver means the caller stopped listening
        match self {
            Self::Submit { reply, .. }
            | Self::ReportDead { reply, .. }
            | Self::SetOrdering { reply, .. }
            | Self::AddResources { reply, .. } => {
                let _ = reply.send(Err(error));
            }
            Self::RequestTask { reply, .. } | Self::SubmitResult { reply, .. } => {
                let _ = reply.send(Err(error));
            }
            Self::Wait(request) => request.fail(error),
            Self::CountAvailable { reply } | Self::PoolSize { reply } => {
                let _ = reply.send(Err(error));
            }
            Self::IsEmpty { reply } | Self::Terminate { reply, .. } => {
                let _ = reply.send(Err(error));
            }
        }
    }
}

/// A blocking client call, possibly parked until it can be satisfied
#[derive(Debug)]
pub enum WaitRequest {
    One(Reply<TaskResult>),
    All(Reply<Vec<TaskResult>>),
    K { k: usize, reply: Reply<Vec<TaskResult>> },
}

impl WaitRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::One(_) => "one",
            Self::All(_) => "all",
            Self::K { .. } => "k",
        }
    }

    /// True once the caller has given up on the answer
    pub fn is_abandoned(&self) -> bool {
        match self {
            Self::One(reply) => reply.is_closed(),
            Self::All(reply) | Self::K { reply, .. } => reply.is_closed(),
        }
    }

    pub fn fail(self, error: MasterError) {
        match self {
            Self::One(reply) => {
                let _ = reply.send(Err(error));
            }
            Self::All(reply) | Self::K { reply, .. } => {
                let _ = reply.send(Err(error));
            }
        }
    }
}
