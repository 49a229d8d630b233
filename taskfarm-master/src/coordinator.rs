//! The master coordinator actor
//!
//! One task owns every piece of scheduling state and processes the calls
//! queued in its inbox in batches. Within a batch, worker calls are served
//! first, then the remaining client calls, then wait calls. A wait that
//! cannot be answered right away is parked and re-evaluated at the end of
//! every batch.

use std::ops::ControlFlow;
use std::sync::Arc;

use taskfarm_core::{OrderingMode, TaskAssignment, TaskId, TaskResult};
use taskfarm_interfaces::{LivenessWatcher, TaskRepository, WorkerHandle, WorkerProvisioner};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::command::{MasterCommand, Priority, Reply, WaitRequest};
use crate::error::MasterError;
use crate::handle::MasterInbox;
use crate::pool::WorkerPool;
use crate::result_queue::ResultQueue;
use crate::task_queue::TaskQueue;

/// Single authority over tasks, workers and results
pub struct Coordinator {
    inbox: MasterInbox,
    repository: Arc<dyn TaskRepository>,
    provisioner: Arc<dyn WorkerProvisioner>,
    watcher: Arc<dyn LivenessWatcher>,
    tasks: TaskQueue,
    results: ResultQueue,
    pool: WorkerPool,
    parked: Option<WaitRequest>,
}

impl Coordinator {
    pub fn new(
        inbox: MasterInbox,
        repository: Arc<dyn TaskRepository>,
        provisioner: Arc<dyn WorkerProvisioner>,
        watcher: Arc<dyn LivenessWatcher>,
        ordering: OrderingMode,
    ) -> Self {
        Self {
            inbox,
            repository,
            provisioner,
            watcher,
            tasks: TaskQueue::new(),
            results: ResultQueue::new(ordering),
            pool: WorkerPool::new(),
            parked: None,
        }
    }

    /// Run the coordinator on its own task
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Process calls until terminated or until every handle is dropped
    pub async fn run(mut self) {
        info!(ordering = %self.results.mode(), "Master coordinator started");

        while let Some(first) = self.inbox.recv().await {
            let mut batch = vec![first];
            while let Ok(command) = self.inbox.try_recv() {
                batch.push(command);
            }

            if self.process_batch(batch).await.is_break() {
                // Calls still queued are dropped with the inbox
                self.inbox.close();
                info!("Master coordinator terminated");
                return;
            }
        }

        info!("All master handles dropped, coordinator stopping");
    }

    async fn process_batch(&mut self, batch: Vec<MasterCommand>) -> ControlFlow<()> {
        debug!(size = batch.len(), "Processing batch");

        let mut worker_calls = Vec::new();
        let mut client_calls = Vec::new();
        let mut waits = Vec::new();
        for command in batch {
            match command.priority() {
                Priority::Worker => worker_calls.push(command),
                Priority::Client => client_calls.push(command),
                Priority::Wait => waits.push(command),
            }
        }

        for command in worker_calls {
            self.handle_command(command).await;
        }

        let mut client_calls = client_calls.into_iter();
        while let Some(command) = client_calls.next() {
            if let MasterCommand::Terminate {
                free_resources,
                reply,
            } = command
            {
                self.terminate(free_resources).await;
                let _ = reply.send(Ok(true));
                for rest in client_calls.chain(waits) {
                    rest.fail(MasterError::Terminated);
                }
                return ControlFlow::Break(());
            }
            self.handle_command(command).await;
        }

        for command in waits {
            if let MasterCommand::Wait(request) = command {
                self.park(request);
            }
        }

        self.maybe_serve_parked();
        ControlFlow::Continue(())
    }

    async fn handle_command(&mut self, command: MasterCommand) {
        match command {
            MasterCommand::Submit { ids, reply } => {
                self.submit(ids);
                let _ = reply.send(Ok(()));
            }
            MasterCommand::RequestTask { worker, reply } => {
                let assignment = self.dispatch(&worker).await;
                let _ = reply.send(Ok(assignment));
            }
            MasterCommand::SubmitResult {
                result,
                worker,
                reply,
            } => {
                self.accept_result(result, &worker).await;
                let assignment = self.dispatch(&worker).await;
                let _ = reply.send(Ok(assignment));
            }
            MasterCommand::ReportDead { name, reply } => {
                self.report_dead(&name).await;
                let _ = reply.send(Ok(()));
            }
            MasterCommand::SetOrdering { mode, reply } => {
                info!(ordering = %mode, "Result reception order changed");
                self.results.set_mode(mode);
                let _ = reply.send(Ok(()));
            }
            MasterCommand::CountAvailable { reply } => {
                let _ = reply.send(Ok(self.results.count_available()));
            }
            MasterCommand::IsEmpty { reply } => {
                let _ = reply.send(Ok(self.results.is_empty()));
            }
            MasterCommand::PoolSize { reply } => {
                let _ = reply.send(Ok(self.pool.size()));
            }
            MasterCommand::AddResources { descriptor, reply } => {
                info!(kind = descriptor.kind(), "Adding resources");
                let outcome = self
                    .provisioner
                    .add_resources(descriptor)
                    .await
                    .map_err(|e| {
                        warn!("Failed to add resources: {}", e);
                        MasterError::from(e)
                    });
                let _ = reply.send(outcome);
            }
            MasterCommand::Wait(request) => self.park(request),
            MasterCommand::Terminate { reply, .. } => {
                // Only reachable if a caller bypasses batch ordering
                let _ = reply.send(Err(MasterError::Terminated));
            }
        }
    }

    fn submit(&mut self, ids: Vec<TaskId>) {
        let was_empty = self.tasks.pending_is_empty();
        let mut added = 0;
        for id in ids {
            if self.tasks.enqueue(id) {
                self.results.add_pending(id);
                added += 1;
            } else {
                warn!(task_id = %id, "Ignoring duplicate task submission");
            }
        }
        debug!(added, pending = self.tasks.pending_len(), "Tasks submitted");

        if was_empty && added > 0 {
            self.wake_sleeping();
        }
    }

    async fn register(&mut self, worker: &WorkerHandle) {
        let name = worker.name();
        match self.pool.handle(name).map(WorkerHandle::id) {
            Some(known) if known == worker.id() => return,
            Some(_) => {
                // Same name, new handle: the previous instance is gone
                warn!(worker = %name, "Worker restarted under a known name, replacing its handle");
                self.retire(name).await;
            }
            None => {}
        }

        if self.pool.register(worker.clone()) {
            info!(worker = %name, "Worker registered");
            if let Err(e) = self.watcher.watch(worker.clone()).await {
                warn!(worker = %name, "Failed to watch worker: {}", e);
            }
        }
    }

    /// Hand the oldest pending task to `worker`, or put it to sleep
    async fn dispatch(&mut self, worker: &WorkerHandle) -> TaskAssignment {
        self.register(worker).await;
        let name = worker.name();

        let Some(id) = self.tasks.launch_next() else {
            self.pool.clear_assignment(name);
            self.pool.mark_sleeping(name);
            debug!(
                worker = %name,
                sleeping = self.pool.sleeping_count(),
                "No pending task, worker sleeping"
            );
            return TaskAssignment::NoTask;
        };

        self.pool.clear_sleeping(name);
        self.pool.assign(name, id);

        match self.repository.fetch(id).await {
            Ok(task) => {
                if let Err(e) = self.repository.stage(id).await {
                    warn!(task_id = %id, "Failed to stage task: {}", e);
                }
                debug!(task_id = %id, worker = %name, "Task dispatched");
                TaskAssignment::Task(task)
            }
            Err(e) => {
                error!(task_id = %id, worker = %name, "Failed to fetch task payload: {}", e);
                self.tasks.restore_front(id);
                self.pool.clear_assignment(name);
                self.pool.mark_sleeping(name);
                TaskAssignment::NoTask
            }
        }
    }

    async fn accept_result(&mut self, result: TaskResult, worker: &WorkerHandle) {
        let id = result.task_id;
        if !self.tasks.is_launched(id) {
            debug!(task_id = %id, worker = %worker.name(), "Discarding stale result");
            return;
        }
        self.tasks.complete(id);

        if self.pool.assignment(worker.name()) == Some(id) {
            self.pool.clear_assignment(worker.name());
        }
        debug!(
            task_id = %id,
            worker = %worker.name(),
            success = result.is_success(),
            "Result accepted"
        );
        self.results.add_completed(result);

        if let Err(e) = self.repository.evict(id).await {
            warn!(task_id = %id, "Failed to evict task: {}", e);
        }
    }

    async fn report_dead(&mut self, name: &str) {
        let Some(handle) = self.retire(name).await else {
            debug!(worker = %name, "Death report for unknown worker ignored");
            return;
        };
        info!(worker = %name, "Worker reported dead");

        if let Err(e) = self.provisioner.release(vec![handle]).await {
            warn!(worker = %name, "Failed to release dead worker: {}", e);
        }
    }

    /// Take a worker out of the pool, stop watching it and requeue its task
    async fn retire(&mut self, name: &str) -> Option<WorkerHandle> {
        let removed = self.pool.remove(name)?;

        if let Err(e) = self.watcher.unwatch(&removed.handle).await {
            warn!(worker = %name, "Failed to unwatch worker: {}", e);
        }

        if let Some(id) = removed.assignment {
            let was_empty = self.tasks.pending_is_empty();
            if self.tasks.requeue(id) {
                info!(task_id = %id, worker = %name, "Task requeued");
                if was_empty {
                    self.wake_sleeping();
                }
            }
        }
        Some(removed.handle)
    }

    fn wake_sleeping(&self) {
        let woken = self.pool.wake_all_sleeping();
        if woken > 0 {
            debug!(woken, "Woke sleeping workers");
        }
    }

    /// Answer a wait now if possible, otherwise park it.
    ///
    /// Only a wait that has to block occupies the slot; a later wait is
    /// rejected only while that one is still parked.
    fn park(&mut self, request: WaitRequest) {
        // The current occupant may have been abandoned or become servable
        // earlier in this batch
        self.maybe_serve_parked();
        if self.parked.is_some() {
            debug!(kind = request.kind(), "Rejecting concurrent wait");
            request.fail(MasterError::AlreadyWaiting);
            return;
        }
        self.parked = Some(request);
        self.maybe_serve_parked();
    }

    /// Answer the parked wait if the result queue can satisfy it now
    fn maybe_serve_parked(&mut self) {
        let Some(request) = self.parked.take() else {
            return;
        };
        if request.is_abandoned() {
            debug!(kind = request.kind(), "Dropping abandoned wait");
            return;
        }

        match request {
            WaitRequest::One(reply) => {
                if !self.results.is_one_available() {
                    self.parked = Some(WaitRequest::One(reply));
                    return;
                }
                if let Some(result) = self.results.take_one() {
                    let id = result.task_id;
                    match reply.send(Ok(result)) {
                        Ok(()) => self.tasks.forget_completed(id),
                        Err(Ok(result)) => self.results.restore_front(vec![result]),
                        Err(Err(_)) => {}
                    }
                }
            }
            WaitRequest::All(reply) => {
                if !self.results.are_all_available() {
                    self.parked = Some(WaitRequest::All(reply));
                    return;
                }
                let results = self.results.take_all();
                self.deliver(reply, results);
            }
            WaitRequest::K { k, reply } => {
                let total = self.results.count_pending() + self.results.count_available();
                if k == 0 || k > total {
                    let _ = reply.send(Err(MasterError::InvalidWaitCount { k, total }));
                    return;
                }
                if self.results.count_available() < k {
                    self.parked = Some(WaitRequest::K { k, reply });
                    return;
                }
                let results = self.results.take_k(k);
                self.deliver(reply, results);
            }
        }
    }

    fn deliver(&mut self, reply: Reply<Vec<TaskResult>>, results: Vec<TaskResult>) {
        let ids: Vec<TaskId> = results.iter().map(|r| r.task_id).collect();
        match reply.send(Ok(results)) {
            Ok(()) => {
                for id in ids {
                    self.tasks.forget_completed(id);
                }
            }
            Err(Ok(results)) => self.results.restore_front(results),
            Err(Err(_)) => {}
        }
    }

    async fn terminate(&mut self, free_resources: bool) {
        info!(free_resources, "Terminating master");

        self.tasks.clear();
        self.results.clear();
        let workers = self.pool.drain();

        for worker in &workers {
            if let Err(e) = self.watcher.unwatch(worker).await {
                warn!(worker = %worker.name(), "Failed to unwatch worker: {}", e);
            }
        }
        if !workers.is_empty() {
            if let Err(e) = self.provisioner.release(workers).await {
                warn!("Failed to release workers: {}", e);
            }
        }
        if let Err(e) = self.watcher.shutdown().await {
            warn!("Failed to shut down liveness watcher: {}", e);
        }
        if let Err(e) = self.provisioner.shutdown(free_resources).await {
            warn!("Failed to shut down provisioner: {}", e);
        }

        if let Some(parked) = self.parked.take() {
            parked.fail(MasterError::Terminated);
        }
    }
}
