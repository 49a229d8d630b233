//! Master and local workers wired together in one process

use std::sync::Arc;

use taskfarm_config::FarmConfig;
use taskfarm_core::ResourceDescriptor;
use taskfarm_interfaces::{TaskRepository, TaskRunner};
use taskfarm_master::{master_channel, Coordinator, Master};
use tokio::task::JoinHandle;
use tracing::info;

use crate::error::ExecutionResult;
use crate::provisioner::LocalProvisioner;
use crate::watcher::HeartbeatWatcher;

/// A running coordinator with its heartbeat watcher and local workers
pub struct LocalFarm {
    master: Master,
    provisioner: Arc<LocalProvisioner>,
    watcher: Arc<HeartbeatWatcher>,
    coordinator: JoinHandle<()>,
}

impl LocalFarm {
    /// Validate `config`, start the coordinator and provision
    /// `config.worker.count` workers running `runner`
    pub async fn start(
        config: &FarmConfig,
        runner: Arc<dyn TaskRunner>,
        repository: Arc<dyn TaskRepository>,
    ) -> ExecutionResult<Self> {
        config.validate_all()?;

        let (handle, inbox) = master_channel();
        let watcher = HeartbeatWatcher::spawn(Arc::new(handle.clone()), &config.watcher);
        let provisioner = Arc::new(LocalProvisioner::new(
            Arc::new(handle.clone()),
            runner,
            config.worker.clone(),
        ));

        let coordinator = Coordinator::new(
            inbox,
            repository.clone(),
            provisioner.clone(),
            watcher.clone(),
            config.master.ordering,
        )
        .spawn();

        let master = Master::new(handle, repository);
        if config.worker.count > 0 {
            master
                .add_resources(ResourceDescriptor::Local {
                    count: config.worker.count,
                })
                .await?;
        }

        info!(
            workers = config.worker.count,
            ordering = %config.master.ordering,
            "Local farm started"
        );
        Ok(Self {
            master,
            provisioner,
            watcher,
            coordinator,
        })
    }

    pub fn master(&self) -> &Master {
        &self.master
    }

    pub fn provisioner(&self) -> &Arc<LocalProvisioner> {
        &self.provisioner
    }

    pub fn watcher(&self) -> &Arc<HeartbeatWatcher> {
        &self.watcher
    }

    /// Terminate the master and wait for the coordinator to stop
    pub async fn shutdown(self, free_resources: bool) -> ExecutionResult<bool> {
        let terminated = self.master.terminate(free_resources).await?;
        self.coordinator.await?;
        info!("Local farm stopped");
        Ok(terminated)
    }
}
