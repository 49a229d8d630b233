//! Heartbeat-based liveness watcher

use async_trait::async_trait;
use futures::future::join_all;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use taskfarm_config::WatcherConfig;
use taskfarm_interfaces::{DeathListener, LivenessWatcher, WatcherError, WorkerHandle};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

type Watched = Arc<Mutex<HashMap<Uuid, WorkerHandle>>>;

/// Pings every watched worker at a fixed interval.
///
/// A worker whose ping fails, or does not answer within the timeout, is
/// dropped from the watch list and reported to the listener once.
pub struct HeartbeatWatcher {
    watched: Watched,
    cancel: CancellationToken,
}

impl HeartbeatWatcher {
    /// Start probing in the background; must be called inside a tokio
    /// runtime
    pub fn spawn(listener: Arc<dyn DeathListener>, config: &WatcherConfig) -> Arc<Self> {
        let watcher = Arc::new(Self {
            watched: Arc::new(Mutex::new(HashMap::new())),
            cancel: CancellationToken::new(),
        });

        tokio::spawn(probe_loop(
            watcher.watched.clone(),
            listener,
            config.ping_interval,
            config.ping_timeout,
            watcher.cancel.clone(),
        ));
        watcher
    }

    pub fn watched_count(&self) -> usize {
        self.watched.lock().len()
    }
}

impl Drop for HeartbeatWatcher {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn probe_loop(
    watched: Watched,
    listener: Arc<dyn DeathListener>,
    interval: Duration,
    timeout: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let targets: Vec<WorkerHandle> = watched.lock().values().cloned().collect();
        if targets.is_empty() {
            continue;
        }

        let probes = targets.into_iter().map(|worker| async move {
            let alive = matches!(
                tokio::time::timeout(timeout, worker.ping()).await,
                Ok(Ok(()))
            );
            (worker, alive)
        });

        for (worker, alive) in join_all(probes).await {
            if alive {
                continue;
            }
            // Unwatched while the probe was in flight
            let removed = watched.lock().remove(&worker.id()).is_some();
            if removed && !cancel.is_cancelled() {
                warn!(worker = %worker.name(), "Worker stopped answering pings");
                listener.report_dead(worker.name()).await;
            }
        }
    }

    debug!("Heartbeat loop stopped");
}

#[async_trait]
impl LivenessWatcher for HeartbeatWatcher {
    async fn watch(&self, worker: WorkerHandle) -> Result<(), WatcherError> {
        if self.cancel.is_cancelled() {
            return Err(WatcherError::ShutDown);
        }
        debug!(worker = %worker.name(), "Watching worker");
        self.watched.lock().insert(worker.id(), worker);
        Ok(())
    }

    async fn unwatch(&self, worker: &WorkerHandle) -> Result<(), WatcherError> {
        self.watched.lock().remove(&worker.id());
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), WatcherError> {
        // The loop may be waiting on the listener, which may be the caller:
        // signal it and return without joining
        self.cancel.cancel();
        self.watched.lock().clear();
        info!("Liveness watcher shut down");
        Ok(())
    }
}
