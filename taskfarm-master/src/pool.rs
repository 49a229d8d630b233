//! Worker pool state

use std::collections::{BTreeSet, HashMap};

use taskfarm_core::TaskId;
use taskfarm_interfaces::WorkerHandle;
use uuid::Uuid;

/// A worker taken out of the pool, with the task it was working on
#[derive(Debug)]
pub struct RemovedWorker {
    pub handle: WorkerHandle,
    pub assignment: Option<TaskId>,
}

/// Membership, sleeping subset and current assignment of every known worker.
///
/// The name and handle lookups are only ever changed together, through
/// [`register`](Self::register), [`remove`](Self::remove) and
/// [`drain`](Self::drain).
#[derive(Debug, Default)]
pub struct WorkerPool {
    by_name: HashMap<String, WorkerHandle>,
    by_handle: HashMap<Uuid, String>,
    sleeping: BTreeSet<String>,
    assignments: HashMap<String, TaskId>,
}

impl WorkerPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a worker; returns false if its name is already registered
    pub fn register(&mut self, handle: WorkerHandle) -> bool {
        if self.by_name.contains_key(handle.name()) {
            return false;
        }
        if let Some(previous) = self.by_handle.get(&handle.id()) {
            tracing::warn!(
                worker = %handle.name(),
                previous = %previous,
                "Worker handle already registered under another name"
            );
            return false;
        }
        let name = handle.name().to_string();
        self.by_handle.insert(handle.id(), name.clone());
        self.by_name.insert(name, handle);
        true
    }

    pub fn handle(&self, name: &str) -> Option<&WorkerHandle> {
        self.by_name.get(name)
    }

    pub fn mark_sleeping(&mut self, name: &str) {
        if self.by_name.contains_key(name) {
            self.sleeping.insert(name.to_string());
        }
    }

    pub fn clear_sleeping(&mut self, name: &str) {
        self.sleeping.remove(name);
    }

    pub fn sleeping_count(&self) -> usize {
        self.sleeping.len()
    }

    pub fn assign(&mut self, name: &str, id: TaskId) {
        self.assignments.insert(name.to_string(), id);
    }

    pub fn clear_assignment(&mut self, name: &str) {
        self.assignments.remove(name);
    }

    pub fn assignment(&self, name: &str) -> Option<TaskId> {
        self.assignments.get(name).copied()
    }

    /// Deregister a worker from every view
    pub fn remove(&mut self, name: &str) -> Option<RemovedWorker> {
        let handle = self.by_name.remove(name)?;
        self.by_handle.remove(&handle.id());
        self.sleeping.remove(name);
        let assignment = self.assignments.remove(name);
        Some(RemovedWorker { handle, assignment })
    }

    /// Signal every sleeping worker to poll again; returns how many were
    /// signalled.
    ///
    /// The sleeping subset is left as is: each woken worker leaves it on its
    /// next request.
    pub fn wake_all_sleeping(&self) -> usize {
        let mut woken = 0;
        for name in &self.sleeping {
            if let Some(handle) = self.by_name.get(name) {
                handle.wake();
                woken += 1;
            }
        }
        woken
    }

    pub fn size(&self) -> usize {
        self.by_name.len()
    }

    /// Empty the pool, returning every handle it held
    pub fn drain(&mut self) -> Vec<WorkerHandle> {
        self.by_handle.clear();
        self.sleeping.clear();
        self.assignments.clear();
        self.by_name.drain().map(|(_, handle)| handle).collect()
    }
}
