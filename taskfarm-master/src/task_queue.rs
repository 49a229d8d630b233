//! Pending / launched / completed task memberships

use std::collections::{HashMap, VecDeque};

use taskfarm_core::{TaskId, TaskState};

/// Scheduling state of every submitted task id.
///
/// Each known id has exactly one [`TaskState`]; the pending queue is served
/// oldest first. Completed ids are kept until their result has been handed
/// to the client, so memory is bounded by the tasks in flight plus the
/// results not yet collected.
#[derive(Debug, Default)]
pub struct TaskQueue {
    pending: VecDeque<TaskId>,
    states: HashMap<TaskId, TaskState>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a newly submitted id to the back of the pending queue.
    ///
    /// Returns false, leaving everything untouched, if the id is already
    /// known.
    pub fn enqueue(&mut self, id: TaskId) -> bool {
        if self.states.contains_key(&id) {
            return false;
        }
        self.states.insert(id, TaskState::Pending);
        self.pending.push_back(id);
        true
    }

    /// Move the oldest pending id to launched
    pub fn launch_next(&mut self) -> Option<TaskId> {
        let id = self.pending.pop_front()?;
        self.states.insert(id, TaskState::Launched);
        Some(id)
    }

    /// launched -> completed; false if the id was not launched
    pub fn complete(&mut self, id: TaskId) -> bool {
        self.transition(id, TaskState::Launched, TaskState::Completed)
    }

    /// launched -> back of pending; false if the id was not launched
    pub fn requeue(&mut self, id: TaskId) -> bool {
        if !self.transition(id, TaskState::Launched, TaskState::Pending) {
            return false;
        }
        self.pending.push_back(id);
        true
    }

    /// launched -> front of pending, for a dispatch that could not go
    /// through
    pub fn restore_front(&mut self, id: TaskId) -> bool {
        if !self.transition(id, TaskState::Launched, TaskState::Pending) {
            return false;
        }
        self.pending.push_front(id);
        true
    }

    fn transition(&mut self, id: TaskId, from: TaskState, to: TaskState) -> bool {
        match self.states.get_mut(&id) {
            Some(state) if *state == from => {
                *state = to;
                true
            }
            _ => false,
        }
    }

    pub fn state(&self, id: TaskId) -> Option<TaskState> {
        self.states.get(&id).copied()
    }

    pub fn is_launched(&self, id: TaskId) -> bool {
        self.state(id) == Some(TaskState::Launched)
    }

    /// Drop a completed id whose result has been delivered.
    ///
    /// A late result for it is then unknown, and discarded like any other
    /// result for a task that is not launched.
    pub fn forget_completed(&mut self, id: TaskId) {
        if self.state(id) == Some(TaskState::Completed) {
            self.states.remove(&id);
        }
    }

    pub fn pending_is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.states.clear();
    }
}
