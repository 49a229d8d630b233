//! Outstanding vs. available results, in delivery order

use std::collections::{HashMap, HashSet, VecDeque};

use taskfarm_core::{OrderingMode, TaskId, TaskResult};

/// Tracks which submitted tasks still owe a result and which results are
/// ready to be handed to the client.
///
/// `take_*` must only be called once the matching availability predicate
/// holds; the coordinator always checks first.
#[derive(Debug, Default)]
pub struct ResultQueue {
    mode: OrderingMode,
    /// Submitted, no result yet
    outstanding: HashSet<TaskId>,
    /// Ids in submission order. Ids completed in completion order are left
    /// in place and skipped when the deque is walked.
    submission_order: VecDeque<TaskId>,
    /// Completed but waiting for earlier submissions (submission order only)
    held: HashMap<TaskId, TaskResult>,
    /// Ready for delivery
    available: VecDeque<TaskResult>,
}

impl ResultQueue {
    pub fn new(mode: OrderingMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn mode(&self) -> OrderingMode {
        self.mode
    }

    /// Register a task that owes a result
    pub fn add_pending(&mut self, id: TaskId) {
        if self.outstanding.insert(id) {
            self.submission_order.push_back(id);
        }
    }

    /// Record an accepted result, appended according to the active mode
    pub fn add_completed(&mut self, result: TaskResult) {
        let id = result.task_id;
        if !self.outstanding.remove(&id) {
            tracing::warn!(task_id = %id, "Result for a task that was not outstanding");
        }

        match self.mode {
            OrderingMode::CompletionOrder => {
                self.available.push_back(result);
                self.compact_submission_order();
            }
            OrderingMode::SubmissionOrder => {
                self.held.insert(id, result);
                self.release_in_submission_order();
            }
        }
    }

    /// Change the ordering policy for results added from now on.
    ///
    /// Results already available keep their order. Leaving submission order
    /// releases every held result right away, in submission order.
    pub fn set_mode(&mut self, mode: OrderingMode) {
        if self.mode == mode {
            return;
        }
        self.mode = mode;

        if mode == OrderingMode::CompletionOrder && !self.held.is_empty() {
            let held = &mut self.held;
            let available = &mut self.available;
            let outstanding = &self.outstanding;
            self.submission_order.retain(|id| match held.remove(id) {
                Some(result) => {
                    available.push_back(result);
                    false
                }
                None => outstanding.contains(id),
            });
        }
    }

    fn release_in_submission_order(&mut self) {
        while let Some(front) = self.submission_order.front() {
            if let Some(result) = self.held.remove(front) {
                self.available.push_back(result);
            } else if self.outstanding.contains(front) {
                break;
            }
            self.submission_order.pop_front();
        }
    }

    /// Drop skipped ids once they outnumber the live ones, keeping the
    /// amortised cost per result constant
    fn compact_submission_order(&mut self) {
        let live = self.outstanding.len() + self.held.len();
        if self.submission_order.len() <= 2 * live + 64 {
            return;
        }
        let outstanding = &self.outstanding;
        let held = &self.held;
        self.submission_order
            .retain(|id| outstanding.contains(id) || held.contains_key(id));
    }

    pub fn is_one_available(&self) -> bool {
        !self.available.is_empty()
    }

    /// True when no result is owed any more and at least one is available
    pub fn are_all_available(&self) -> bool {
        self.count_pending() == 0 && !self.available.is_empty()
    }

    /// Results not yet available, including those held back by ordering
    pub fn count_pending(&self) -> usize {
        self.outstanding.len() + self.held.len()
    }

    pub fn count_available(&self) -> usize {
        self.available.len()
    }

    /// Nothing owed and nothing left to deliver
    pub fn is_empty(&self) -> bool {
        self.count_pending() == 0 && self.available.is_empty()
    }

    pub fn take_one(&mut self) -> Option<TaskResult> {
        self.available.pop_front()
    }

    pub fn take_k(&mut self, k: usize) -> Vec<TaskResult> {
        let k = k.min(self.available.len());
        self.available.drain(..k).collect()
    }

    pub fn take_all(&mut self) -> Vec<TaskResult> {
        self.available.drain(..).collect()
    }

    /// Put back results whose delivery failed, ahead of everything else
    pub fn restore_front(&mut self, results: Vec<TaskResult>) {
        for result in results.into_iter().rev() {
            self.available.push_front(result);
        }
    }

    pub fn clear(&mut self) {
        self.outstanding.clear();
        self.submission_order.clear();
        self.held.clear();
        self.available.clear();
    }
}
