//! Deadline bookkeeping for dismissal and detach tasks.
//!
//! Tasks are plain deadlines on the registry clock. Firing happens when the
//! owner calls [`Scheduler::take_due`], so a cancelled task can never run.

use std::collections::HashMap;

use super::entity::ToastId;

/// Handle identifying one scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(u64);

/// Outstanding dismissal of an active toast
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DismissalTask {
    pub handle: TaskHandle,
    pub due_at_ms: u64,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    next_handle: u64,
    /// toast id -> pending dismissal (at most one per toast)
    dismissals: HashMap<ToastId, DismissalTask>,
    /// Pending detaches of retired toasts: (due, handle, toast)
    detaches: Vec<(u64, TaskHandle, ToastId)>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_handle(&mut self) -> TaskHandle {
        self.next_handle += 1;
        TaskHandle(self.next_handle)
    }

    /// Schedule the dismissal of `id`, replacing any pending one.
    pub fn schedule_dismissal(&mut self, id: ToastId, due_at_ms: u64) -> TaskHandle {
        let handle = self.next_handle();
        self.dismissals.insert(id, DismissalTask { handle, due_at_ms });
        handle
    }

    /// Cancel the dismissal of `id`. Cancelling nothing is a no-op.
    pub fn cancel_dismissal(&mut self, id: &ToastId) -> Option<DismissalTask> {
        self.dismissals.remove(id)
    }

    pub fn dismissal(&self, id: &ToastId) -> Option<DismissalTask> {
        self.dismissals.get(id).copied()
    }

    pub fn dismissal_count(&self) -> usize {
        self.dismissals.len()
    }

    pub fn schedule_detach(&mut self, id: ToastId, due_at_ms: u64) -> TaskHandle {
        let handle = self.next_handle();
        self.detaches.push((due_at_ms, handle, id));
        handle
    }

    pub fn pending_detaches(&self) -> usize {
        self.detaches.len()
    }

    /// Earliest deadline among all pending tasks.
    pub fn next_deadline(&self) -> Option<u64> {
        let dismissal = self.dismissals.values().map(|t| t.due_at_ms).min();
        let detach = self.detaches.iter().map(|(due, _, _)| *due).min();
        match (dismissal, detach) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Remove and return dismissals due at `now_ms`, earliest first.
    pub fn take_due_dismissals(&mut self, now_ms: u64) -> Vec<ToastId> {
        let mut due: Vec<(u64, TaskHandle, ToastId)> = self
            .dismissals
            .iter()
            .filter(|(_, task)| task.due_at_ms <= now_ms)
            .map(|(id, task)| (task.due_at_ms, task.handle, *id))
            .collect();
        due.sort();

        for (_, _, id) in &due {
            self.dismissals.remove(id);
        }

        due.into_iter().map(|(_, _, id)| id).collect()
    }

    /// Remove and return detaches due at `now_ms`, earliest first.
    pub fn take_due_detaches(&mut self, now_ms: u64) -> Vec<ToastId> {
        let (mut due, pending): (Vec<_>, Vec<_>) = self
            .detaches
            .drain(..)
            .partition(|(due_at, _, _)| *due_at <= now_ms);
        self.detaches = pending;
        due.sort();
        due.into_iter().map(|(_, _, id)| id).collect()
    }
}
