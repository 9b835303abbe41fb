//! Toast registry: owns active toasts, their dismissal tasks and the hover policy.
//!
//! The registry is a synchronous, single-owner state machine. Every operation
//! reads the injected [`Clock`] once and runs to completion. Time only moves
//! forward through [`Registry::tick`], which samples progress and fires due
//! tasks, so progress and dismissal share one notion of elapsed time.

use std::collections::VecDeque;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;

use crate::clock::Clock;
use crate::config::ToastSettings;
use crate::error::Result;
use crate::presentation::{require_anchors, Anchor, Gesture, Host};

use super::entity::{Toast, ToastId, ToastOptions};
use super::events::{ToastEvent, ToastView};
use super::kind::{HoverPolicy, ToastKind};
use super::scheduler::Scheduler;

/// Why a toast was retired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Retirement {
    /// Dismissal task fired
    Expired,
    /// Caller or close gesture
    Explicit,
}

#[derive(Debug, Default)]
struct RegistryStats {
    added: u64,
    expired: u64,
    removed: u64,
    paused: u64,
    resumed: u64,
}

/// Snapshot of registry statistics
#[derive(Debug, Clone, Serialize)]
pub struct RegistryStatsSnapshot {
    /// Toasts created
    pub total_added: u64,
    /// Toasts retired by their dismissal task
    pub total_expired: u64,
    /// Toasts retired by an explicit remove
    pub total_removed: u64,
    /// Pause transitions applied
    pub total_paused: u64,
    /// Resume transitions applied
    pub total_resumed: u64,
    pub active_count: usize,
    pub history_count: usize,
    pub scheduled_count: usize,
}

pub struct Registry {
    settings: ToastSettings,
    clock: Arc<dyn Clock>,
    host: Arc<dyn Host>,
    hover_policy: HoverPolicy,
    /// Display order = insertion order
    active: Vec<Toast>,
    /// Retired toasts, oldest first
    history: VecDeque<Toast>,
    scheduler: Scheduler,
    events: broadcast::Sender<ToastEvent>,
    stats: RegistryStats,
}

impl Registry {
    /// Create a registry rendering into `host`.
    ///
    /// Fails when the host has no toast container.
    pub fn new(
        settings: ToastSettings,
        clock: Arc<dyn Clock>,
        host: Arc<dyn Host>,
        event_capacity: usize,
    ) -> Result<Self> {
        require_anchors(host.as_ref(), &[Anchor::Container])?;

        let (events, _) = broadcast::channel(event_capacity.max(1));

        tracing::debug!(
            hover_policy = ?settings.hover_policy,
            default_duration_ms = settings.default_duration_ms,
            close_animation_ms = settings.close_animation_ms,
            "Toast registry created"
        );

        Ok(Self {
            hover_policy: settings.hover_policy,
            settings,
            clock,
            host,
            active: Vec::new(),
            history: VecDeque::new(),
            scheduler: Scheduler::new(),
            events,
            stats: RegistryStats::default(),
        })
    }

    /// Subscribe to change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<ToastEvent> {
        self.events.subscribe()
    }

    /// Sender side of the change notifications, for handles living outside
    /// the registry owner.
    pub fn event_sender(&self) -> broadcast::Sender<ToastEvent> {
        self.events.clone()
    }

    fn emit(&self, event: ToastEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Create a toast and schedule its dismissal.
    ///
    /// `duration_ms` falls back to the configured default; negative values
    /// are clamped to zero, which disables auto-dismissal.
    pub fn add(
        &mut self,
        kind: ToastKind,
        message: &str,
        title: Option<&str>,
        duration_ms: Option<i64>,
    ) -> Result<ToastId> {
        let mut options = ToastOptions::new(kind, message)
            .duration_ms(duration_ms.unwrap_or(self.settings.default_duration_ms as i64));
        options.title = title.map(str::to_string);
        self.add_with(options)
    }

    /// Create a toast from full options.
    ///
    /// A toast created paused gets no dismissal task until it is resumed.
    pub fn add_with(&mut self, options: ToastOptions) -> Result<ToastId> {
        let now = self.clock.now_ms();
        let toast = Toast::new(options, now, self.host.as_ref())?;
        let id = toast.id();

        if toast.duration_ms() > 0 && !toast.is_paused() {
            self.scheduler.schedule_dismissal(id, now + toast.duration_ms());
        }

        tracing::debug!(
            toast_id = %id,
            kind = %toast.kind(),
            duration_ms = toast.duration_ms(),
            "Toast added"
        );

        self.emit(ToastEvent::Added(toast.view()));
        self.active.push(toast);
        self.stats.added += 1;

        Ok(id)
    }

    pub fn info(&mut self, message: &str, title: Option<&str>, duration_ms: Option<i64>) -> Result<ToastId> {
        self.add(ToastKind::Info, message, title, duration_ms)
    }

    pub fn success(&mut self, message: &str, title: Option<&str>, duration_ms: Option<i64>) -> Result<ToastId> {
        self.add(ToastKind::Success, message, title, duration_ms)
    }

    pub fn warning(&mut self, message: &str, title: Option<&str>, duration_ms: Option<i64>) -> Result<ToastId> {
        self.add(ToastKind::Warning, message, title, duration_ms)
    }

    pub fn error(&mut self, message: &str, title: Option<&str>, duration_ms: Option<i64>) -> Result<ToastId> {
        self.add(ToastKind::Error, message, title, duration_ms)
    }

    /// Retire a toast. Unknown or already retired ids are ignored.
    ///
    /// Returns `true` if a toast was retired.
    pub fn remove(&mut self, id: ToastId) -> bool {
        self.retire(id, Retirement::Explicit)
    }

    fn retire(&mut self, id: ToastId, reason: Retirement) -> bool {
        self.scheduler.cancel_dismissal(&id);

        let Some(pos) = self.active.iter().position(|t| t.id() == id) else {
            tracing::trace!(toast_id = %id, "Remove ignored for unknown toast");
            return false;
        };

        let now = self.clock.now_ms();
        let mut toast = self.active.remove(pos);
        toast.sample(now);
        if let Some(detach_at) = toast.remove(now, self.settings.close_animation_ms) {
            self.scheduler.schedule_detach(id, detach_at);
        }

        match reason {
            Retirement::Expired => self.stats.expired += 1,
            Retirement::Explicit => self.stats.removed += 1,
        }

        tracing::debug!(
            toast_id = %id,
            reason = ?reason,
            progress = toast.progress(),
            "Toast retired"
        );

        self.history.push_back(toast);
        if let Some(limit) = self.settings.history_limit {
            while self.history.len() > limit {
                self.history.pop_front();
            }
        }

        self.emit(ToastEvent::Exiting { id });
        true
    }

    /// Retire every active toast. Returns how many were retired.
    pub fn clear(&mut self) -> usize {
        let ids: Vec<ToastId> = self.active.iter().map(Toast::id).collect();
        ids.into_iter()
            .filter(|id| self.retire(*id, Retirement::Explicit))
            .count()
    }

    /// Hover entered `id`; pauses according to the hover policy.
    pub fn pause(&mut self, id: ToastId) {
        match self.hover_policy {
            HoverPolicy::Disabled => {}
            HoverPolicy::PauseHovered => {
                self.pause_toast(id);
            }
            HoverPolicy::PauseAll => {
                for id in self.active_ids() {
                    self.pause_toast(id);
                }
            }
        }
    }

    /// Hover left `id`; resumes according to the hover policy.
    pub fn resume(&mut self, id: ToastId) {
        match self.hover_policy {
            HoverPolicy::Disabled => {}
            HoverPolicy::PauseHovered => {
                self.resume_toast(id);
            }
            HoverPolicy::PauseAll => {
                for id in self.active_ids() {
                    self.resume_toast(id);
                }
            }
        }
    }

    /// Apply a gesture forwarded by the presentation layer.
    pub fn handle_gesture(&mut self, gesture: Gesture) {
        match gesture {
            Gesture::Close(id) => {
                self.remove(id);
            }
            Gesture::PointerEnter(id) => self.pause(id),
            Gesture::PointerLeave(id) => self.resume(id),
        }
    }

    fn active_ids(&self) -> Vec<ToastId> {
        self.active.iter().map(Toast::id).collect()
    }

    fn pause_toast(&mut self, id: ToastId) -> bool {
        let now = self.clock.now_ms();
        let Some(toast) = self.active.iter_mut().find(|t| t.id() == id) else {
            return false;
        };
        if toast.is_paused() || toast.duration_ms() == 0 {
            return false;
        }

        // account for the time run up to this instant
        toast.sample(now);
        toast.set_paused(true);
        let progress = toast.progress();
        self.scheduler.cancel_dismissal(&id);
        self.stats.paused += 1;

        tracing::trace!(toast_id = %id, progress, "Toast paused");
        self.emit(ToastEvent::Paused { id });
        true
    }

    fn resume_toast(&mut self, id: ToastId) -> bool {
        let now = self.clock.now_ms();
        let Some(toast) = self.active.iter_mut().find(|t| t.id() == id) else {
            return false;
        };
        if !toast.is_paused() || toast.duration_ms() == 0 {
            return false;
        }

        // discard the paused interval before restarting the countdown
        toast.sample(now);
        toast.set_paused(false);
        let remaining_ms = toast.remaining_ms();
        self.stats.resumed += 1;

        tracing::trace!(toast_id = %id, remaining_ms, "Toast resumed");
        self.emit(ToastEvent::Resumed { id, remaining_ms });

        if remaining_ms == 0 {
            self.retire(id, Retirement::Expired);
        } else {
            self.scheduler.schedule_dismissal(id, now + remaining_ms);
        }
        true
    }

    /// One rendering frame: sample progress, then fire due tasks.
    pub fn tick(&mut self) {
        let now = self.clock.now_ms();

        for toast in self.active.iter_mut() {
            if toast.sample(now) {
                let _ = self.events.send(ToastEvent::Progress {
                    id: toast.id(),
                    progress: toast.progress(),
                });
            }
        }

        for id in self.scheduler.take_due_dismissals(now) {
            self.retire(id, Retirement::Expired);
        }

        for id in self.scheduler.take_due_detaches(now) {
            if let Some(toast) = self.history.iter_mut().find(|t| t.id() == id) {
                toast.mark_detached();
            }
            tracing::trace!(toast_id = %id, "Toast detached");
            self.emit(ToastEvent::Detached { id });
        }
    }

    /// Earliest clock reading at which a task becomes due.
    pub fn next_deadline(&self) -> Option<u64> {
        self.scheduler.next_deadline()
    }

    pub fn hover_policy(&self) -> HoverPolicy {
        self.hover_policy
    }

    /// Change the hover policy.
    ///
    /// Switching to `Disabled` resumes every paused toast, since no later
    /// hover gesture could resume them.
    pub fn set_hover_policy(&mut self, policy: HoverPolicy) {
        if self.hover_policy == policy {
            return;
        }
        tracing::debug!(from = ?self.hover_policy, to = ?policy, "Hover policy changed");
        self.hover_policy = policy;

        if policy == HoverPolicy::Disabled {
            for id in self.active_ids() {
                self.resume_toast(id);
            }
        }
    }

    /// Active toast by id.
    pub fn get(&self, id: &ToastId) -> Option<&Toast> {
        self.active.iter().find(|t| t.id() == *id)
    }

    pub fn active(&self) -> &[Toast] {
        &self.active
    }

    pub fn history(&self) -> impl Iterator<Item = &Toast> {
        self.history.iter()
    }

    /// Retired toast by id, if still kept.
    pub fn retired(&self, id: &ToastId) -> Option<&Toast> {
        self.history.iter().find(|t| t.id() == *id)
    }

    /// Render snapshots of active toasts in display order.
    pub fn views(&self) -> Vec<ToastView> {
        self.active.iter().map(Toast::view).collect()
    }

    pub fn is_scheduled(&self, id: &ToastId) -> bool {
        self.scheduler.dismissal(id).is_some()
    }

    /// Time left before the dismissal task of `id` fires.
    pub fn scheduled_remaining(&self, id: &ToastId) -> Option<u64> {
        let now = self.clock.now_ms();
        self.scheduler
            .dismissal(id)
            .map(|task| task.due_at_ms.saturating_sub(now))
    }

    pub fn stats(&self) -> RegistryStatsSnapshot {
        RegistryStatsSnapshot {
            total_added: self.stats.added,
            total_expired: self.stats.expired,
            total_removed: self.stats.removed,
            total_paused: self.stats.paused,
            total_resumed: self.stats.resumed,
            active_count: self.active.len(),
            history_count: self.history.len(),
            scheduled_count: self.scheduler.dismissal_count(),
        }
    }
}
