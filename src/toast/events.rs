use chrono::{DateTime, Utc};
use serde::Serialize;

use super::entity::{Phase, ToastId};
use super::kind::ToastKind;

/// Render snapshot of a toast
#[derive(Debug, Clone, Serialize)]
pub struct ToastView {
    pub id: ToastId,
    pub kind: ToastKind,
    pub title: String,
    pub message: String,
    /// Icon template for the kind
    pub icon: &'static str,
    pub duration_ms: u64,
    pub progress: f64,
    pub paused: bool,
    pub phase: Phase,
    pub created_at: DateTime<Utc>,
}

/// Change notification published by the registry.
///
/// The presentation layer subscribes to these instead of the registry
/// touching visual state directly.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToastEvent {
    /// New toast appended to the active list
    Added(ToastView),
    /// Progress indicator moved during a frame
    Progress { id: ToastId, progress: f64 },
    /// Countdown stopped
    Paused { id: ToastId },
    /// Countdown restarted with the given remaining time
    Resumed { id: ToastId, remaining_ms: u64 },
    /// Exit transition started; the toast is retired
    Exiting { id: ToastId },
    /// Close animation finished; the element can be dropped
    Detached { id: ToastId },
}

impl ToastEvent {
    pub fn toast_id(&self) -> ToastId {
        match self {
            ToastEvent::Added(view) => view.id,
            ToastEvent::Progress { id, .. }
            | ToastEvent::Paused { id }
            | ToastEvent::Resumed { id, .. }
            | ToastEvent::Exiting { id }
            | ToastEvent::Detached { id } => *id,
        }
    }
}
