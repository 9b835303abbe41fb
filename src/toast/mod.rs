//! Toast lifecycle domain.
//!
//! - `entity`: a single toast and its elapsed-time accounting
//! - `registry`: active/retired toasts, dismissal tasks and hover policy
//! - `scheduler`: deadlines of dismissal and detach tasks
//! - `events`: change notifications for the presentation layer

mod entity;
mod events;
mod kind;
mod registry;
mod scheduler;

pub use entity::{
    Phase, Toast, ToastId, ToastOptions, DEFAULT_TOAST_CLOSE_DURATION_MS,
    DEFAULT_TOAST_DURATION_MS,
};
pub use events::{ToastEvent, ToastView};
pub use kind::{HoverPolicy, ToastKind};
pub use registry::{Registry, RegistryStatsSnapshot};
pub use scheduler::{DismissalTask, Scheduler, TaskHandle};
