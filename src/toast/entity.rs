//! A single toast and its timing state.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::presentation::{require_anchors, Anchor, Host};

use super::events::ToastView;
use super::kind::ToastKind;

/// Visible lifetime used when the caller gives none
pub const DEFAULT_TOAST_DURATION_MS: u64 = 5000;

/// Time between the start of the exit transition and detachment
pub const DEFAULT_TOAST_CLOSE_DURATION_MS: u64 = 500;

/// Unique identifier of a toast.
///
/// Backed by a random v4 UUID. The `uuid` crate aborts if the OS entropy
/// source fails, so an identifier is never produced from degraded randomness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToastId(Uuid);

impl ToastId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ToastId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ToastId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for ToastId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Options accepted when constructing a toast.
#[derive(Debug, Clone)]
pub struct ToastOptions {
    pub kind: ToastKind,
    pub title: Option<String>,
    pub message: String,
    /// Signed so that negative inputs can be clamped to zero
    pub duration_ms: i64,
    pub paused: bool,
}

impl Default for ToastOptions {
    fn default() -> Self {
        Self {
            kind: ToastKind::Info,
            title: None,
            message: String::new(),
            duration_ms: DEFAULT_TOAST_DURATION_MS as i64,
            paused: false,
        }
    }
}

impl ToastOptions {
    pub fn new(kind: ToastKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn duration_ms(mut self, duration_ms: i64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn paused(mut self, paused: bool) -> Self {
        self.paused = paused;
        self
    }
}

/// Where a toast is in its visual lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Shown and counting down
    Active,
    /// Exit transition running
    Exiting,
    /// Element removed from the host
    Detached,
}

/// One notification with content and elapsed-time accounting.
#[derive(Debug, Clone)]
pub struct Toast {
    id: ToastId,
    kind: ToastKind,
    title: String,
    message: String,
    duration_ms: u64,
    created_at: DateTime<Utc>,
    paused: bool,
    /// Time spent unpaused since creation
    elapsed_active_ms: u64,
    /// Clock reading of the previous progress sample
    last_sample_ms: u64,
    /// Whether the progress loop is still accumulating
    tracking: bool,
    phase: Phase,
}

impl Toast {
    /// Build a toast at clock reading `now_ms`.
    ///
    /// Fails when the host cannot instantiate the toast template or its
    /// progress indicator.
    pub fn new(options: ToastOptions, now_ms: u64, host: &dyn Host) -> Result<Self> {
        require_anchors(host, &[Anchor::Template, Anchor::ProgressBar])?;

        let duration_ms = options.duration_ms.max(0) as u64;

        Ok(Self {
            id: ToastId::new(),
            kind: options.kind,
            title: options.kind.resolve_title(options.title.as_deref()),
            message: options.message,
            duration_ms,
            created_at: Utc::now(),
            paused: options.paused,
            elapsed_active_ms: 0,
            last_sample_ms: now_ms,
            // zero-duration toasts are pinned at full progress from the start
            tracking: duration_ms > 0,
            phase: Phase::Active,
        })
    }

    /// One step of the progress loop.
    ///
    /// Adds the time since the previous sample to the elapsed total when the
    /// toast is unpaused. Returns `true` if progress moved.
    pub fn sample(&mut self, now_ms: u64) -> bool {
        let delta = now_ms.saturating_sub(self.last_sample_ms);
        self.last_sample_ms = self.last_sample_ms.max(now_ms);

        if !self.tracking || self.paused || self.phase != Phase::Active {
            return false;
        }

        self.elapsed_active_ms += delta;
        if self.elapsed_active_ms > self.duration_ms {
            self.tracking = false;
        }

        delta > 0
    }

    /// Fraction of the duration spent unpaused, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        if self.duration_ms == 0 {
            return 1.0;
        }
        (self.elapsed_active_ms as f64 / self.duration_ms as f64).clamp(0.0, 1.0)
    }

    /// `(1 - progress) * duration`, in whole milliseconds.
    pub fn remaining_ms(&self) -> u64 {
        self.duration_ms.saturating_sub(self.elapsed_active_ms)
    }

    /// Pause setter. Returns `true` if the flag changed.
    pub fn set_paused(&mut self, paused: bool) -> bool {
        if self.paused == paused {
            return false;
        }
        self.paused = paused;
        true
    }

    /// Start the exit transition.
    ///
    /// Returns the clock reading at which the element must be detached, or
    /// `None` if the transition already started.
    pub fn remove(&mut self, now_ms: u64, close_animation_ms: u64) -> Option<u64> {
        if self.phase != Phase::Active {
            return None;
        }
        self.phase = Phase::Exiting;
        self.tracking = false;
        Some(now_ms + close_animation_ms)
    }

    /// Mark the visual element as removed from the host.
    pub fn mark_detached(&mut self) {
        self.phase = Phase::Detached;
    }

    /// Whether the progress loop is still running.
    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    pub fn id(&self) -> ToastId {
        self.id
    }

    pub fn kind(&self) -> ToastKind {
        self.kind
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn elapsed_active_ms(&self) -> u64 {
        self.elapsed_active_ms
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Snapshot of everything the presentation layer draws.
    pub fn view(&self) -> ToastView {
        ToastView {
            id: self.id,
            kind: self.kind,
            title: self.title.clone(),
            message: self.message.clone(),
            icon: self.kind.icon(),
            duration_ms: self.duration_ms,
            progress: self.progress(),
            paused: self.paused,
            phase: self.phase,
            created_at: self.created_at,
        }
    }
}
