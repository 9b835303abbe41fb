//! Contract with the external presentation layer.
//!
//! The registry never draws anything. It checks at construction that the host
//! exposes the anchors a toast needs, publishes [`ToastEvent`](crate::toast::ToastEvent)s
//! for the host to render, and accepts user [`Gesture`]s back.

use std::collections::HashSet;

use serde::Deserialize;

use crate::error::{Result, ToastError};
use crate::toast::ToastId;

/// Named element the host must provide before toasts can be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Anchor {
    /// Container every toast element is attached to
    Container,
    /// Template cloned for each toast
    Template,
    /// Progress indicator inside the template
    ProgressBar,
}

impl Anchor {
    pub const ALL: [Anchor; 3] = [Anchor::Container, Anchor::Template, Anchor::ProgressBar];

    pub fn as_str(&self) -> &'static str {
        match self {
            Anchor::Container => "toast-container",
            Anchor::Template => "toast-template",
            Anchor::ProgressBar => "progress",
        }
    }
}

/// Host environment that renders toasts.
pub trait Host: Send + Sync {
    fn has_anchor(&self, anchor: Anchor) -> bool;
}

/// Fails with [`ToastError::MissingAnchor`] unless every anchor is present.
pub fn require_anchors(host: &dyn Host, anchors: &[Anchor]) -> Result<()> {
    match anchors.iter().find(|anchor| !host.has_anchor(**anchor)) {
        Some(missing) => {
            tracing::error!(anchor = missing.as_str(), "Presentation anchor not found");
            Err(ToastError::MissingAnchor(missing.as_str()))
        }
        None => Ok(()),
    }
}

/// Host with no real surface, used by the binary and by tests.
#[derive(Debug, Clone)]
pub struct HeadlessHost {
    anchors: HashSet<Anchor>,
}

impl HeadlessHost {
    /// Host exposing every anchor.
    pub fn new() -> Self {
        Self {
            anchors: Anchor::ALL.into_iter().collect(),
        }
    }

    /// Host exposing only the given anchors.
    pub fn with_anchors(anchors: impl IntoIterator<Item = Anchor>) -> Self {
        Self {
            anchors: anchors.into_iter().collect(),
        }
    }
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new()
    }
}

impl Host for HeadlessHost {
    fn has_anchor(&self, anchor: Anchor) -> bool {
        self.anchors.contains(&anchor)
    }
}

/// User gesture forwarded from a rendered toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "gesture", content = "id", rename_all = "snake_case")]
pub enum Gesture {
    /// Close button clicked
    Close(ToastId),
    /// Pointer entered the toast
    PointerEnter(ToastId),
    /// Pointer left the toast
    PointerLeave(ToastId),
}

impl Gesture {
    pub fn toast_id(&self) -> ToastId {
        match self {
            Gesture::Close(id) | Gesture::PointerEnter(id) | Gesture::PointerLeave(id) => *id,
        }
    }
}
