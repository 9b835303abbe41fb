use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ToastError;

/// Kind of a toast; selects the default title and the icon glyph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ToastKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl ToastKind {
    pub const ALL: [ToastKind; 4] = [
        ToastKind::Info,
        ToastKind::Success,
        ToastKind::Warning,
        ToastKind::Error,
    ];

    /// Title used when the caller supplies none
    pub fn default_title(&self) -> &'static str {
        match self {
            ToastKind::Info => "Info",
            ToastKind::Success => "Success",
            ToastKind::Warning => "Warning",
            ToastKind::Error => "Error",
        }
    }

    /// Name of the icon template rendered by the presentation layer
    pub fn icon(&self) -> &'static str {
        match self {
            ToastKind::Info => "info-svg",
            ToastKind::Success => "success-svg",
            ToastKind::Warning => "warning-svg",
            ToastKind::Error => "error-svg",
        }
    }

    /// Resolves the displayed title: blank or missing titles fall back to the
    /// kind's default.
    pub fn resolve_title(&self, title: Option<&str>) -> String {
        match title {
            Some(title) if !title.trim().is_empty() => title.to_string(),
            _ => self.default_title().to_string(),
        }
    }
}

impl fmt::Display for ToastKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ToastKind::Info => "INFO",
            ToastKind::Success => "SUCCESS",
            ToastKind::Warning => "WARNING",
            ToastKind::Error => "ERROR",
        };
        f.write_str(name)
    }
}

impl FromStr for ToastKind {
    type Err = ToastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "info" => Ok(ToastKind::Info),
            "success" => Ok(ToastKind::Success),
            "warning" | "warn" => Ok(ToastKind::Warning),
            "error" => Ok(ToastKind::Error),
            other => Err(ToastError::Validation(format!("unknown toast kind '{}'", other))),
        }
    }
}

/// How hover gestures translate into pause/resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum HoverPolicy {
    /// Only the hovered toast stops counting down
    #[default]
    #[serde(alias = "pause")]
    PauseHovered,
    /// Hovering any toast stops every active toast
    PauseAll,
    /// Hover has no effect on timing
    #[serde(alias = "none")]
    Disabled,
}

impl FromStr for HoverPolicy {
    type Err = ToastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pause" | "pause-hovered" => Ok(HoverPolicy::PauseHovered),
            "pause-all" => Ok(HoverPolicy::PauseAll),
            "disabled" | "none" => Ok(HoverPolicy::Disabled),
            other => Err(ToastError::Validation(format!("unknown hover policy '{}'", other))),
        }
    }
}
