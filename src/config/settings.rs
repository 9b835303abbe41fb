use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

use crate::toast::HoverPolicy;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub toast: ToastSettings,
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToastSettings {
    /// Visible lifetime in milliseconds when the caller gives none (0 = sticky)
    #[serde(default = "default_duration_ms")]
    pub default_duration_ms: u64,
    /// Delay between the start of the exit transition and detachment
    #[serde(default = "default_close_animation_ms")]
    pub close_animation_ms: u64,
    /// How hover gestures fan out to pause/resume
    #[serde(default)]
    pub hover_policy: HoverPolicy,
    /// Maximum retired toasts kept for diagnostics (None = unbounded)
    #[serde(default)]
    pub history_limit: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Rendering frame interval in milliseconds
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
    /// Buffered change notifications per subscriber
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
    /// Buffered commands waiting for the service task
    #[serde(default = "default_command_capacity")]
    pub command_capacity: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_duration_ms() -> u64 {
    5000 // 5 seconds
}

fn default_close_animation_ms() -> u64 {
    500
}

fn default_frame_interval_ms() -> u64 {
    16 // ~60 frames per second
}

fn default_event_capacity() -> usize {
    256
}

fn default_command_capacity() -> usize {
    64
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            // Start with default values
            .set_default("toast.default_duration_ms", 5000)?
            .set_default("toast.close_animation_ms", 500)?
            .set_default("toast.hover_policy", "pause-hovered")?
            .set_default("service.frame_interval_ms", 16)?
            .set_default("service.event_capacity", 256)?
            .set_default("service.command_capacity", 64)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "text")?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // TOASTER__TOAST__HOVER_POLICY, TOASTER__SERVICE__FRAME_INTERVAL_MS, etc.
            .add_source(
                Environment::with_prefix("TOASTER")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }
}

impl Default for ToastSettings {
    fn default() -> Self {
        Self {
            default_duration_ms: default_duration_ms(),
            close_animation_ms: default_close_animation_ms(),
            hover_policy: HoverPolicy::default(),
            history_limit: None,
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: default_frame_interval_ms(),
            event_capacity: default_event_capacity(),
            command_capacity: default_command_capacity(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let toast = ToastSettings::default();
        assert_eq!(toast.default_duration_ms, 5000);
        assert_eq!(toast.close_animation_ms, 500);
        assert_eq!(toast.hover_policy, HoverPolicy::PauseHovered);
        assert!(toast.history_limit.is_none());

        let service = ServiceConfig::default();
        assert_eq!(service.frame_interval_ms, 16);
        assert_eq!(service.event_capacity, 256);
    }

    #[test]
    fn test_deserialize_partial_sections() {
        let settings: Settings = Config::builder()
            .set_default("toast.hover_policy", "pause-all")
            .unwrap()
            .set_default("toast.history_limit", 10)
            .unwrap()
            .set_default("logging.format", "json")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.toast.hover_policy, HoverPolicy::PauseAll);
        assert_eq!(settings.toast.history_limit, Some(10));
        assert_eq!(settings.toast.default_duration_ms, 5000);
        assert_eq!(settings.logging.format, LogFormat::Json);
        assert_eq!(settings.logging.level, "info");
    }
}
