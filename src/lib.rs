// Shared components
pub mod clock;
pub mod config;
pub mod error;

// Domain layer (toast lifecycle)
pub mod toast;

// Application layer
pub mod presentation;
pub mod tasks;

// Supporting modules
pub mod telemetry;
