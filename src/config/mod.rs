mod settings;

pub use settings::{LogFormat, LoggingConfig, ServiceConfig, Settings, ToastSettings};
