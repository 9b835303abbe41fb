use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToastError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// A rendering anchor the host must provide is absent. This is a wiring
    /// defect of the host and is never retried.
    #[error("Missing presentation anchor: {0}")]
    MissingAnchor(&'static str),

    #[error("Toaster service is not running")]
    ServiceClosed,

    #[error("Invalid value: {0}")]
    Validation(String),
}

impl ToastError {
    /// Whether the error comes from host or configuration wiring rather than
    /// from the running service.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ToastError::Config(_) | ToastError::MissingAnchor(_))
    }
}

pub type Result<T> = std::result::Result<T, ToastError>;
