//! Error types for load and stress runs

use loadpulse_config::ConfigError;
use loadpulse_http::HttpError;
use thiserror::Error;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine errors
///
/// Per-request failures never show up here; they are recorded as samples.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Invalid run parameters, raised before any request is issued
    #[error("Invalid configuration for {field}: {message}")]
    InvalidConfiguration { field: String, message: String },

    /// A virtual user task panicked or was aborted
    #[error("Virtual user task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl EngineError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<HttpError> for EngineError {
    fn from(err: HttpError) -> Self {
        Self::invalid("http", err.to_string())
    }
}

impl From<ConfigError> for EngineError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::DomainError { domain, message } => Self::invalid(domain, message),
            other => Self::invalid("config", other.to_string()),
        }
    }
}
