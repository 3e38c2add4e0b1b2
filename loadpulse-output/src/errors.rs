//! Error types for result persistence

use thiserror::Error;

/// Errors raised while writing or reading result files
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Filesystem error during {operation} on {path}: {error}")]
    Filesystem {
        path: String,
        operation: String,
        error: String,
    },

    #[error("Serialization error ({format}): {error}")]
    Serialization { format: String, error: String },

    #[error("Template rendering failed for {template}: {error}")]
    TemplateRender { template: String, error: String },
}

impl OutputError {
    pub(crate) fn filesystem(
        path: impl AsRef<std::path::Path>,
        operation: &str,
        error: impl std::fmt::Display,
    ) -> Self {
        Self::Filesystem {
            path: path.as_ref().to_string_lossy().to_string(),
            operation: operation.to_string(),
            error: error.to_string(),
        }
    }
}

pub type OutputResult<T> = Result<T, OutputError>;
