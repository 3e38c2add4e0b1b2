//! HTTP error types

use crate::types::HttpMethod;

/// Error type for building the HTTP executor
///
/// Individual requests never fail with this type; their failures are captured
/// in the returned sample.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[from] reqwest::Error),

    #[error("Invalid HTTP method: '{0}'. Supported methods are: {supported}", supported = HttpMethod::supported())]
    InvalidMethod(String),
}
