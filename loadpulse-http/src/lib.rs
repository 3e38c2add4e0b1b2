//! Request executor for loadpulse
//!
//! Issues one HTTP request per call and converts whatever happens into a
//! structured [`RequestOutcome`]. Knows nothing about concurrency or
//! aggregation.

pub mod errors;
pub mod executor;
pub mod sample;
pub mod types;

// Re-export main types for convenience
pub use errors::HttpError;
pub use executor::{classify_error, HttpExecutor, RequestExecutor};
pub use sample::{ErrorCategory, RequestOutcome, RequestSample};
pub use types::HttpMethod;
