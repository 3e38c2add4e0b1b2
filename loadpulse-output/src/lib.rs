//! Result persistence for loadpulse
//!
//! Finished runs are written as JSON Lines sample files plus a summary
//! document; [`HtmlReport`] renders a table over all stored load test
//! summaries.

pub mod errors;
pub mod report;
pub mod store;

pub use errors::{OutputError, OutputResult};
pub use report::{rate_class, HtmlReport, ReportRow};
pub use store::{
    file_timestamp, format_summary, samples_to_jsonl, FilesystemStore, ResultStore,
    StoredArtifacts,
};
