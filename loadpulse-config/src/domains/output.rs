//! Result persistence configuration

use crate::error::ConfigResult;
use crate::validation::{validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Where and how run results are written
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving `*_results.jsonl`, `*_stats.json` and report files
    #[serde(default = "default_results_dir")]
    pub results_dir: String,

    /// Serialization used for summary documents
    #[serde(default)]
    pub summary_format: SummaryFormat,

    /// Whether per-request samples are written next to the summary
    #[serde(default = "crate::domains::utils::default_true")]
    pub write_samples: bool,
}

/// Summary document format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SummaryFormat {
    #[default]
    Json,
    JsonCompact,
    Yaml,
}

impl SummaryFormat {
    /// File extension used for this format
    pub fn extension(&self) -> &'static str {
        match self {
            SummaryFormat::Json | SummaryFormat::JsonCompact => "json",
            SummaryFormat::Yaml => "yaml",
        }
    }
}

impl FromStr for SummaryFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(SummaryFormat::Json),
            "json_compact" | "json-compact" => Ok(SummaryFormat::JsonCompact),
            "yaml" | "yml" => Ok(SummaryFormat::Yaml),
            _ => Err(format!("Invalid summary format: {}", s)),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            results_dir: default_results_dir(),
            summary_format: SummaryFormat::Json,
            write_samples: true,
        }
    }
}

impl Validatable for OutputConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.results_dir, "results_dir", self.domain_name())
    }

    fn domain_name(&self) -> &'static str {
        "output"
    }
}

fn default_results_dir() -> String {
    "load_tests".to_string()
}
