//! Filesystem persistence for load and stress runs

use crate::errors::{OutputError, OutputResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use loadpulse_config::{OutputConfig, SummaryFormat};
use loadpulse_engine::{LoadTestRun, StressRun};
use loadpulse_http::RequestSample;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Files written for one run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredArtifacts {
    pub paths: Vec<PathBuf>,
}

/// Where finished runs are handed off
#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn store_load_run(&self, run: &LoadTestRun) -> OutputResult<StoredArtifacts>;

    async fn store_stress_run(&self, run: &StressRun) -> OutputResult<StoredArtifacts>;
}

/// Writes runs as files under one results directory
#[derive(Debug, Clone)]
pub struct FilesystemStore {
    results_dir: PathBuf,
    summary_format: SummaryFormat,
    write_samples: bool,
}

impl FilesystemStore {
    pub fn new(results_dir: impl Into<PathBuf>) -> Self {
        Self {
            results_dir: results_dir.into(),
            summary_format: SummaryFormat::Json,
            write_samples: true,
        }
    }

    pub fn from_config(config: &OutputConfig) -> Self {
        Self {
            results_dir: PathBuf::from(&config.results_dir),
            summary_format: config.summary_format,
            write_samples: config.write_samples,
        }
    }

    pub fn with_summary_format(mut self, format: SummaryFormat) -> Self {
        self.summary_format = format;
        self
    }

    pub fn with_samples(mut self, write_samples: bool) -> Self {
        self.write_samples = write_samples;
        self
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    async fn ensure_dir(&self) -> OutputResult<()> {
        fs::create_dir_all(&self.results_dir)
            .await
            .map_err(|e| OutputError::filesystem(&self.results_dir, "create_dirs", e))
    }

    async fn write_file(&self, name: String, contents: Vec<u8>) -> OutputResult<PathBuf> {
        let path = self.results_dir.join(name);
        fs::write(&path, &contents)
            .await
            .map_err(|e| OutputError::filesystem(&path, "write", e))?;
        debug!(path = %path.display(), bytes = contents.len(), "Wrote result file");
        Ok(path)
    }
}

#[async_trait]
impl ResultStore for FilesystemStore {
    async fn store_load_run(&self, run: &LoadTestRun) -> OutputResult<StoredArtifacts> {
        self.ensure_dir().await?;
        let stamp = file_timestamp(run.result.started_at);
        let mut artifacts = StoredArtifacts::default();

        if self.write_samples {
            let name = format!("load_test_{}_results.jsonl", stamp);
            artifacts
                .paths
                .push(self.write_file(name, samples_to_jsonl(&run.samples)?).await?);
        }

        let name = format!(
            "load_test_{}_stats.{}",
            stamp,
            self.summary_format.extension()
        );
        artifacts
            .paths
            .push(self.write_file(name, format_summary(&run.result, self.summary_format)?).await?);

        info!(files = artifacts.paths.len(), dir = %self.results_dir.display(), "Load test results saved");
        Ok(artifacts)
    }

    async fn store_stress_run(&self, run: &StressRun) -> OutputResult<StoredArtifacts> {
        self.ensure_dir().await?;
        let stamp = file_timestamp(run.result.started_at);
        let mut artifacts = StoredArtifacts::default();

        if self.write_samples {
            for (level, samples) in run.result.levels.iter().zip(&run.samples) {
                let name = format!(
                    "stress_test_{}_level_{}_results.jsonl",
                    stamp, level.user_count
                );
                artifacts
                    .paths
                    .push(self.write_file(name, samples_to_jsonl(samples)?).await?);
            }
        }

        let name = format!("stress_test_{}.{}", stamp, self.summary_format.extension());
        artifacts
            .paths
            .push(self.write_file(name, format_summary(&run.result, self.summary_format)?).await?);

        info!(files = artifacts.paths.len(), dir = %self.results_dir.display(), "Stress test results saved");
        Ok(artifacts)
    }
}

/// `YYYYmmdd_HHMMSS` stamp used in file names
pub fn file_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y%m%d_%H%M%S").to_string()
}

/// One JSON object per line, newline terminated
pub fn samples_to_jsonl(samples: &[RequestSample]) -> OutputResult<Vec<u8>> {
    let mut buffer = Vec::with_capacity(samples.len() * 192);
    for sample in samples {
        serde_json::to_writer(&mut buffer, sample).map_err(|e| OutputError::Serialization {
            format: "jsonl".to_string(),
            error: e.to_string(),
        })?;
        buffer.push(b'\n');
    }
    Ok(buffer)
}

/// Serialize a summary document in the configured format
pub fn format_summary<T: Serialize>(value: &T, format: SummaryFormat) -> OutputResult<Vec<u8>> {
    match format {
        SummaryFormat::Json => {
            serde_json::to_vec_pretty(value).map_err(|e| OutputError::Serialization {
                format: "json".to_string(),
                error: e.to_string(),
            })
        }
        SummaryFormat::JsonCompact => {
            serde_json::to_vec(value).map_err(|e| OutputError::Serialization {
                format: "json_compact".to_string(),
                error: e.to_string(),
            })
        }
        SummaryFormat::Yaml => serde_yaml::to_string(value)
            .map(String::into_bytes)
            .map_err(|e| OutputError::Serialization {
                format: "yaml".to_string(),
                error: e.to_string(),
            }),
    }
}
