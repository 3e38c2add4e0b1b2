//! HTML summary of every load test summary in a results directory

use crate::errors::{OutputError, OutputResult};
use handlebars::Handlebars;
use loadpulse_engine::LoadTestResult;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

const REPORT_TEMPLATE_NAME: &str = "load_report";

const REPORT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>loadpulse report</title>
<style>
body { font-family: sans-serif; margin: 2em; }
table { border-collapse: collapse; width: 100%; }
th, td { border: 1px solid #ccc; padding: 6px 10px; text-align: left; }
th { background: #f0f0f0; }
.good { color: #2e7d32; }
.warning { color: #ef6c00; }
.critical { color: #c62828; }
</style>
</head>
<body>
<h1>Load test report</h1>
<p>Generated {{generated_at}} from {{results_dir}}</p>
<table>
<tr><th>Test</th><th>Requests</th><th>Success rate</th><th>Avg latency (ms)</th><th>Throughput (req/s)</th></tr>
{{#each rows}}
<tr><td>{{this.file}}</td><td>{{this.total_requests}}</td><td class="{{this.rate_class}}">{{this.success_rate}}%</td><td>{{this.avg_latency_ms}}</td><td>{{this.throughput_rps}}</td></tr>
{{else}}
<tr><td colspan="5">No load tests found</td></tr>
{{/each}}
</table>
</body>
</html>
"#;

/// One table row, already formatted for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub file: String,
    pub total_requests: usize,
    pub success_rate: String,
    pub rate_class: &'static str,
    pub avg_latency_ms: String,
    pub throughput_rps: String,
}

impl ReportRow {
    fn from_result(file: String, result: &LoadTestResult) -> Self {
        Self {
            file,
            total_requests: result.total_requests,
            success_rate: format!("{:.1}", result.success_rate),
            rate_class: rate_class(result.success_rate),
            avg_latency_ms: format!("{:.2}", result.latency.avg_ms),
            throughput_rps: format!("{:.2}", result.throughput_rps),
        }
    }
}

#[derive(Serialize)]
struct ReportContext<'a> {
    generated_at: String,
    results_dir: String,
    rows: &'a [ReportRow],
}

/// CSS class for a success rate
pub fn rate_class(success_rate: f64) -> &'static str {
    if success_rate >= 95.0 {
        "good"
    } else if success_rate >= 80.0 {
        "warning"
    } else {
        "critical"
    }
}

#[derive(Debug)]
pub struct HtmlReport {
    handlebars: Handlebars<'static>,
    results_dir: PathBuf,
}

impl HtmlReport {
    pub fn new(results_dir: impl Into<PathBuf>) -> OutputResult<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        handlebars
            .register_template_string(REPORT_TEMPLATE_NAME, REPORT_TEMPLATE)
            .map_err(|e| OutputError::TemplateRender {
                template: REPORT_TEMPLATE_NAME.to_string(),
                error: e.to_string(),
            })?;

        Ok(Self {
            handlebars,
            results_dir: results_dir.into(),
        })
    }

    /// Rows for every readable `*_stats.json`, in file name order
    pub async fn collect_rows(&self) -> OutputResult<Vec<ReportRow>> {
        let mut entries = match fs::read_dir(&self.results_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(dir = %self.results_dir.display(), "Results directory does not exist");
                return Ok(Vec::new());
            }
            Err(e) => return Err(OutputError::filesystem(&self.results_dir, "read_dir", e)),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| OutputError::filesystem(&self.results_dir, "read_dir", e))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with("_stats.json") {
                files.push((name, entry.path()));
            }
        }
        files.sort();

        let mut rows = Vec::with_capacity(files.len());
        for (name, path) in files {
            match read_summary(&path).await {
                Ok(result) => rows.push(ReportRow::from_result(name, &result)),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable summary"),
            }
        }
        Ok(rows)
    }

    /// Render the report as an HTML document
    pub async fn render(&self) -> OutputResult<String> {
        let rows = self.collect_rows().await?;
        let context = ReportContext {
            generated_at: chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            results_dir: self.results_dir.display().to_string(),
            rows: &rows,
        };

        self.handlebars
            .render(REPORT_TEMPLATE_NAME, &context)
            .map_err(|e| OutputError::TemplateRender {
                template: REPORT_TEMPLATE_NAME.to_string(),
                error: e.to_string(),
            })
    }

    /// Render and write the report, creating parent directories
    pub async fn write_to(&self, output: &Path) -> OutputResult<()> {
        let html = self.render().await?;
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| OutputError::filesystem(parent, "create_dirs", e))?;
        }
        fs::write(output, html)
            .await
            .map_err(|e| OutputError::filesystem(output, "write", e))?;
        info!(path = %output.display(), "HTML report written");
        Ok(())
    }
}

async fn read_summary(path: &Path) -> OutputResult<LoadTestResult> {
    let bytes = fs::read(path)
        .await
        .map_err(|e| OutputError::filesystem(path, "read", e))?;
    serde_json::from_slice(&bytes).map_err(|e| OutputError::Serialization {
        format: "json".to_string(),
        error: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{FilesystemStore, ResultStore};
    use chrono::{TimeZone, Utc};
    use loadpulse_engine::{LoadTestRun, MetricsAggregator, RunWindow};
    use loadpulse_http::{ErrorCategory, RequestOutcome, RequestSample};
    use std::time::Duration;

    fn run_at(second: u32, successes: usize, failures: usize) -> LoadTestRun {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, second).unwrap();
        let mut samples = Vec::new();
        for i in 0..successes {
            samples.push(RequestSample::new(
                0,
                i,
                RequestOutcome::response(at, 200, Duration::from_millis(5), Duration::from_millis(10)),
            ));
        }
        for i in 0..failures {
            samples.push(RequestSample::new(
                1,
                i,
                RequestOutcome::failure(at, ErrorCategory::ConnectionError, "refused", Duration::from_millis(2)),
            ));
        }
        let result = MetricsAggregator::aggregate(&samples, &RunWindow::new(at, Duration::from_secs(1)))
            .with_run_info("http://t/", 2, successes + failures);
        LoadTestRun { result, samples }
    }

    #[test]
    fn test_rate_class_thresholds() {
        assert_eq!(rate_class(100.0), "good");
        assert_eq!(rate_class(95.0), "good");
        assert_eq!(rate_class(94.9), "warning");
        assert_eq!(rate_class(80.0), "warning");
        assert_eq!(rate_class(79.9), "critical");
    }

    #[tokio::test]
    async fn test_empty_directory_renders_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let html = HtmlReport::new(dir.path()).unwrap().render().await.unwrap();
        assert!(html.contains("No load tests found"));
    }

    #[tokio::test]
    async fn test_missing_directory_is_empty_report() {
        let dir = tempfile::tempdir().unwrap();
        let report = HtmlReport::new(dir.path().join("absent")).unwrap();
        assert!(report.collect_rows().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rows_follow_file_name_order_and_skip_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemStore::new(dir.path()).with_samples(false);
        store.store_load_run(&run_at(30, 1, 1)).await.unwrap();
        store.store_load_run(&run_at(10, 4, 0)).await.unwrap();
        std::fs::write(dir.path().join("broken_stats.json"), b"{not json").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

        let report = HtmlReport::new(dir.path()).unwrap();
        let rows = report.collect_rows().await.unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].file, "load_test_20240601_120010_stats.json");
        assert_eq!(rows[0].success_rate, "100.0");
        assert_eq!(rows[0].rate_class, "good");
        assert_eq!(rows[1].total_requests, 2);
        assert_eq!(rows[1].rate_class, "critical");

        let html = report.render().await.unwrap();
        assert!(html.contains("load_test_20240601_120030_stats.json"));
        assert!(html.contains(r#"class="critical">50.0%"#));
        assert!(!html.contains("No load tests found"));
    }

    #[tokio::test]
    async fn test_write_to_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("reports").join("index.html");

        HtmlReport::new(dir.path()).unwrap().write_to(&output).await.unwrap();

        let html = std::fs::read_to_string(output).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
    }
}
