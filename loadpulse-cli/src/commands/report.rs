use anyhow::{Context, Result};
use loadpulse_config::OutputConfig;
use loadpulse_output::HtmlReport;
use std::path::Path;

/// Write the HTML report to `output`, or print it
pub async fn handle_report(config: &OutputConfig, output: Option<&Path>) -> Result<()> {
    let report = HtmlReport::new(&config.results_dir).context("Failed to prepare report template")?;

    match output {
        Some(path) => {
            report
                .write_to(path)
                .await
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            println!("✅ Report written to {}", path.display());
        }
        None => {
            let html = report.render().await.context("Failed to render report")?;
            println!("{}", html);
        }
    }

    Ok(())
}
