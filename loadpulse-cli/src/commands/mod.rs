//! Subcommand handlers

pub mod config;
pub mod report;
pub mod run;

use anyhow::{Context, Result};
use loadpulse_config::{ConfigLoader, LoadPulseConfig};
use std::path::Path;
use tracing::{debug, warn};

/// Load configuration from file or use environment and defaults
pub fn load_config(config_path: Option<&Path>) -> Result<LoadPulseConfig> {
    let loader = ConfigLoader::new();

    match config_path {
        Some(path) if path.exists() => loader
            .from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        Some(path) => {
            warn!(path = %path.display(), "Configuration file not found, using defaults");
            loader
                .from_env()
                .context("Failed to load configuration from environment")
        }
        None => {
            debug!("No configuration file specified, loading from environment or defaults");
            loader
                .from_env()
                .context("Failed to load configuration from environment")
        }
    }
}
