use super::load_config;
use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use loadpulse_config::{ConfigLoader, LoadPulseConfig};
use std::fs;
use std::path::Path;
use tracing::{error, info};

/// Handle configuration validation
pub fn handle_validate(config_file: &Path) -> Result<()> {
    info!(path = %config_file.display(), "Validating configuration file");

    if !config_file.exists() {
        return Err(anyhow!(
            "Configuration file not found: {}",
            config_file.display()
        ));
    }

    match ConfigLoader::new().from_file(config_file) {
        Ok(_) => {
            println!("{} Configuration file is valid", "✅".green());
            Ok(())
        }
        Err(e) => {
            println!("{} Configuration validation failed: {}", "❌".red(), e);
            error!(error = %e, "Configuration validation failed");
            Err(e.into())
        }
    }
}

/// Write the default configuration document
pub fn handle_generate(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        return Err(anyhow!(
            "Output file already exists: {}. Use --force to overwrite.",
            output.display()
        ));
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context("Failed to create output directory")?;
    }

    fs::write(output, LoadPulseConfig::generate_sample())
        .context("Failed to write configuration file")?;

    println!("✅ Configuration generated at: {}", output.display());
    println!(
        "🔧 Validate with: loadpulse config validate --config-file {}",
        output.display()
    );
    Ok(())
}

/// Render the effective configuration
pub fn render_config(config: &LoadPulseConfig, format: &str) -> Result<String> {
    match format.to_lowercase().as_str() {
        "yaml" | "yml" => serde_yaml::to_string(config).context("Failed to serialize to YAML"),
        "json" => serde_json::to_string_pretty(config).context("Failed to serialize to JSON"),
        _ => Err(anyhow!(
            "Unknown output format: {}. Valid formats: yaml, json",
            format
        )),
    }
}

pub fn handle_show(config_file: Option<&Path>, format: &str) -> Result<()> {
    let config = load_config(config_file)?;
    println!("{}", render_config(&config, format)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_then_validate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join("loadpulse.yaml");

        handle_generate(&path, false).unwrap();
        assert!(path.exists());
        handle_validate(&path).unwrap();
    }

    #[test]
    fn test_generate_refuses_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loadpulse.yaml");
        fs::write(&path, "# mine").unwrap();

        assert!(handle_generate(&path, false).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "# mine");

        handle_generate(&path, true).unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("target:"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        fs::write(&path, "stress:\n  max_users: 5\n  increment_users: 10\n").unwrap();

        assert!(handle_validate(&path).is_err());
        assert!(handle_validate(&dir.path().join("missing.yaml")).is_err());
    }

    #[test]
    fn test_render_config_formats() {
        let config = LoadPulseConfig::default();

        let json = render_config(&config, "json").unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["load"]["num_users"], 10);

        assert!(render_config(&config, "YAML").unwrap().contains("stress:"));
        assert!(render_config(&config, "toml").is_err());
    }
}
