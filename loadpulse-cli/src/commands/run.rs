use crate::cli::{LoadOverrides, StressOverrides};
use crate::summary::{print_load_summary, print_stress_summary};
use anyhow::{Context, Result};
use loadpulse_config::LoadPulseConfig;
use loadpulse_engine::{run_load_test_with_cancel, run_stress_test_with_cancel, CancelHandle};
use loadpulse_output::{FilesystemStore, ResultStore, StoredArtifacts};
use std::time::Duration;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Fold `load` command line values into the configuration and re-validate
pub fn apply_load_overrides(config: &mut LoadPulseConfig, overrides: &LoadOverrides) -> Result<()> {
    if let Some(url) = &overrides.url {
        config.target.url = url.clone();
    }
    let load = &mut config.load;
    if let Some(users) = overrides.users {
        load.num_users = users;
    }
    if let Some(requests) = overrides.requests {
        load.requests_per_user = requests;
    }
    if let Some(seconds) = overrides.ramp_up {
        load.ramp_up = Duration::from_secs(seconds);
    }
    if let Some(ms) = overrides.think_time_ms {
        load.think_time = Duration::from_millis(ms);
    }
    if let Some(seconds) = overrides.timeout {
        load.timeout = Some(Duration::from_secs(seconds));
    }
    if let Some(seconds) = overrides.max_duration {
        load.max_duration = Some(Duration::from_secs(seconds));
    }

    config.validate_all().context("Invalid load test options")
}

/// Fold `stress` command line values into the configuration and re-validate
pub fn apply_stress_overrides(
    config: &mut LoadPulseConfig,
    overrides: &StressOverrides,
) -> Result<()> {
    if let Some(url) = &overrides.url {
        config.target.url = url.clone();
    }
    let stress = &mut config.stress;
    if let Some(max_users) = overrides.max_users {
        stress.max_users = max_users;
    }
    if let Some(increment) = overrides.increment {
        stress.increment_users = increment;
    }
    if let Some(requests) = overrides.requests {
        stress.requests_per_increment = requests;
    }
    if let Some(threshold) = overrides.break_threshold {
        stress.break_threshold_percent = threshold;
    }

    config.validate_all().context("Invalid stress test options")
}

pub async fn handle_load(mut config: LoadPulseConfig, overrides: &LoadOverrides, no_save: bool) -> Result<()> {
    apply_load_overrides(&mut config, overrides)?;

    let cancel = CancelHandle::new();
    let watcher = cancel_on_ctrl_c(cancel.clone());
    let run = run_load_test_with_cancel(&config.target, &config.http, &config.load, cancel).await;
    watcher.abort();
    let run = run.context("Load test could not start")?;

    print_load_summary(&run.result);

    if !no_save {
        let store = FilesystemStore::from_config(&config.output);
        let artifacts = store
            .store_load_run(&run)
            .await
            .context("Failed to save load test results")?;
        print_saved(&artifacts);
    }
    Ok(())
}

pub async fn handle_stress(
    mut config: LoadPulseConfig,
    overrides: &StressOverrides,
    no_save: bool,
) -> Result<()> {
    apply_stress_overrides(&mut config, overrides)?;

    let cancel = CancelHandle::new();
    let watcher = cancel_on_ctrl_c(cancel.clone());
    let run = run_stress_test_with_cancel(&config.target, &config.http, &config.stress, cancel).await;
    watcher.abort();
    let run = run.context("Stress test could not start")?;

    print_stress_summary(&run.result);

    if !no_save {
        let store = FilesystemStore::from_config(&config.output);
        let artifacts = store
            .store_stress_run(&run)
            .await
            .context("Failed to save stress test results")?;
        print_saved(&artifacts);
    }
    Ok(())
}

fn cancel_on_ctrl_c(cancel: CancelHandle) -> JoinHandle<()> {
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Received Ctrl+C, stopping run");
            cancel.cancel();
        }
    })
}

fn print_saved(artifacts: &StoredArtifacts) {
    for path in &artifacts.paths {
        println!("  saved {}", path.display());
    }
    info!(files = artifacts.paths.len(), "Results saved");
}
