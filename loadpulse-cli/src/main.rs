use anyhow::{Context, Result};
use clap::Parser;
use loadpulse_config::{LogLevel, LoggingConfig};
use loadpulse_logging::{init_logging_from_config, init_simple_tracing, LoggingGuard};
use tracing::debug;

mod cli;
mod commands;
mod summary;

use cli::{Cli, Commands, ConfigCommands};
use commands::{config, load_config, report, run};

/// Set up tracing from the logging domain, honouring `--log-level`
fn init_logging(logging: &LoggingConfig, log_level: Option<&String>) -> Result<Option<LoggingGuard>> {
    let mut logging = logging.clone();
    if let Some(level) = log_level {
        logging.level = level
            .parse::<LogLevel>()
            .map_err(anyhow::Error::msg)
            .context("Invalid --log-level")?;
    }

    match init_logging_from_config(&logging) {
        Ok(guard) => Ok(Some(guard)),
        Err(e) => {
            eprintln!("Failed to initialize configured logging: {:#}", e);
            init_simple_tracing(logging.level.as_filter())?;
            Ok(None)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // `config validate` must report a broken file rather than fail on it here
    let validating = matches!(
        &cli.command,
        Some(Commands::Config {
            config_cmd: ConfigCommands::Validate { .. }
        })
    );
    let config = if validating {
        load_config(None).unwrap_or_default()
    } else {
        load_config(cli.config.as_deref())?
    };

    let _logging_guard = init_logging(&config.logging, cli.log_level.as_ref())?;
    debug!(config = ?cli.config, "loadpulse starting");

    match &cli.command {
        Some(Commands::Load { overrides, no_save }) => {
            run::handle_load(config, overrides, *no_save).await
        }
        Some(Commands::Stress { overrides, no_save }) => {
            run::handle_stress(config, overrides, *no_save).await
        }
        Some(Commands::Report { output }) => {
            report::handle_report(&config.output, output.as_deref()).await
        }
        Some(Commands::Config { config_cmd }) => match config_cmd {
            ConfigCommands::Validate { config_file } => config::handle_validate(config_file),
            ConfigCommands::Generate { output, force } => config::handle_generate(output, *force),
            ConfigCommands::Show { format } => config::handle_show(cli.config.as_deref(), format),
        },
        None => {
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            cmd.print_help().context("Failed to print help")?;
            println!();
            Ok(())
        }
    }
}
