//! CLI argument parsing definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "HTTP load and stress testing", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a fixed-population load test
    Load {
        #[command(flatten)]
        overrides: LoadOverrides,

        /// Do not write result files
        #[arg(long)]
        no_save: bool,
    },

    /// Increase concurrency level by level until the target breaks
    Stress {
        #[command(flatten)]
        overrides: StressOverrides,

        /// Do not write result files
        #[arg(long)]
        no_save: bool,
    },

    /// Render an HTML report over stored load test summaries
    Report {
        /// Write the report here instead of printing it
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        config_cmd: ConfigCommands,
    },
}

/// Command line values that replace `load` configuration
#[derive(clap::Args, Debug, Default, Clone)]
pub struct LoadOverrides {
    /// Target URL
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Number of concurrent virtual users
    #[arg(long, value_name = "N")]
    pub users: Option<usize>,

    /// Requests per virtual user
    #[arg(long, value_name = "N")]
    pub requests: Option<usize>,

    /// Ramp-up interval in seconds
    #[arg(long, value_name = "SECONDS")]
    pub ramp_up: Option<u64>,

    /// Pause between requests of one user, in milliseconds
    #[arg(long, value_name = "MS")]
    pub think_time_ms: Option<u64>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Stop the whole run after this many seconds
    #[arg(long, value_name = "SECONDS")]
    pub max_duration: Option<u64>,
}

/// Command line values that replace `stress` configuration
#[derive(clap::Args, Debug, Default, Clone)]
pub struct StressOverrides {
    /// Target URL
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Highest concurrency level
    #[arg(long, value_name = "N")]
    pub max_users: Option<usize>,

    /// Users added per level
    #[arg(long, value_name = "N")]
    pub increment: Option<usize>,

    /// Requests per user at every level
    #[arg(long, value_name = "N")]
    pub requests: Option<usize>,

    /// Success rate percentage below which a level is the breaking point
    #[arg(long, value_name = "PERCENT")]
    pub break_threshold: Option<f64>,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Validate a configuration file
    Validate {
        /// Path to the configuration file
        #[arg(long, value_name = "PATH")]
        config_file: PathBuf,
    },

    /// Generate a sample configuration file
    Generate {
        /// Output file path
        #[arg(long, value_name = "PATH")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration
    Show {
        /// Output format: yaml, json
        #[arg(long, value_name = "FORMAT", default_value = "yaml")]
        format: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_load_flags_parse() {
        let cli = Cli::parse_from([
            "loadpulse",
            "--log-level",
            "debug",
            "load",
            "--url",
            "http://localhost:3000/",
            "--users",
            "4",
            "--think-time-ms",
            "0",
            "--no-save",
        ]);

        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        match cli.command {
            Some(Commands::Load { overrides, no_save }) => {
                assert!(no_save);
                assert_eq!(overrides.users, Some(4));
                assert_eq!(overrides.think_time_ms, Some(0));
                assert_eq!(overrides.requests, None);
            }
            _ => panic!("expected load command"),
        }
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli = Cli::parse_from(["loadpulse", "stress", "--max-users", "50", "--config", "lp.yaml"]);
        assert_eq!(cli.config, Some(PathBuf::from("lp.yaml")));
        assert!(matches!(
            cli.command,
            Some(Commands::Stress { ref overrides, no_save: false }) if overrides.max_users == Some(50)
        ));
    }
}
