use anyhow::{Context, Result};
use loadpulse_config::{LogFormat, LogLevel, LogRotation, LogTarget, LoggingConfig};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

/// A type-erased fmt layer attached to the registry
pub type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Keeps background log writers alive; dropping it flushes file targets.
#[must_use = "dropping the guard stops file logging"]
#[derive(Default)]
pub struct LoggingGuard {
    _guards: Vec<WorkerGuard>,
}

/// Initialize logging from configuration
pub fn init_logging_from_config(config: &LoggingConfig) -> Result<LoggingGuard> {
    let (layers, guards) = build_layers(config)?;

    let env_filter = EnvFilter::try_new(config.level.as_filter())
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // Use try_init to avoid panic if global subscriber already set
    if tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()
        .is_err()
    {
        tracing::debug!("Global tracing subscriber already initialized, skipping");
    }

    Ok(LoggingGuard { _guards: guards })
}

/// Build one fmt layer per configured target
///
/// Returned guards must outlive the subscriber or buffered file output is lost.
pub fn build_layers(config: &LoggingConfig) -> Result<(Vec<BoxedLayer>, Vec<WorkerGuard>)> {
    let mut layers = Vec::with_capacity(config.targets.len());
    let mut guards = Vec::new();

    for target in &config.targets {
        match target {
            LogTarget::Console { level } => {
                let layer = fmt_layer(config.format, config.include_location, true, std::io::stderr);
                layers.push(with_level(layer, *level));
            }
            LogTarget::File {
                directory,
                prefix,
                level,
                rotation,
            } => {
                let appender = RollingFileAppender::builder()
                    .rotation(to_rotation(*rotation))
                    .filename_prefix(prefix)
                    .build(directory)
                    .with_context(|| format!("Failed to open log directory {}", directory))?;
                let (writer, guard) = tracing_appender::non_blocking(appender);
                guards.push(guard);

                let layer = fmt_layer(config.format, config.include_location, false, writer);
                layers.push(with_level(layer, *level));
            }
        }
    }

    Ok((layers, guards))
}

/// Initialize simple tracing for basic console output
pub fn init_simple_tracing(log_level: &str) -> Result<()> {
    let env_filter = EnvFilter::try_new(log_level)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_err()
    {
        tracing::debug!("Global tracing subscriber already initialized, skipping");
    }

    Ok(())
}

fn fmt_layer<W>(format: LogFormat, include_location: bool, ansi: bool, writer: W) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(writer)
            .with_file(include_location)
            .with_line_number(include_location)
            .boxed(),
        LogFormat::Text => fmt::layer()
            .with_writer(writer)
            .with_ansi(ansi)
            .with_file(include_location)
            .with_line_number(include_location)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_writer(writer)
            .with_ansi(ansi)
            .with_file(include_location)
            .with_line_number(include_location)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_writer(writer)
            .with_ansi(ansi)
            .with_file(include_location)
            .with_line_number(include_location)
            .boxed(),
    }
}

fn with_level(layer: BoxedLayer, level: Option<LogLevel>) -> BoxedLayer {
    match level {
        Some(level) => layer.with_filter(to_level_filter(level)).boxed(),
        None => layer,
    }
}

fn to_level_filter(level: LogLevel) -> LevelFilter {
    match level {
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Trace => LevelFilter::TRACE,
    }
}

fn to_rotation(rotation: LogRotation) -> Rotation {
    match rotation {
        LogRotation::Hourly => Rotation::HOURLY,
        LogRotation::Daily => Rotation::DAILY,
        LogRotation::Never => Rotation::NEVER,
    }
}
