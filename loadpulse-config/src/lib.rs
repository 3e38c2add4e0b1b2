//! Domain-driven configuration management for loadpulse
//!
//! Configuration is split by functional domain (target, http, load, stress,
//! logging, output), with validation, defaults, and environment variable
//! overrides.

pub mod error;
pub mod loader;
pub mod validation;

// Domain-specific configuration modules
pub mod domains;

// Re-export main types
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use validation::Validatable;

// Re-export domain configurations
pub use domains::{
    http::HttpConfig,
    load::LoadTestConfig,
    logging::{LogFormat, LogLevel, LogRotation, LogTarget, LoggingConfig},
    output::{OutputConfig, SummaryFormat},
    stress::StressTestConfig,
    target::{TargetConfig, TargetSettings},
    LoadPulseConfig,
};

// Re-export utilities
pub use domains::utils::{serde_duration, serde_millis};
