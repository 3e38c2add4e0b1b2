//! Logging initialisation for loadpulse
//!
//! Builds a `tracing` subscriber from the `logging` configuration domain:
//! an `EnvFilter` plus one fmt layer per configured target (console or
//! rolling file).

pub mod init;

pub use init::{build_layers, init_logging_from_config, init_simple_tracing, LoggingGuard};
