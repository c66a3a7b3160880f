//! Shared utilities for salty: configuration, logging, error types.
//!
//! This crate provides common infrastructure used across all salty components.

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod helpers;

pub use config::{ClientConfig, LogConfig};
pub use error::{Error, Result};

/// Initialize tracing from an explicit logging configuration.
///
/// `RUST_LOG` still takes precedence over `config.level` when set.
pub fn init_tracing(config: &LogConfig) {
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.with_target)
        .init();
}
