//! Tracing setup.
//!
//! Two layers: a console layer filtered by `RUST_LOG` plus the configured
//! base level, and a file layer appending `ERROR` events to the error log.

use crate::error::HubError;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Logging options resolved from CLI and configuration.
#[derive(Debug, Clone)]
pub struct LogOptions {
    /// Base console level.
    pub level: LevelFilter,
    /// Emit console logs as JSON.
    pub json: bool,
    /// Append-only error log file.
    pub error_log: PathBuf,
}

/// Create the error log (and its directory) and install the global subscriber.
///
/// # Errors
/// Returns `HubError::Logging` if the file cannot be opened or a global
/// subscriber is already installed.
pub fn init_tracing(options: &LogOptions) -> Result<(), HubError> {
    if let Some(dir) = options.error_log.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir).map_err(|e| {
                HubError::Logging(format!("cannot create {}: {}", dir.display(), e))
            })?;
        }
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&options.error_log)
        .map_err(|e| {
            HubError::Logging(format!("cannot open {}: {}", options.error_log.display(), e))
        })?;

    let error_layer = fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(file))
        .with_filter(LevelFilter::ERROR);

    let filter = EnvFilter::from_default_env().add_directive(options.level.into());
    let registry = tracing_subscriber::registry().with(error_layer);

    let result = if options.json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(io::stderr)
                    .with_filter(filter),
            )
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_thread_names(true)
                    .with_writer(io::stderr)
                    .with_filter(filter),
            )
            .try_init()
    };
    result.map_err(|e| HubError::Logging(e.to_string()))
}
