//! Hub error types.
//!
//! Only startup paths return these. Faults inside producer loops are
//! logged and escalate through the shutdown signal instead.

use sensor_common::capture::CaptureError;
use sensor_common::config::ConfigError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HubError {
    /// Configuration file missing, malformed or invalid.
    #[error("Startup configuration error: {0}")]
    StartupConfig(#[from] ConfigError),

    /// Capture backend could not be created or configured.
    #[error(transparent)]
    Capture(#[from] CaptureError),

    /// A worker thread could not be created.
    #[error("Failed to start {name} thread: {source}")]
    Spawn {
        name: String,
        #[source]
        source: io::Error,
    },

    /// Error log or subscriber setup failed.
    #[error("Failed to initialize logging: {0}")]
    Logging(String),

    /// Ctrl-C handler could not be installed.
    #[error("Failed to install signal handler: {0}")]
    SignalHandler(String),
}

impl HubError {
    pub fn spawn(name: impl Into<String>, source: io::Error) -> Self {
        Self::Spawn {
            name: name.into(),
            source,
        }
    }
}
