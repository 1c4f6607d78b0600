//! Capture device trait and error types.
//!
//! This module defines:
//! - `CaptureDevice` trait - Interface for pluggable frame sources
//! - `CaptureError` enum - Error types for capture operations
//! - `CaptureFactory` type alias - Factory function type

use crate::frame::{Frame, Resolution};
use thiserror::Error;

/// Error types for capture operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    /// The device could not be opened.
    #[error("Camera {device_id} could not be opened: {reason}")]
    OpenFailed {
        /// Requested device identifier.
        device_id: u32,
        /// Backend-specific reason.
        reason: String,
    },

    /// The device is not (or no longer) open.
    #[error("Camera not found or disconnected")]
    NotOpen,

    /// A frame read failed.
    #[error("Failed to read frame: {0}")]
    ReadFailed(String),

    /// Releasing the device failed.
    #[error("Failed to release camera: {0}")]
    ReleaseFailed(String),

    /// Backend configuration is invalid.
    #[error("Capture configuration error: {0}")]
    ConfigError(String),

    /// No backend registered under the requested name.
    #[error("Capture driver not found: {0}")]
    DriverNotFound(String),
}

/// Factory function type for creating capture device instances.
pub type CaptureFactory = fn() -> Box<dyn CaptureDevice>;

/// Trait defining the interface for capture backends.
///
/// # Lifecycle
///
/// 1. `configure()` - Optional, before `open()`
/// 2. `open()` - Once, before the capture loop starts
/// 3. `is_open()` / `read_frame()` - Every capture cycle
/// 4. `release()` - Once, during teardown
///
/// A device is owned by exactly one capture loop at a time, so the trait
/// only requires `Send`.
pub trait CaptureDevice: Send {
    /// Returns the backend's unique identifier (e.g., "simulation").
    fn name(&self) -> &'static str;

    /// Returns the backend's semantic version.
    fn version(&self) -> &'static str;

    /// Apply the backend's table from the hub configuration.
    ///
    /// Default implementation ignores the table.
    fn configure(&mut self, _table: &toml::Table) -> Result<(), CaptureError> {
        Ok(())
    }

    /// Open the device and request the given resolution.
    ///
    /// # Errors
    /// Return `CaptureError::OpenFailed` if the device is unavailable.
    fn open(&mut self, device_id: u32, resolution: Resolution) -> Result<(), CaptureError>;

    /// Whether the device currently reports itself open.
    fn is_open(&self) -> bool;

    /// Read one frame. May block for up to one frame interval.
    fn read_frame(&mut self) -> Result<Frame, CaptureError>;

    /// Release the device. Releasing a closed device is a no-op.
    fn release(&mut self) -> Result<(), CaptureError>;
}
