//! Prelude module for common re-exports.
//!
//! ```rust
//! use sensor_common::prelude::*;
//! ```

use std::time::Duration;

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, SharedConfig};

// ─── Constants ──────────────────────────────────────────────────────
pub use crate::consts::{DEFAULT_DRIVER, DEFAULT_MAILBOX_CAPACITY};

// ─── Frames ─────────────────────────────────────────────────────────
pub use crate::frame::{Frame, Label, LabelPosition, Resolution, ResolutionParseError, Rgb};

// ─── Collaborators ──────────────────────────────────────────────────
pub use crate::capture::{CaptureDevice, CaptureError, CaptureFactory};
pub use crate::render::{Overlay, RenderError, Renderer};

/// Default producer join timeout as Duration.
pub const DEFAULT_JOIN_TIMEOUT: Duration =
    Duration::from_millis(crate::consts::DEFAULT_JOIN_TIMEOUT_MS);
