//! Workspace-wide defaults.
//!
//! Single source of truth for limits, default periods and paths.

/// Default mailbox depth (entries retained per source).
pub const DEFAULT_MAILBOX_CAPACITY: usize = 2;

/// Default sampling periods of the built-in counter sensors, in milliseconds.
pub const DEFAULT_SENSOR_PERIODS_MS: [u64; 3] = [10, 100, 1000];

/// Default time granted to producer threads to exit after shutdown.
pub const DEFAULT_JOIN_TIMEOUT_MS: u64 = 500;

/// Default capture backend.
pub const DEFAULT_DRIVER: &str = "simulation";

/// Default service name used in logs.
pub const DEFAULT_SERVICE_NAME: &str = "sensor-hub";

/// Default directory of the error log.
pub const DEFAULT_LOG_DIR: &str = "log";

/// Default error log file name.
pub const DEFAULT_ERROR_LOG_FILE: &str = "sensor.log";

/// Title of the composed view.
pub const VIEW_TITLE: &str = "Sensor Data";

/// Horizontal distance of overlay labels from the right edge, in pixels.
pub const DEFAULT_LABEL_RIGHT_MARGIN: u32 = 250;

/// Vertical distance of the first overlay label from the bottom edge, in pixels.
pub const DEFAULT_LABEL_BOTTOM_MARGIN: u32 = 60;

/// Vertical spacing between stacked overlay labels, in pixels.
pub const DEFAULT_LABEL_LINE_SPACING: u32 = 30;

/// Largest accepted frame dimension.
pub const MAX_FRAME_DIMENSION: u32 = 8192;
