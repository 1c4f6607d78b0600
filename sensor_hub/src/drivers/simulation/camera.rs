//! Simulated camera implementation.

use serde::{Deserialize, Serialize};
use sensor_common::capture::{CaptureDevice, CaptureError};
use sensor_common::frame::{BYTES_PER_PIXEL, Frame, Resolution};
use std::time::Duration;
use tracing::{debug, info};

fn default_devices() -> Vec<u32> {
    vec![0]
}

/// Driver table `[driver_config.simulation]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationOptions {
    /// Device ids that can be opened.
    #[serde(default = "default_devices")]
    pub devices: Vec<u32>,

    /// Report a read failure after this many frames.
    #[serde(default)]
    pub fail_after_frames: Option<u64>,

    /// Simulated per-read latency in milliseconds.
    #[serde(default)]
    pub read_latency_ms: u64,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            devices: default_devices(),
            fail_after_frames: None,
            read_latency_ms: 0,
        }
    }
}

/// Synthetic camera producing a moving gradient.
pub struct SimulatedCamera {
    options: SimulationOptions,
    resolution: Option<Resolution>,
    device_id: Option<u32>,
    frames: u64,
}

impl SimulatedCamera {
    pub fn new() -> Self {
        Self::with_options(SimulationOptions::default())
    }

    pub fn with_options(options: SimulationOptions) -> Self {
        Self {
            options,
            resolution: None,
            device_id: None,
            frames: 0,
        }
    }

    pub fn options(&self) -> &SimulationOptions {
        &self.options
    }

    fn render_pattern(resolution: Resolution, sequence: u64) -> Frame {
        let shift = sequence as u32;
        let mut pixels = Vec::with_capacity(resolution.pixel_count() * BYTES_PER_PIXEL);
        for y in 0..resolution.height {
            for x in 0..resolution.width {
                pixels.push(x.wrapping_add(shift) as u8);
                pixels.push(y.wrapping_add(shift) as u8);
                pixels.push((x ^ y) as u8);
            }
        }
        // Length matches by construction.
        Frame::from_pixels(resolution, pixels, sequence)
            .unwrap_or_else(|| Frame::placeholder(resolution))
    }
}

impl Default for SimulatedCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureDevice for SimulatedCamera {
    fn name(&self) -> &'static str {
        super::DRIVER_NAME
    }

    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    fn configure(&mut self, table: &toml::Table) -> Result<(), CaptureError> {
        self.options = toml::Value::Table(table.clone())
            .try_into()
            .map_err(|e: toml::de::Error| CaptureError::ConfigError(e.to_string()))?;
        debug!("Simulation options: {:?}", self.options);
        Ok(())
    }

    fn open(&mut self, device_id: u32, resolution: Resolution) -> Result<(), CaptureError> {
        if self.device_id.is_some() {
            // Reopening releases the previous session first.
            self.release()?;
        }
        if !self.options.devices.contains(&device_id) {
            return Err(CaptureError::OpenFailed {
                device_id,
                reason: format!("no simulated device (available: {:?})", self.options.devices),
            });
        }
        self.device_id = Some(device_id);
        self.resolution = Some(resolution);
        self.frames = 0;
        info!("Simulated camera {} opened at {}", device_id, resolution);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.device_id.is_some()
    }

    fn read_frame(&mut self) -> Result<Frame, CaptureError> {
        let resolution = self.resolution.ok_or(CaptureError::NotOpen)?;
        if let Some(limit) = self.options.fail_after_frames {
            if self.frames >= limit {
                return Err(CaptureError::ReadFailed(format!(
                    "simulated failure after {limit} frames"
                )));
            }
        }
        if self.options.read_latency_ms > 0 {
            std::thread::sleep(Duration::from_millis(self.options.read_latency_ms));
        }
        self.frames += 1;
        Ok(Self::render_pattern(resolution, self.frames))
    }

    fn release(&mut self) -> Result<(), CaptureError> {
        if let Some(device_id) = self.device_id.take() {
            debug!("Simulated camera {} released after {} frames", device_id, self.frames);
        }
        self.resolution = None;
        Ok(())
    }
}
