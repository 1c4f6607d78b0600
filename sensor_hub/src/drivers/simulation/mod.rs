//! Simulation capture driver.
//!
//! Produces a moving gradient test pattern without physical hardware.
//! Fault injection (`fail_after_frames`, unavailable device ids) lets the
//! shutdown paths be exercised end-to-end.

mod camera;

pub use camera::{SimulatedCamera, SimulationOptions};

use sensor_common::capture::CaptureDevice;

/// Registry name of the simulation driver.
pub const DRIVER_NAME: &str = "simulation";

/// Factory function to create a simulation camera instance.
pub fn create_driver() -> Box<dyn CaptureDevice> {
    Box::new(SimulatedCamera::new())
}
