//! Capture driver implementations.
//!
//! - [`simulation`] - Synthetic test-pattern camera for development and testing
//!
//! # Adding New Drivers
//!
//! 1. Create a new submodule under `drivers/`
//! 2. Implement the `CaptureDevice` trait from `sensor_common::capture`
//! 3. Register the driver in [`register_all_drivers`]

pub mod simulation;

use crate::driver_registry::CaptureRegistry;

/// Register all built-in capture drivers.
pub fn register_all_drivers(registry: &mut CaptureRegistry) {
    registry.register(simulation::DRIVER_NAME, simulation::create_driver);
}

/// Registry pre-populated with all built-in drivers.
pub fn builtin_registry() -> CaptureRegistry {
    let mut registry = CaptureRegistry::new();
    register_all_drivers(&mut registry);
    registry
}
