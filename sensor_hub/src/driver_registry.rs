//! Capture driver registry.
//!
//! Provides a `CaptureRegistry` struct for registering and retrieving
//! capture backend factories. Constructed at startup and passed by
//! reference, so it is testable in isolation.

use sensor_common::capture::{CaptureDevice, CaptureError, CaptureFactory};
use std::collections::HashMap;

/// Registry of available capture backends.
pub struct CaptureRegistry {
    factories: HashMap<&'static str, CaptureFactory>,
}

impl CaptureRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a backend factory.
    ///
    /// # Panics
    /// Panics if a backend with the same name is already registered.
    pub fn register(&mut self, name: &'static str, factory: CaptureFactory) {
        if self.factories.contains_key(name) {
            panic!("Capture driver '{name}' is already registered");
        }
        self.factories.insert(name, factory);
    }

    /// Get a backend factory by name.
    pub fn get_factory(&self, name: &str) -> Option<CaptureFactory> {
        self.factories.get(name).copied()
    }

    /// Create a device instance by backend name.
    ///
    /// # Errors
    /// Returns `CaptureError::DriverNotFound` if no backend with the given
    /// name is registered.
    pub fn create_device(&self, name: &str) -> Result<Box<dyn CaptureDevice>, CaptureError> {
        let factory = self
            .get_factory(name)
            .ok_or_else(|| CaptureError::DriverNotFound(name.to_string()))?;
        Ok(factory())
    }

    /// List all registered backend names, sorted.
    pub fn list_drivers(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for CaptureRegistry {
    fn default() -> Self {
        Self::new()
    }
}
