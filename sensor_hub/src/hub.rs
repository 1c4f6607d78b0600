//! Hub assembly.
//!
//! Wires one capture device, the configured counter sensors and a renderer
//! into a compositor run sharing a single shutdown signal:
//!
//! ```text
//!   start camera ─▶ Session ─▶ spawn counters ─▶ compositor.run() ─▶ join counters
//! ```
//!
//! The session is created before any counter thread so a failure while
//! spawning still releases the device and the renderer.

use crate::camera::{CaptureSettings, PacedFrameProducer};
use crate::compositor::{CompositorReport, LabelLayout, SampleCompositor, Session};
use crate::config::HubConfig;
use crate::driver_registry::CaptureRegistry;
use crate::error::HubError;
use crate::mailbox::{LatestValueMailbox, MailboxReader};
use crate::producer::{Counter, PeriodicProducer, ProducerHandle};
use crate::shutdown::ShutdownSignal;
use sensor_common::capture::CaptureDevice;
use sensor_common::frame::Frame;
use sensor_common::render::{Overlay, Renderer};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Final value of one counter sensor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterReport {
    pub name: String,
    /// `None` if the producer did not exit within the join timeout.
    pub value: Option<u64>,
}

/// Summary of a complete hub run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubReport {
    pub compositor: CompositorReport,
    pub counters: Vec<CounterReport>,
}

/// Configured but not yet running hub.
pub struct SensorHub {
    config: HubConfig,
    settings: CaptureSettings,
    shutdown: ShutdownSignal,
}

impl SensorHub {
    pub fn new(config: HubConfig, settings: CaptureSettings) -> Self {
        Self {
            config,
            settings,
            shutdown: ShutdownSignal::new(),
        }
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    pub fn settings(&self) -> &CaptureSettings {
        &self.settings
    }

    /// Signal shared by every participant of the run.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Instantiate `driver` and apply its `[driver_config.<name>]` table.
    ///
    /// # Errors
    /// Unknown driver or rejected driver configuration.
    pub fn create_device(
        &self,
        registry: &CaptureRegistry,
        driver: &str,
    ) -> Result<Box<dyn CaptureDevice>, HubError> {
        let mut device = registry.create_device(driver).inspect_err(|_| {
            warn!("Available capture drivers: {:?}", registry.list_drivers());
        })?;
        if let Some(table) = self.config.driver_table(driver) {
            device.configure(table)?;
        }
        info!("Using {} capture driver v{}", device.name(), device.version());
        Ok(device)
    }

    /// Run until shutdown and release everything.
    ///
    /// Returns once the compositor has terminated and every counter has
    /// been joined or detached.
    ///
    /// # Errors
    /// Only thread creation failures. Device and render faults end the run
    /// through the shutdown signal and are reported in [`HubReport`].
    pub fn run<R, O>(
        &self,
        device: Box<dyn CaptureDevice>,
        renderer: R,
        overlay: O,
    ) -> Result<HubReport, HubError>
    where
        R: Renderer,
        O: Overlay,
    {
        let capacity = self.config.mailbox_capacity;
        let join_timeout = self.config.join_timeout();

        let frames = Arc::new(LatestValueMailbox::new(capacity));
        let capture = PacedFrameProducer::new(
            device,
            self.settings,
            Arc::clone(&frames),
            self.shutdown.clone(),
        )
        .start()
        .map_err(|e| HubError::spawn("camera", e))?;

        let session = Session::new(renderer, capture, self.shutdown.clone(), join_timeout);
        let mut compositor = SampleCompositor::new(
            MailboxReader::new(frames, Frame::placeholder(self.settings.resolution)),
            session,
            overlay,
            LabelLayout::from(self.config.overlay),
            self.shutdown.clone(),
        );

        let mut handles: Vec<ProducerHandle<Counter>> =
            Vec::with_capacity(self.config.sensors.len());
        for sensor in &self.config.sensors {
            let mailbox = Arc::new(LatestValueMailbox::new(capacity));
            let producer = PeriodicProducer::new(
                sensor.name.clone(),
                Counter::new(),
                sensor.period(),
                Arc::clone(&mailbox),
                self.shutdown.clone(),
            );
            match producer.spawn() {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    // Compositor drop releases the session.
                    self.shutdown.set();
                    for handle in handles {
                        handle.join_within(join_timeout);
                    }
                    return Err(HubError::spawn(sensor.name.clone(), e));
                }
            }
            compositor.add_sensor(sensor.name.clone(), MailboxReader::new(mailbox, 0u64));
            debug!("Sensor '{}' started ({:?})", sensor.name, sensor.period());
        }

        let report = compositor.run();

        let counters = handles
            .into_iter()
            .map(|handle| {
                let name = handle.name().to_string();
                let value = handle.join_within(join_timeout).map(|c| c.value());
                if value.is_none() {
                    warn!("Sensor '{}' did not report a final value", name);
                }
                CounterReport { name, value }
            })
            .collect();

        Ok(HubReport {
            compositor: report,
            counters,
        })
    }
}
