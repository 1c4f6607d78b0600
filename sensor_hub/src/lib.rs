//! # Sensor Hub Library
//!
//! Samples several independently paced sources on background threads and
//! composes their freshest values into one foreground view.
//!
//! # Module Structure
//!
//! - [`mailbox`] - Bounded latest-value mailbox and its reader
//! - [`shutdown`] - Process-wide stop signal with interruptible sleep
//! - [`producer`] - Periodic producer loops and synthetic counters
//! - [`camera`] - Paced frame producer driving a capture device
//! - [`compositor`] - Foreground loop, label layout and teardown session
//! - [`hub`] - Assembly of one complete run
//! - [`driver_registry`] / [`drivers`] - Capture backend factories
//! - [`render`] - Console renderer and label overlay
//! - [`config`] / [`logging`] / [`error`] - Ambient setup
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────┐  publish  ┌──────────────┐
//! │ producer-cam  │──────────►│ Mailbox<Frame>│──┐
//! └───────────────┘           └──────────────┘  │ try_take_or
//! ┌───────────────┐  publish  ┌──────────────┐  ▼
//! │ producer-N    │──────────►│ Mailbox<u64> │──►┌──────────────────┐   show   ┌──────────┐
//! └───────────────┘           └──────────────┘   │ SampleCompositor │─────────►│ Renderer │
//!         ▲                                      └────────┬─────────┘          └──────────┘
//!         │             ShutdownSignal (shared)           │
//!         └───────────────────────────────────────────────┘
//! ```

pub mod camera;
pub mod compositor;
pub mod config;
pub mod driver_registry;
pub mod drivers;
pub mod error;
pub mod hub;
pub mod logging;
pub mod mailbox;
pub mod producer;
pub mod render;
pub mod shutdown;

// Re-export key types for convenience
pub use crate::camera::{CaptureSettings, FrameProducerHandle, FrameStats, PacedFrameProducer};
pub use crate::compositor::{CompositorReport, LabelLayout, SampleCompositor, Session};
pub use crate::config::HubConfig;
pub use crate::driver_registry::CaptureRegistry;
pub use crate::error::HubError;
pub use crate::hub::{HubReport, SensorHub};
pub use crate::mailbox::{LatestValueMailbox, MailboxReader};
pub use crate::producer::{Counter, PeriodicProducer, ProducerHandle, SampleSource};
pub use crate::shutdown::{ShutdownReason, ShutdownSignal};
