//! Paced frame producer.
//!
//! Specialisation of the producer loop for capture devices. Each cycle
//! checks that the device is still open, reads one frame, publishes it and
//! sleeps for whatever is left of the frame period. Any capture failure is
//! fatal: it is logged, the shutdown signal is set and the loop stops.
//!
//! The device is owned by the capture thread while it runs and handed back
//! through [`FrameProducerHandle::stop`] for release.

use crate::mailbox::LatestValueMailbox;
use crate::shutdown::{ShutdownReason, ShutdownSignal};
use sensor_common::capture::{CaptureDevice, CaptureError};
use sensor_common::frame::{Frame, Resolution};
use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, mpsc};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Poll interval used while waiting for the capture thread to finish.
const JOIN_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// What to open and how fast to read it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSettings {
    pub device_id: u32,
    pub resolution: Resolution,
    /// Target frames per second (> 0).
    pub fps: u32,
}

impl CaptureSettings {
    /// Target interval between captures.
    pub fn frame_period(&self) -> Duration {
        Duration::from_secs(1) / self.fps.max(1)
    }
}

/// Elapsed-time based pacing.
///
/// The delay before the next capture is the frame period minus the time
/// spent since the last capture was recorded, never negative.
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    period: Duration,
    last_capture: Instant,
}

impl Pacer {
    pub fn new(period: Duration, now: Instant) -> Self {
        Self {
            period,
            last_capture: now,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Time spent since the last recorded capture.
    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_capture)
    }

    /// `max(0, period - elapsed)`.
    pub fn delay(&self, now: Instant) -> Duration {
        self.period.saturating_sub(self.elapsed(now))
    }

    pub fn mark(&mut self, now: Instant) {
        self.last_capture = now;
    }
}

/// Capture loop statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frames read and published.
    pub frames: u64,
    /// Cycles whose capture took longer than the frame period.
    pub overruns: u64,
    /// Longest observed capture, in microseconds.
    pub max_capture_time_us: u64,
}

impl FrameStats {
    fn record(&mut self, capture_time: Duration, period: Duration) {
        self.frames += 1;
        let us = capture_time.as_micros() as u64;
        if us > self.max_capture_time_us {
            self.max_capture_time_us = us;
        }
        if capture_time > period {
            self.overruns += 1;
            if self.overruns <= 10 || self.overruns % 1000 == 0 {
                warn!(
                    "Capture overrun #{}: took {}us (period {}us)",
                    self.overruns,
                    us,
                    period.as_micros()
                );
            }
        }
    }
}

/// Capture loop publishing frames at a target rate.
pub struct PacedFrameProducer {
    device: Box<dyn CaptureDevice>,
    settings: CaptureSettings,
    mailbox: Arc<LatestValueMailbox<Frame>>,
    shutdown: ShutdownSignal,
}

impl PacedFrameProducer {
    pub fn new(
        device: Box<dyn CaptureDevice>,
        settings: CaptureSettings,
        mailbox: Arc<LatestValueMailbox<Frame>>,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            device,
            settings,
            mailbox,
            shutdown,
        }
    }

    /// Open the device and start the capture thread.
    ///
    /// An open failure is fatal: it is logged, the shutdown signal is set
    /// and no cycle runs. The returned handle still owns the device so it
    /// can be released during teardown.
    ///
    /// # Errors
    /// Returns the OS error if the capture thread cannot be created. The
    /// device is released and the shutdown signal set before returning.
    pub fn start(self) -> io::Result<FrameProducerHandle> {
        self.start_on(thread::Builder::new().name("producer-camera".to_string()))
    }

    /// [`start`](Self::start) on a caller-supplied thread builder.
    ///
    /// The thread is created before the device is opened, so a spawn
    /// failure never leaves an open device behind.
    pub fn start_on(mut self, builder: thread::Builder) -> io::Result<FrameProducerHandle> {
        let (tx, rx) = mpsc::channel::<PacedFrameProducer>();
        let thread = match builder.spawn(move || rx.recv().ok().map(Self::run)) {
            Ok(thread) => thread,
            Err(e) => {
                error!("Failed to start capture thread: {}", e);
                self.shutdown.set_with(ShutdownReason::DeviceUnavailable);
                if let Err(e) = self.device.release() {
                    error!("Deletion error: {}", e);
                }
                return Err(e);
            }
        };

        let CaptureSettings {
            device_id,
            resolution,
            fps,
        } = self.settings;

        if let Err(e) = self.device.open(device_id, resolution) {
            error!("Camera not found or disconnected! {}", e);
            self.shutdown.set_with(ShutdownReason::DeviceUnavailable);
            // Dropping `tx` lets the idle thread exit.
            return Ok(FrameProducerHandle::idle(self.device));
        }
        info!(
            "Opened {} camera {} at {} ({} fps)",
            self.device.name(),
            device_id,
            resolution,
            fps
        );

        match tx.send(self) {
            Ok(()) => Ok(FrameProducerHandle {
                inner: HandleInner::Running(thread),
            }),
            Err(mpsc::SendError(producer)) => {
                error!("Capture thread exited before the loop started");
                producer.shutdown.set_with(ShutdownReason::DeviceUnavailable);
                Ok(FrameProducerHandle::idle(producer.device))
            }
        }
    }

    /// Execute capture cycles on the calling thread until shutdown or fault.
    ///
    /// The device must already be open. A panic inside the device is
    /// treated like a read failure so the device is still handed back.
    pub fn run(mut self) -> (Box<dyn CaptureDevice>, FrameStats) {
        let period = self.settings.frame_period();
        let mut pacer = Pacer::new(period, Instant::now());
        let mut stats = FrameStats::default();

        while !self.shutdown.is_set() {
            let cycle = panic::catch_unwind(AssertUnwindSafe(|| {
                self.capture_once(&mut stats, period)
            }));
            let failure = match cycle {
                Ok(Ok(())) => None,
                Ok(Err((e, reason))) => Some((e.to_string(), reason)),
                Err(payload) => Some((
                    format!("capture panicked: {}", panic_message(payload.as_ref())),
                    ShutdownReason::FrameReadFailure,
                )),
            };
            if let Some((message, reason)) = failure {
                error!("Exception occurred while reading frame: {}", message);
                self.shutdown.set_with(reason);
                break;
            }

            if self.shutdown.sleep(pacer.delay(Instant::now())) {
                break;
            }
            pacer.mark(Instant::now());
        }

        info!(
            "Capture loop stopped after {} frames (overruns: {}, max capture {}us)",
            stats.frames, stats.overruns, stats.max_capture_time_us
        );
        (self.device, stats)
    }

    fn capture_once(
        &mut self,
        stats: &mut FrameStats,
        period: Duration,
    ) -> Result<(), (CaptureError, ShutdownReason)> {
        if !self.device.is_open() {
            return Err((CaptureError::NotOpen, ShutdownReason::DeviceUnavailable));
        }

        let started = Instant::now();
        let frame = self
            .device
            .read_frame()
            .map_err(|e| (e, ShutdownReason::FrameReadFailure))?;
        stats.record(started.elapsed(), period);

        debug!("Captured frame #{}", frame.sequence());
        self.mailbox.publish(frame);
        Ok(())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}

enum HandleInner {
    Running(JoinHandle<Option<(Box<dyn CaptureDevice>, FrameStats)>>),
    Idle(Box<dyn CaptureDevice>),
}

/// Handle to the capture loop and, ultimately, the device it owns.
pub struct FrameProducerHandle {
    inner: HandleInner,
}

impl FrameProducerHandle {
    /// Handle for a device whose loop never started.
    pub fn idle(device: Box<dyn CaptureDevice>) -> Self {
        Self {
            inner: HandleInner::Idle(device),
        }
    }

    /// Whether a capture thread was started and is still running.
    pub fn is_running(&self) -> bool {
        match &self.inner {
            HandleInner::Running(thread) => !thread.is_finished(),
            HandleInner::Idle(_) => false,
        }
    }

    /// Wait up to `timeout` for the capture loop to finish and take the
    /// device back.
    ///
    /// The caller must have set the shutdown signal. Returns `None` if the
    /// thread is still running at the deadline (it is detached together
    /// with the device) or if it panicked.
    pub fn stop(self, timeout: Duration) -> Option<(Box<dyn CaptureDevice>, FrameStats)> {
        let thread = match self.inner {
            HandleInner::Idle(device) => return Some((device, FrameStats::default())),
            HandleInner::Running(thread) => thread,
        };

        let deadline = Instant::now() + timeout;
        while !thread.is_finished() {
            if Instant::now() >= deadline {
                warn!("Capture loop did not stop within {:?}; detaching", timeout);
                return None;
            }
            thread::sleep(JOIN_POLL_INTERVAL);
        }
        match thread.join() {
            Ok(result) => result,
            Err(_) => {
                error!("Capture loop panicked; device cannot be released");
                None
            }
        }
    }
}
