//! Foreground compositor loop and teardown session.
//!
//! ```text
//!   Running ──(signal set | user quit | render fault)──▶ Stopping ──(release)──▶ Terminated
//! ```
//!
//! Every tick drains each mailbox without blocking, falling back to the
//! last-known value, draws one label per sensor onto the freshest frame and
//! hands the view to the renderer. The [`Session`] owns the renderer and the
//! capture handle and releases both exactly once, on every exit path.

use crate::camera::{FrameProducerHandle, FrameStats};
use crate::config::OverlayConfig;
use crate::mailbox::{MailboxReader, SampleText};
use crate::shutdown::{ShutdownReason, ShutdownSignal};
use sensor_common::frame::{Frame, LabelPosition, Resolution};
use sensor_common::render::{Overlay, Renderer};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Placement of stacked sensor labels.
///
/// The first label sits `right_margin` from the right edge and
/// `bottom_margin` from the bottom; each following label is
/// `line_spacing` higher. Positions saturate at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelLayout {
    pub right_margin: u32,
    pub bottom_margin: u32,
    pub line_spacing: u32,
}

impl LabelLayout {
    pub fn position(&self, resolution: Resolution, index: usize) -> LabelPosition {
        let step = self
            .line_spacing
            .saturating_mul(u32::try_from(index).unwrap_or(u32::MAX));
        LabelPosition {
            x: resolution.width.saturating_sub(self.right_margin),
            y: resolution
                .height
                .saturating_sub(self.bottom_margin)
                .saturating_sub(step),
        }
    }
}

impl Default for LabelLayout {
    fn default() -> Self {
        OverlayConfig::default().into()
    }
}

impl From<OverlayConfig> for LabelLayout {
    fn from(config: OverlayConfig) -> Self {
        Self {
            right_margin: config.right_margin,
            bottom_margin: config.bottom_margin,
            line_spacing: config.line_spacing,
        }
    }
}

/// Outcome of releasing the session's collaborators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReleaseReport {
    /// Capture loop statistics, if the device was recovered.
    pub frame_stats: Option<FrameStats>,
    /// Release/close failures (logged, never raised).
    pub errors: u32,
}

/// Owner of the renderer and capture handle for one compositor run.
///
/// Dropping the session releases anything not yet released, so panics in
/// the foreground loop still close the device and the output.
pub struct Session<R: Renderer> {
    renderer: Option<R>,
    capture: Option<FrameProducerHandle>,
    shutdown: ShutdownSignal,
    join_timeout: Duration,
}

impl<R: Renderer> Session<R> {
    pub fn new(
        renderer: R,
        capture: FrameProducerHandle,
        shutdown: ShutdownSignal,
        join_timeout: Duration,
    ) -> Self {
        Self {
            renderer: Some(renderer),
            capture: Some(capture),
            shutdown,
            join_timeout,
        }
    }

    pub fn renderer_mut(&mut self) -> Option<&mut R> {
        self.renderer.as_mut()
    }

    pub fn is_released(&self) -> bool {
        self.renderer.is_none() && self.capture.is_none()
    }

    /// Stop the capture loop, release the device and close the renderer.
    ///
    /// Idempotent: later calls find nothing left to release.
    pub fn release(&mut self) -> ReleaseReport {
        let mut report = ReleaseReport::default();
        if self.is_released() {
            return report;
        }
        self.shutdown.set();

        if let Some(handle) = self.capture.take() {
            match handle.stop(self.join_timeout) {
                Some((mut device, stats)) => {
                    report.frame_stats = Some(stats);
                    match device.release() {
                        Ok(()) => info!("Released {} camera", device.name()),
                        Err(e) => {
                            error!("Deletion error: {}", e);
                            report.errors += 1;
                        }
                    }
                }
                None => {
                    error!("Deletion error: capture loop still owns the device");
                    report.errors += 1;
                }
            }
        }

        if let Some(mut renderer) = self.renderer.take() {
            if let Err(e) = renderer.close() {
                error!("Deletion error: {}", e);
                report.errors += 1;
            }
        }

        report
    }
}

impl<R: Renderer> Drop for Session<R> {
    fn drop(&mut self) {
        if !self.is_released() {
            warn!("Session dropped before release; releasing now");
            self.release();
        }
    }
}

/// Lifecycle of the foreground loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositorState {
    Running,
    Stopping,
    Terminated,
}

/// Summary of one compositor run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositorReport {
    /// Views handed to the renderer.
    pub ticks: u64,
    /// Reason recorded on the shutdown signal.
    pub reason: Option<ShutdownReason>,
    pub release: ReleaseReport,
}

struct SensorLabel {
    name: String,
    reader: Box<dyn SampleText>,
}

/// Foreground loop merging the freshest value of every source.
pub struct SampleCompositor<R: Renderer, O: Overlay> {
    frames: MailboxReader<Frame>,
    sensors: Vec<SensorLabel>,
    overlay: O,
    layout: LabelLayout,
    session: Session<R>,
    shutdown: ShutdownSignal,
    state: CompositorState,
    ticks: u64,
}

impl<R: Renderer, O: Overlay> SampleCompositor<R, O> {
    /// `frames` must be seeded with the placeholder shown until the first
    /// capture arrives.
    pub fn new(
        frames: MailboxReader<Frame>,
        session: Session<R>,
        overlay: O,
        layout: LabelLayout,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            frames,
            sensors: Vec::new(),
            overlay,
            layout,
            session,
            shutdown,
            state: CompositorState::Running,
            ticks: 0,
        }
    }

    /// Add a labelled source. Labels stack upwards in insertion order.
    pub fn add_sensor(&mut self, name: impl Into<String>, reader: impl SampleText + 'static) {
        self.sensors.push(SensorLabel {
            name: name.into(),
            reader: Box::new(reader),
        });
    }

    #[inline]
    pub fn state(&self) -> CompositorState {
        self.state
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Run until shutdown, then release every collaborator.
    pub fn run(&mut self) -> CompositorReport {
        info!("Compositor running with {} sensors", self.sensors.len());

        while self.state == CompositorState::Running {
            if self.shutdown.is_set() {
                self.state = CompositorState::Stopping;
                break;
            }
            self.tick();
        }

        info!(
            "Compositor stopping after {} ticks ({})",
            self.ticks,
            self.shutdown
                .reason()
                .map_or_else(|| "no reason".to_string(), |r| r.to_string())
        );
        let release = self.session.release();
        self.state = CompositorState::Terminated;

        CompositorReport {
            ticks: self.ticks,
            reason: self.shutdown.reason(),
            release,
        }
    }

    /// Compose and render one view.
    pub fn tick(&mut self) {
        let frame = self.frames.latest().clone();
        let view = self.compose(frame);

        let Some(renderer) = self.session.renderer_mut() else {
            self.stop(ShutdownReason::RenderFailure);
            return;
        };
        match renderer.show(&view) {
            Ok(false) => {}
            Ok(true) => {
                info!("Quit requested by user");
                self.stop(ShutdownReason::UserQuit);
            }
            Err(e) => {
                error!("Exception occurred: {}", e);
                self.stop(ShutdownReason::RenderFailure);
            }
        }
        self.ticks += 1;
    }

    /// Draw one `"<name>: <value>"` label per sensor onto `frame`.
    pub fn compose(&mut self, frame: Frame) -> Frame {
        let resolution = frame.resolution();
        let mut view = frame;
        for (idx, sensor) in self.sensors.iter_mut().enumerate() {
            let text = format!("{}: {}", sensor.name, sensor.reader.latest_text());
            view = self
                .overlay
                .draw_label(view, &text, self.layout.position(resolution, idx));
        }
        view
    }

    fn stop(&mut self, reason: ShutdownReason) {
        if !self.shutdown.set_with(reason) {
            debug!("Shutdown already requested ({:?})", self.shutdown.reason());
        }
        self.state = CompositorState::Stopping;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailbox::LatestValueMailbox;
    use crate::render::LabelOverlay;
    use sensor_common::capture::{CaptureDevice, CaptureError};
    use sensor_common::render::RenderError;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default, Clone)]
    struct Counts {
        shown: Arc<AtomicU32>,
        closed: Arc<AtomicU32>,
        released: Arc<AtomicU32>,
    }

    struct ScriptedRenderer {
        counts: Counts,
        quit_after: Option<u32>,
        fail: bool,
    }

    impl Renderer for ScriptedRenderer {
        fn show(&mut self, _frame: &Frame) -> Result<bool, RenderError> {
            if self.fail {
                return Err(RenderError::DisplayFailed("no display".to_string()));
            }
            let shown = self.counts.shown.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(self.quit_after.is_some_and(|n| shown >= n))
        }

        fn close(&mut self) -> Result<(), RenderError> {
            self.counts.closed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct IdleDevice {
        counts: Counts,
    }

    impl CaptureDevice for IdleDevice {
        fn name(&self) -> &'static str {
            "idle"
        }

        fn version(&self) -> &'static str {
            "0.0.0"
        }

        fn open(&mut self, _device_id: u32, _resolution: Resolution) -> Result<(), CaptureError> {
            Ok(())
        }

        fn is_open(&self) -> bool {
            false
        }

        fn read_frame(&mut self) -> Result<Frame, CaptureError> {
            Err(CaptureError::NotOpen)
        }

        fn release(&mut self) -> Result<(), CaptureError> {
            self.counts.released.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn res() -> Resolution {
        Resolution::new(320, 240)
    }

    fn compositor(
        renderer: ScriptedRenderer,
        counts: &Counts,
        shutdown: &ShutdownSignal,
    ) -> (
        SampleCompositor<ScriptedRenderer, LabelOverlay>,
        Arc<LatestValueMailbox<Frame>>,
    ) {
        let frames = Arc::new(LatestValueMailbox::new(2));
        let session = Session::new(
            renderer,
            FrameProducerHandle::idle(Box::new(IdleDevice {
                counts: counts.clone(),
            })),
            shutdown.clone(),
            Duration::from_millis(100),
        );
        let compositor = SampleCompositor::new(
            MailboxReader::new(Arc::clone(&frames), Frame::placeholder(res())),
            session,
            LabelOverlay::default(),
            LabelLayout::default(),
            shutdown.clone(),
        );
        (compositor, frames)
    }

    #[test]
    fn layout_matches_default_placement() {
        let layout = LabelLayout::default();
        assert_eq!(layout.position(res(), 0), LabelPosition { x: 70, y: 180 });
        assert_eq!(layout.position(res(), 1), LabelPosition { x: 70, y: 150 });
        assert_eq!(layout.position(res(), 2), LabelPosition { x: 70, y: 120 });
    }

    #[test]
    fn layout_saturates_on_small_frames() {
        let layout = LabelLayout::default();
        let tiny = Resolution::new(100, 50);
        assert_eq!(layout.position(tiny, 0), LabelPosition { x: 0, y: 0 });
        assert_eq!(layout.position(tiny, usize::MAX), LabelPosition { x: 0, y: 0 });
    }

    #[test]
    fn compose_uses_fallbacks_then_fresh_values() {
        let counts = Counts::default();
        let shutdown = ShutdownSignal::new();
        let renderer = ScriptedRenderer {
            counts: counts.clone(),
            quit_after: None,
            fail: false,
        };
        let (mut compositor, _frames) = compositor(renderer, &counts, &shutdown);

        let values = Arc::new(LatestValueMailbox::new(2));
        compositor.add_sensor("Sensor 1", MailboxReader::new(Arc::clone(&values), 0u64));

        let view = compositor.compose(Frame::placeholder(res()));
        assert_eq!(view.labels()[0].text, "Sensor 1: 0");

        values.publish(41);
        values.publish(42);
        let view = compositor.compose(Frame::placeholder(res()));
        assert_eq!(view.labels()[0].text, "Sensor 1: 41");
        let view = compositor.compose(Frame::placeholder(res()));
        assert_eq!(view.labels()[0].text, "Sensor 1: 42");
        let view = compositor.compose(Frame::placeholder(res()));
        assert_eq!(view.labels()[0].text, "Sensor 1: 42");
    }

    #[test]
    fn user_quit_sets_signal_and_releases_once() {
        let counts = Counts::default();
        let shutdown = ShutdownSignal::new();
        let renderer = ScriptedRenderer {
            counts: counts.clone(),
            quit_after: Some(3),
            fail: false,
        };
        let (mut compositor, _frames) = compositor(renderer, &counts, &shutdown);

        let report = compositor.run();
        assert_eq!(report.ticks, 3);
        assert_eq!(report.reason, Some(ShutdownReason::UserQuit));
        assert_eq!(compositor.state(), CompositorState::Terminated);
        assert!(shutdown.is_set());

        drop(compositor);
        assert_eq!(counts.closed.load(Ordering::SeqCst), 1);
        assert_eq!(counts.released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn render_failure_is_fatal() {
        let counts = Counts::default();
        let shutdown = ShutdownSignal::new();
        let renderer = ScriptedRenderer {
            counts: counts.clone(),
            quit_after: None,
            fail: true,
        };
        let (mut compositor, _frames) = compositor(renderer, &counts, &shutdown);

        let report = compositor.run();
        assert_eq!(report.ticks, 1);
        assert_eq!(report.reason, Some(ShutdownReason::RenderFailure));
    }

    #[test]
    fn preset_signal_terminates_before_first_render() {
        let counts = Counts::default();
        let shutdown = ShutdownSignal::new();
        shutdown.set_with(ShutdownReason::DeviceUnavailable);
        let renderer = ScriptedRenderer {
            counts: counts.clone(),
            quit_after: None,
            fail: false,
        };
        let (mut compositor, _frames) = compositor(renderer, &counts, &shutdown);

        let report = compositor.run();
        assert_eq!(report.ticks, 0);
        assert_eq!(report.reason, Some(ShutdownReason::DeviceUnavailable));
        assert_eq!(counts.shown.load(Ordering::SeqCst), 0);
        assert_eq!(counts.released.load(Ordering::SeqCst), 1);
        assert_eq!(counts.closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropping_unreleased_session_releases() {
        let counts = Counts::default();
        let shutdown = ShutdownSignal::new();
        let session = Session::new(
            ScriptedRenderer {
                counts: counts.clone(),
                quit_after: None,
                fail: false,
            },
            FrameProducerHandle::idle(Box::new(IdleDevice {
                counts: counts.clone(),
            })),
            shutdown.clone(),
            Duration::from_millis(100),
        );

        drop(session);
        assert!(shutdown.is_set());
        assert_eq!(counts.released.load(Ordering::SeqCst), 1);
        assert_eq!(counts.closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn freshest_frame_is_rendered() {
        let counts = Counts::default();
        let shutdown = ShutdownSignal::new();
        let renderer = ScriptedRenderer {
            counts: counts.clone(),
            quit_after: None,
            fail: false,
        };
        let (mut compositor, frames) = compositor(renderer, &counts, &shutdown);

        let captured = Frame::from_pixels(Resolution::new(1, 1), vec![1, 2, 3], 9).unwrap();
        frames.publish(captured);
        compositor.tick();
        assert_eq!(compositor.frames.last_known().sequence(), 9);
        assert_eq!(compositor.ticks(), 1);
    }

    /// Shared log of teardown calls, in order.
    type CallLog = Arc<parking_lot::Mutex<Vec<&'static str>>>;

    struct StuckDevice {
        log: CallLog,
    }

    impl CaptureDevice for StuckDevice {
        fn name(&self) -> &'static str {
            "stuck"
        }

        fn version(&self) -> &'static str {
            "0.0.0"
        }

        fn open(&mut self, _device_id: u32, _resolution: Resolution) -> Result<(), CaptureError> {
            Ok(())
        }

        fn is_open(&self) -> bool {
            true
        }

        fn read_frame(&mut self) -> Result<Frame, CaptureError> {
            Err(CaptureError::NotOpen)
        }

        fn release(&mut self) -> Result<(), CaptureError> {
            self.log.lock().push("device.release");
            Err(CaptureError::ReleaseFailed("handle busy".to_string()))
        }
    }

    struct UnclosableRenderer {
        log: CallLog,
    }

    impl Renderer for UnclosableRenderer {
        fn show(&mut self, _frame: &Frame) -> Result<bool, RenderError> {
            Ok(true)
        }

        fn close(&mut self) -> Result<(), RenderError> {
            self.log.lock().push("renderer.close");
            Err(RenderError::CloseFailed("window gone".to_string()))
        }
    }

    #[test]
    fn release_failures_are_counted_not_raised() {
        let log = CallLog::default();
        let shutdown = ShutdownSignal::new();
        let session = Session::new(
            UnclosableRenderer { log: log.clone() },
            FrameProducerHandle::idle(Box::new(StuckDevice { log: log.clone() })),
            shutdown.clone(),
            Duration::from_millis(100),
        );
        let mut compositor = SampleCompositor::new(
            MailboxReader::new(
                Arc::new(LatestValueMailbox::new(2)),
                Frame::placeholder(res()),
            ),
            session,
            LabelOverlay::default(),
            LabelLayout::default(),
            shutdown.clone(),
        );

        let report = compositor.run();
        assert_eq!(report.reason, Some(ShutdownReason::UserQuit));
        assert_eq!(report.release.errors, 2);
        assert_eq!(compositor.state(), CompositorState::Terminated);
        assert_eq!(*log.lock(), vec!["device.release", "renderer.close"]);

        // Failed releases are not retried on drop.
        drop(compositor);
        assert_eq!(log.lock().len(), 2);
    }
}
