//! Headless console renderer.

use sensor_common::frame::Frame;
use sensor_common::render::{RenderError, Renderer};
use std::io::{self, BufRead};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Default time spent polling for input per shown frame (like a 1 ms key wait).
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Default minimum interval between logged views.
const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// Shared "user asked to quit" latch.
#[derive(Debug, Clone, Default)]
pub struct QuitSwitch(Arc<AtomicBool>);

impl QuitSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Renderer that reports composed views through `tracing` instead of a window.
///
/// Typing `q` followed by Enter on stdin requests quit once
/// [`ConsoleRenderer::watch_stdin`] has been called.
pub struct ConsoleRenderer {
    title: String,
    quit: QuitSwitch,
    poll_interval: Duration,
    report_interval: Duration,
    last_report: Option<Instant>,
    shown: u64,
    closed: bool,
}

impl ConsoleRenderer {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            quit: QuitSwitch::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            report_interval: DEFAULT_REPORT_INTERVAL,
            last_report: None,
            shown: 0,
            closed: false,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_report_interval(mut self, report_interval: Duration) -> Self {
        self.report_interval = report_interval;
        self
    }

    /// Latch that makes the next `show` report a quit request.
    pub fn quit_switch(&self) -> QuitSwitch {
        self.quit.clone()
    }

    /// Number of frames shown so far.
    pub fn shown(&self) -> u64 {
        self.shown
    }

    /// Start a detached thread that requests quit when `q` is read on stdin.
    ///
    /// # Errors
    /// Returns the OS error if the thread cannot be created.
    pub fn watch_stdin(&self) -> io::Result<()> {
        let quit = self.quit.clone();
        thread::Builder::new()
            .name("stdin-quit".to_string())
            .spawn(move || {
                for line in io::stdin().lock().lines() {
                    let Ok(line) = line else { break };
                    if line.trim().eq_ignore_ascii_case("q") {
                        quit.request();
                        break;
                    }
                }
            })?;
        info!("Type 'q' and press Enter to quit");
        Ok(())
    }

    fn report_due(&self, now: Instant) -> bool {
        self.last_report
            .is_none_or(|last| now.duration_since(last) >= self.report_interval)
    }
}

impl Renderer for ConsoleRenderer {
    fn show(&mut self, frame: &Frame) -> Result<bool, RenderError> {
        if self.closed {
            return Err(RenderError::DisplayFailed(format!(
                "'{}' is closed",
                self.title
            )));
        }
        self.shown += 1;

        let now = Instant::now();
        if self.report_due(now) {
            let labels: Vec<&str> = frame.labels().iter().map(|l| l.text.as_str()).collect();
            info!(
                "[{}] frame #{} {}: {}",
                self.title,
                frame.sequence(),
                frame.resolution(),
                labels.join(" | ")
            );
            self.last_report = Some(now);
        }

        if !self.poll_interval.is_zero() {
            thread::sleep(self.poll_interval);
        }
        Ok(self.quit.is_requested())
    }

    fn close(&mut self) -> Result<(), RenderError> {
        if self.closed {
            return Err(RenderError::CloseFailed(format!(
                "'{}' already closed",
                self.title
            )));
        }
        self.closed = true;
        debug!("Closed '{}' after {} frames", self.title, self.shown);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensor_common::frame::Resolution;

    fn renderer() -> ConsoleRenderer {
        ConsoleRenderer::new("test").with_poll_interval(Duration::ZERO)
    }

    #[test]
    fn show_reports_quit_request() {
        let mut renderer = renderer();
        let frame = Frame::placeholder(Resolution::new(2, 2));

        assert_eq!(renderer.show(&frame), Ok(false));
        renderer.quit_switch().request();
        assert_eq!(renderer.show(&frame), Ok(true));
        assert_eq!(renderer.shown(), 2);
    }

    #[test]
    fn closed_renderer_rejects_frames() {
        let mut renderer = renderer();
        let frame = Frame::placeholder(Resolution::new(2, 2));

        renderer.close().unwrap();
        assert!(matches!(
            renderer.show(&frame),
            Err(RenderError::DisplayFailed(_))
        ));
        assert!(matches!(renderer.close(), Err(RenderError::CloseFailed(_))));
    }

    #[test]
    fn report_throttling() {
        let mut renderer = renderer().with_report_interval(Duration::from_secs(60));
        let now = Instant::now();
        assert!(renderer.report_due(now));
        renderer.last_report = Some(now);
        assert!(!renderer.report_due(now + Duration::from_secs(1)));
        assert!(renderer.report_due(now + Duration::from_secs(61)));
    }
}
