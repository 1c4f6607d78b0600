//! Renderer and overlay collaborator traits.

use crate::frame::{Frame, LabelPosition};
use thiserror::Error;

/// Error types for rendering operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// Presenting a frame failed.
    #[error("Failed to display frame: {0}")]
    DisplayFailed(String),

    /// Closing the output failed.
    #[error("Failed to close renderer: {0}")]
    CloseFailed(String),
}

/// Presents composed frames and reports user quit requests.
pub trait Renderer {
    /// Present a frame and poll for input.
    ///
    /// Returns `Ok(true)` when the user asked to quit. Implementations may
    /// block briefly for input polling, never indefinitely.
    fn show(&mut self, frame: &Frame) -> Result<bool, RenderError>;

    /// Close the output. Called exactly once during teardown.
    fn close(&mut self) -> Result<(), RenderError>;
}

/// Draws text labels onto frames.
pub trait Overlay {
    /// Draw `text` at `position` and return the annotated frame.
    fn draw_label(&self, frame: Frame, text: &str, position: LabelPosition) -> Frame;
}
