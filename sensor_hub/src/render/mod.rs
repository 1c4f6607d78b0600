//! Built-in render and overlay collaborators.
//!
//! - [`ConsoleRenderer`] - Headless renderer reporting composed views to the log
//! - [`LabelOverlay`] - Records labels on the frame and paints an underline bar

mod console;
mod overlay;

pub use console::{ConsoleRenderer, QuitSwitch};
pub use overlay::{GLYPH_WIDTH, LabelOverlay, UNDERLINE_HEIGHT};
