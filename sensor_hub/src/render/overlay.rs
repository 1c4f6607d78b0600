//! Label overlay.

use sensor_common::frame::{Frame, Label, LabelPosition, Rgb};
use sensor_common::render::Overlay;

/// Nominal width of one glyph, in pixels.
pub const GLYPH_WIDTH: u32 = 10;

/// Height of the bar painted under each label, in pixels.
pub const UNDERLINE_HEIGHT: u32 = 2;

/// Overlay that records labels on the frame and marks them with a bar.
///
/// Glyph rasterisation is left to whichever renderer presents the frame;
/// the bar makes label placement visible in the raw pixels.
#[derive(Debug, Clone, Copy)]
pub struct LabelOverlay {
    color: Rgb,
}

impl LabelOverlay {
    pub fn new(color: Rgb) -> Self {
        Self { color }
    }
}

impl Default for LabelOverlay {
    fn default() -> Self {
        Self::new(Rgb::BLUE)
    }
}

impl Overlay for LabelOverlay {
    fn draw_label(&self, mut frame: Frame, text: &str, position: LabelPosition) -> Frame {
        let text_width = (text.chars().count() as u32).saturating_mul(GLYPH_WIDTH);
        let x_end = position.x.saturating_add(text_width).min(frame.width());
        let y_end = position
            .y
            .saturating_add(UNDERLINE_HEIGHT)
            .min(frame.height());

        for y in position.y..y_end {
            for x in position.x..x_end {
                frame.set_pixel(x, y, self.color);
            }
        }

        frame.push_label(Label {
            text: text.to_string(),
            position,
            color: self.color,
        });
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensor_common::frame::Resolution;

    #[test]
    fn draws_bar_and_records_label() {
        let overlay = LabelOverlay::default();
        let frame = Frame::placeholder(Resolution::new(100, 20));
        let frame = overlay.draw_label(frame, "abc", LabelPosition { x: 10, y: 5 });

        assert_eq!(frame.labels().len(), 1);
        assert_eq!(frame.labels()[0].text, "abc");
        assert_eq!(frame.pixel(10, 5), Some(Rgb::BLUE));
        assert_eq!(frame.pixel(39, 6), Some(Rgb::BLUE));
        assert_eq!(frame.pixel(40, 5), Some(Rgb::WHITE));
        assert_eq!(frame.pixel(10, 7), Some(Rgb::WHITE));
    }

    #[test]
    fn clips_to_frame() {
        let overlay = LabelOverlay::default();
        let frame = Frame::placeholder(Resolution::new(8, 4));
        let frame = overlay.draw_label(frame, "long label", LabelPosition { x: 5, y: 3 });

        assert_eq!(frame.pixel(7, 3), Some(Rgb::BLUE));
        assert_eq!(frame.pixel(4, 3), Some(Rgb::WHITE));
        assert_eq!(frame.labels().len(), 1);
    }

    #[test]
    fn label_outside_frame_leaves_pixels_untouched() {
        let overlay = LabelOverlay::default();
        let frame = Frame::placeholder(Resolution::new(8, 4));
        let frame = overlay.draw_label(frame, "x", LabelPosition { x: 50, y: 50 });
        assert!(frame.pixels().iter().all(|&b| b == 255));
    }
}
