//! Frame, resolution and overlay label types.
//!
//! A [`Frame`] is a packed RGB8 image produced by a capture device and
//! annotated by an overlay before rendering.

use crate::consts::MAX_FRAME_DIMENSION;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Bytes per pixel of the packed RGB8 layout.
pub const BYTES_PER_PIXEL: usize = 3;

/// Error returned when parsing a `WIDTHxHEIGHT` string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionParseError {
    /// No `x` separator between width and height.
    #[error("expected WIDTHxHEIGHT, got '{0}'")]
    MissingSeparator(String),

    /// A dimension is not an unsigned integer.
    #[error("invalid {axis} '{value}'")]
    InvalidDimension {
        /// Which dimension failed ("width" or "height").
        axis: &'static str,
        /// The offending text.
        value: String,
    },

    /// A dimension is zero or above the supported maximum.
    #[error("{axis} {value} out of range (1..={max})")]
    OutOfRange {
        /// Which dimension failed.
        axis: &'static str,
        /// Parsed value.
        value: u32,
        /// Largest accepted value.
        max: u32,
    },
}

/// Frame size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Resolution {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Resolution {
    /// Create a resolution. Dimensions are not validated.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of pixels.
    pub const fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

fn parse_dimension(axis: &'static str, text: &str) -> Result<u32, ResolutionParseError> {
    let value: u32 = text
        .trim()
        .parse()
        .map_err(|_| ResolutionParseError::InvalidDimension {
            axis,
            value: text.to_string(),
        })?;
    if value == 0 || value > MAX_FRAME_DIMENSION {
        return Err(ResolutionParseError::OutOfRange {
            axis,
            value,
            max: MAX_FRAME_DIMENSION,
        });
    }
    Ok(value)
}

impl FromStr for Resolution {
    type Err = ResolutionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (width, height) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| ResolutionParseError::MissingSeparator(s.to_string()))?;
        Ok(Self {
            width: parse_dimension("width", width)?,
            height: parse_dimension("height", height)?,
        })
    }
}

/// An RGB8 color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Pure white, used for placeholder frames.
    pub const WHITE: Rgb = Rgb(255, 255, 255);
    /// Pure blue, the default label color.
    pub const BLUE: Rgb = Rgb(0, 0, 255);
}

/// Pixel position of a label's baseline origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelPosition {
    /// Column, from the left edge.
    pub x: u32,
    /// Row, from the top edge.
    pub y: u32,
}

/// A text label drawn onto a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub text: String,
    pub position: LabelPosition,
    pub color: Rgb,
}

/// A packed RGB8 image with the labels drawn onto it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    resolution: Resolution,
    pixels: Vec<u8>,
    sequence: u64,
    labels: Vec<Label>,
}

impl Frame {
    /// A frame of the given size filled with one color.
    pub fn filled(resolution: Resolution, color: Rgb) -> Self {
        let mut pixels = Vec::with_capacity(resolution.pixel_count() * BYTES_PER_PIXEL);
        for _ in 0..resolution.pixel_count() {
            pixels.extend_from_slice(&[color.0, color.1, color.2]);
        }
        Self {
            resolution,
            pixels,
            sequence: 0,
            labels: Vec::new(),
        }
    }

    /// Blank white frame shown before any capture arrives.
    pub fn placeholder(resolution: Resolution) -> Self {
        Self::filled(resolution, Rgb::WHITE)
    }

    /// Build a frame from raw RGB8 bytes.
    ///
    /// Returns `None` if `pixels` does not match the resolution.
    pub fn from_pixels(resolution: Resolution, pixels: Vec<u8>, sequence: u64) -> Option<Self> {
        if pixels.len() != resolution.pixel_count() * BYTES_PER_PIXEL {
            return None;
        }
        Some(Self {
            resolution,
            pixels,
            sequence,
            labels: Vec::new(),
        })
    }

    #[inline]
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.resolution.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.resolution.height
    }

    /// Capture sequence number (0 for synthesized frames).
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Raw RGB8 bytes, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Labels drawn onto this frame, in drawing order.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Record a drawn label.
    pub fn push_label(&mut self, label: Label) {
        self.labels.push(label);
    }

    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.resolution.width || y >= self.resolution.height {
            return None;
        }
        Some((y as usize * self.resolution.width as usize + x as usize) * BYTES_PER_PIXEL)
    }

    /// Color at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        let i = self.offset(x, y)?;
        Some(Rgb(self.pixels[i], self.pixels[i + 1], self.pixels[i + 2]))
    }

    /// Set the color at `(x, y)`. Writes outside the frame are ignored.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Rgb) {
        if let Some(i) = self.offset(x, y) {
            self.pixels[i] = color.0;
            self.pixels[i + 1] = color.1;
            self.pixels[i + 2] = color.2;
        }
    }
}
