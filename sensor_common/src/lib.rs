//! Sensor Common Library
//!
//! This crate provides the types shared between the sensor hub core and
//! the collaborators it drives.
//!
//! # Module Structure
//!
//! - [`capture`] - Capture device trait and error types
//! - [`config`] - Configuration loading traits and types
//! - [`consts`] - Workspace-wide defaults
//! - [`frame`] - Frame, resolution and label types
//! - [`render`] - Renderer and overlay traits
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use sensor_common::prelude::*;
//!
//! let res: Resolution = "640x480".parse().unwrap();
//! let frame = Frame::placeholder(res);
//! assert_eq!(frame.resolution(), res);
//! ```

pub mod capture;
pub mod config;
pub mod consts;
pub mod frame;
pub mod prelude;
pub mod render;
