//! Core types for the colorpose object locator.
//!
//! This crate is intentionally small: packed color frames, binary masks,
//! pixel rectangles and the 8-bit HSV conversion shared by every stage of
//! the detector. It does *not* depend on any concrete image library.

mod hsv;
mod image;
mod logger;
mod rect;

pub use hsv::{rgb_to_hsv, HsvRange, HUE_RANGE};
pub use image::{ChannelOrder, ColorImage, ColorImageView, FrameError, Mask};
pub use rect::PixelRect;

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
