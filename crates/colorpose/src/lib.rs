//! Facade crate for the `colorpose` workspace.
//!
//! This crate provides:
//! - re-exports of the core types, the detector and the bus output
//! - JSON configuration ([`DetectConfig`])
//! - (feature `image`) helpers for `image::RgbImage`, frame sources and the
//!   tracking loop
//! - (feature `cli`) the `colorpose` command-line tool
//!
//! ## Quickstart
//!
//! ```no_run
//! use colorpose::detect::{detect_image, load_frame};
//! use colorpose::DetectConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let detector = DetectConfig::default().build_detector()?;
//! let frame = load_frame("frame.png")?;
//! match detect_image(&detector, &frame)? {
//!     Some(d) => println!("errX {:.3} errY {:.3} tilt {:.3}", d.error_x_rel, d.error_y_rel, d.tilt_rel()),
//!     None => println!("no target"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `colorpose::core`: frames, masks, rectangles, HSV conversion, logger.
//! - `colorpose::detector`: profiles, pipeline stages, pose, calibration.
//! - `colorpose::bus`: CAN frame encoding and best-effort publishing.
//! - `colorpose::detect` (feature `image`): `image`-crate helpers.
//! - `colorpose::annotate` (feature `image`): detection overlay.
//! - `colorpose::source` / `colorpose::runner` (feature `image`): tracking loop.

pub use colorpose_bus as bus;
pub use colorpose_core as core;
pub use colorpose_detect as detector;

pub use colorpose_detect::{
    Capabilities, ColorProfile, Detection, DetectorParams, ObjectDetector, SelectionPolicy,
};

mod config;
mod error;
mod rotation;

pub use config::{DetectConfig, ProfileSpec};
pub use error::AppError;
pub use rotation::Rotation;

#[cfg(feature = "image")]
pub mod annotate;
#[cfg(feature = "image")]
pub mod detect;
#[cfg(feature = "image")]
pub mod runner;
#[cfg(feature = "image")]
pub mod source;
