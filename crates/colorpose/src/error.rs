use std::path::PathBuf;

use colorpose_bus::BusError;
use colorpose_core::FrameError;
use colorpose_detect::{CalibrationError, DetectError, ProfileError};

/// Errors produced by the facade helpers, the frame sources and the CLI.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "image")]
    #[error(transparent)]
    Image(#[from] ::image::ImageError),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    Calibration(#[from] CalibrationError),

    #[error(transparent)]
    Detect(#[from] DetectError),

    #[error(transparent)]
    Bus(#[from] BusError),

    #[error("no images found in {0}")]
    EmptySequence(PathBuf),

    #[error("image is too large for a frame buffer ({width}x{height})")]
    FrameTooLarge { width: usize, height: usize },
}
