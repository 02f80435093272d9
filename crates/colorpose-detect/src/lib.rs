//! Color-segmentation object locator and pose estimator.
//!
//! Pipeline, one frame at a time:
//! - threshold the frame in HSV against a [`ColorProfile`] ([`segment`]),
//! - clean the mask with an opening then a closing ([`morphology::clean`]),
//! - enumerate external 8-connected blobs and pick one ([`find_blobs`], [`select`]),
//! - measure its box, center and column height profile ([`extract`]),
//! - turn that into centering error, tilt and distance ([`estimate`]).
//!
//! [`ObjectDetector`] chains the stages. "Nothing found" is `Ok(None)`, a
//! malformed frame is an error.
//!
//! ```
//! use colorpose_core::{ChannelOrder, ColorImage};
//! use colorpose_detect::{ColorProfile, DetectorParams, ObjectDetector};
//!
//! let mut frame = ColorImage::filled(640, 480, ChannelOrder::Bgr, [30, 30, 30]);
//! frame.fill_rect_rgb(270, 190, 100, 100, [20, 60, 220]);
//!
//! let detector = ObjectDetector::new(DetectorParams::new(ColorProfile::blue_target()))?;
//! let detection = detector.detect(&frame.view())?.expect("blue square");
//! assert_eq!((detection.center_x, detection.center_y), (320, 240));
//! assert_eq!(detection.tilt_rel(), 0.0);
//! # Ok::<(), colorpose_detect::DetectError>(())
//! ```

pub mod blobs;
pub mod calibration;
pub mod detector;
pub mod geometry;
pub mod morphology;
pub mod pose;
pub mod profile;
pub mod segment;

pub use blobs::{find_blobs, select, BlobCandidate};
pub use calibration::{
    measure_reference, CalibrationError, CalibrationRecord, DistanceEstimator, DistanceModel,
};
pub use detector::{locate, DetectError, DetectionDebug, DetectorParams, Located, ObjectDetector};
pub use geometry::{extract, Geometry};
pub use pose::{estimate, estimate_tilt, Capabilities, Detection, TiltEstimate};
pub use profile::{ColorProfile, ProfileError, SelectionPolicy};
pub use segment::segment;
