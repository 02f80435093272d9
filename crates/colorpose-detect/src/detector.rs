//! The detection pipeline: segment, clean, select, measure, estimate.

use colorpose_core::{ColorImageView, FrameError, Mask};
use serde::{Deserialize, Serialize};

use crate::blobs::{find_blobs, select, BlobCandidate};
use crate::calibration::{CalibrationError, CalibrationRecord, DistanceEstimator, DistanceModel};
use crate::geometry::extract;
use crate::morphology::clean;
use crate::pose::{estimate, Capabilities, Detection};
use crate::profile::{ColorProfile, ProfileError};
use crate::segment::segment;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors returned by the detector.
///
/// "Nothing found" is not an error; see [`ObjectDetector::detect`].
#[derive(thiserror::Error, Debug)]
pub enum DetectError {
    #[error(transparent)]
    InvalidFrame(#[from] FrameError),
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Calibration(#[from] CalibrationError),
    #[error("distance estimation requested but no calibration record was supplied")]
    CalibrationUnavailable,
}

/// Detector configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectorParams {
    pub profile: ColorProfile,
    #[serde(default)]
    pub capabilities: Capabilities,
    #[serde(default)]
    pub distance_model: DistanceModel,
}

impl DetectorParams {
    pub fn new(profile: ColorProfile) -> Self {
        Self {
            profile,
            capabilities: Capabilities::default(),
            distance_model: DistanceModel::default(),
        }
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }
}

/// Intermediate products of the locating stages.
#[derive(Clone, Debug)]
pub struct Located {
    /// Cleaned mask.
    pub mask: Mask,
    pub candidates: Vec<BlobCandidate>,
    pub selected: Option<BlobCandidate>,
}

/// Run segmentation, cleaning and blob selection on a validated frame.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(frame, profile), fields(profile = %profile.name))
)]
pub fn locate(frame: &ColorImageView<'_>, profile: &ColorProfile) -> Result<Located, FrameError> {
    frame.validate()?;
    let raw = segment(frame, &profile.hsv);
    let mask = clean(&raw, profile.kernel_size);
    let candidates = find_blobs(&mask);
    let selected = select(&candidates, profile);
    log::debug!(
        "profile `{}`: {} raw px, {} clean px, {} blob(s), selected {:?}",
        profile.name,
        raw.count(),
        mask.count(),
        candidates.len(),
        selected.map(|b| b.bbox)
    );
    Ok(Located {
        mask,
        candidates,
        selected,
    })
}

/// Everything a detection pass produced, for diagnostics and overlays.
#[derive(Clone, Debug)]
pub struct DetectionDebug {
    pub located: Located,
    pub detection: Option<Detection>,
}

/// Single-target color detector with optional tilt and distance stages.
///
/// Immutable after construction; share it freely between threads.
#[derive(Clone, Debug)]
pub struct ObjectDetector {
    params: DetectorParams,
    distance: Option<DistanceEstimator>,
}

impl ObjectDetector {
    /// Build a detector without calibration.
    ///
    /// Fails with [`DetectError::CalibrationUnavailable`] when
    /// `params.capabilities.distance` is set.
    pub fn new(params: DetectorParams) -> Result<Self, DetectError> {
        Self::with_calibration(params, None)
    }

    /// Build a detector, validating the profile and, when distance is
    /// requested, the calibration record.
    pub fn with_calibration(
        params: DetectorParams,
        calibration: Option<CalibrationRecord>,
    ) -> Result<Self, DetectError> {
        params.profile.validate()?;
        let distance = match (params.capabilities.distance, calibration) {
            (true, None) => return Err(DetectError::CalibrationUnavailable),
            (true, Some(record)) => Some(DistanceEstimator::new(record, params.distance_model)?),
            (false, _) => None,
        };
        Ok(Self { params, distance })
    }

    #[inline]
    pub fn params(&self) -> &DetectorParams {
        &self.params
    }

    #[inline]
    pub fn distance_estimator(&self) -> Option<&DistanceEstimator> {
        self.distance.as_ref()
    }

    /// Locate the target in `frame`.
    ///
    /// Returns `Ok(None)` when no blob survives the filters, which is the
    /// normal outcome for frames without the target. Malformed frames are
    /// errors.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, frame), fields(width = frame.width, height = frame.height))
    )]
    pub fn detect(&self, frame: &ColorImageView<'_>) -> Result<Option<Detection>, DetectError> {
        Ok(self.detect_debug(frame)?.detection)
    }

    /// Like [`ObjectDetector::detect`], also returning the cleaned mask and
    /// all blob candidates.
    pub fn detect_debug(&self, frame: &ColorImageView<'_>) -> Result<DetectionDebug, DetectError> {
        let located = locate(frame, &self.params.profile)?;
        let detection = located.selected.map(|blob| {
            let geometry = extract(&blob, &located.mask);
            estimate(
                frame.width,
                frame.height,
                &geometry,
                self.distance.as_ref(),
                self.params.capabilities,
            )
        });
        Ok(DetectionDebug {
            located,
            detection,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colorpose_core::{ChannelOrder, ColorImage};

    #[test]
    fn distance_without_calibration_fails_at_construction() {
        let params = DetectorParams::new(ColorProfile::blue_target()).with_capabilities(
            Capabilities {
                tilt: true,
                distance: true,
            },
        );
        assert!(matches!(
            ObjectDetector::new(params.clone()),
            Err(DetectError::CalibrationUnavailable)
        ));
        assert!(matches!(
            ObjectDetector::with_calibration(params, Some(CalibrationRecord::new(0.0, 10))),
            Err(DetectError::Calibration(CalibrationError::InvalidDistance(_)))
        ));
    }

    #[test]
    fn detection_only_path_ignores_calibration() {
        let params = DetectorParams::new(ColorProfile::blue_target());
        let det = ObjectDetector::with_calibration(params, Some(CalibrationRecord::new(1.0, 10)))
            .unwrap();
        assert!(det.distance_estimator().is_none());
    }

    #[test]
    fn invalid_profile_is_rejected() {
        let mut profile = ColorProfile::blue_target();
        profile.kernel_size = 2;
        assert!(matches!(
            ObjectDetector::new(DetectorParams::new(profile)),
            Err(DetectError::Profile(_))
        ));
    }

    #[test]
    fn malformed_frame_is_an_error_not_a_miss() {
        let det = ObjectDetector::new(DetectorParams::new(ColorProfile::blue_target())).unwrap();
        let data = vec![0u8; 10];
        let view = ColorImageView {
            width: 2,
            height: 2,
            order: ChannelOrder::Bgr,
            data: &data,
        };
        assert!(matches!(
            det.detect(&view),
            Err(DetectError::InvalidFrame(FrameError::BufferLength { .. }))
        ));
        let empty = ColorImageView {
            width: 0,
            height: 0,
            order: ChannelOrder::Bgr,
            data: &[],
        };
        assert!(matches!(
            det.detect(&empty),
            Err(DetectError::InvalidFrame(FrameError::InvalidDimensions { .. }))
        ));
    }

    #[test]
    fn debug_output_exposes_mask_and_candidates() {
        let mut img = ColorImage::filled(120, 90, ChannelOrder::Bgr, [30, 30, 30]);
        img.fill_rect_rgb(10, 10, 30, 30, [20, 60, 220]);
        img.fill_rect_rgb(70, 40, 12, 12, [20, 60, 220]);
        let params = DetectorParams::new(ColorProfile::blue_target().with_min_area(200));
        let det = ObjectDetector::new(params).unwrap();
        let dbg = det.detect_debug(&img.view()).unwrap();
        assert_eq!(dbg.located.candidates.len(), 2);
        assert_eq!(dbg.located.mask.count(), 900 + 144);
        let d = dbg.detection.unwrap();
        assert_eq!((d.bbox.x, d.bbox.y, d.bbox.width), (10, 10, 30));
    }
}
