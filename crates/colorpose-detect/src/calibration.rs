//! Distance calibration record and the reference measurement that produces it.

use std::{fs, path::Path};

use colorpose_core::{ColorImageView, FrameError};
use serde::{Deserialize, Serialize};

use crate::detector::locate;
use crate::profile::ColorProfile;

/// Apparent height of a reference object at a known distance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRecord {
    #[serde(alias = "ref_distance_m")]
    pub reference_distance_m: f32,
    #[serde(alias = "ref_pixel_height")]
    pub reference_pixel_height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum CalibrationError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("reference distance must be a positive finite number of meters (got {0})")]
    InvalidDistance(f32),
    #[error("reference pixel height must be > 0")]
    InvalidPixelHeight,
    #[error("object heights must be positive finite millimeters (reference={reference_mm}, target={target_mm})")]
    InvalidModel { reference_mm: f32, target_mm: f32 },
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error("reference object not found with profile `{0}`")]
    ReferenceNotFound(String),
}

impl CalibrationRecord {
    const MODEL: &'static str = "D_est = reference_distance_m * (reference_pixel_height / h)";
    const NOTE: &'static str = "Valid for the same reference object and camera setup.";

    pub fn new(reference_distance_m: f32, reference_pixel_height: u32) -> Self {
        Self {
            reference_distance_m,
            reference_pixel_height,
            model: Some(Self::MODEL.to_string()),
            note: Some(Self::NOTE.to_string()),
        }
    }

    pub fn validate(&self) -> Result<(), CalibrationError> {
        if !self.reference_distance_m.is_finite() || self.reference_distance_m <= 0.0 {
            return Err(CalibrationError::InvalidDistance(self.reference_distance_m));
        }
        if self.reference_pixel_height == 0 {
            return Err(CalibrationError::InvalidPixelHeight);
        }
        Ok(())
    }

    /// Load and validate a JSON record.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, CalibrationError> {
        let raw = fs::read_to_string(path)?;
        let record: Self = serde_json::from_str(&raw)?;
        record.validate()?;
        Ok(record)
    }

    /// Write this record to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), CalibrationError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// Physical heights used to transfer a calibration made with one object to
/// another.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DistanceModel {
    /// Height of the calibration object (mm).
    pub reference_height_mm: f32,
    /// Assumed height of the tracked object (mm).
    pub target_height_mm: f32,
}

impl Default for DistanceModel {
    fn default() -> Self {
        Self {
            reference_height_mm: 41.0,
            target_height_mm: 50.0,
        }
    }
}

impl DistanceModel {
    pub fn scale(&self) -> f32 {
        self.target_height_mm / self.reference_height_mm
    }
}

/// Pinhole-camera distance estimate: apparent height is inversely
/// proportional to distance.
///
/// Only meaningful while focal length, camera mounting and the assumed
/// physical heights stay what they were at calibration time.
#[derive(Clone, Debug, PartialEq)]
pub struct DistanceEstimator {
    calibration: CalibrationRecord,
    model: DistanceModel,
}

impl DistanceEstimator {
    pub fn new(
        calibration: CalibrationRecord,
        model: DistanceModel,
    ) -> Result<Self, CalibrationError> {
        calibration.validate()?;
        let heights_ok = [model.reference_height_mm, model.target_height_mm]
            .iter()
            .all(|h| h.is_finite() && *h > 0.0);
        if !heights_ok {
            return Err(CalibrationError::InvalidModel {
                reference_mm: model.reference_height_mm,
                target_mm: model.target_height_mm,
            });
        }
        Ok(Self { calibration, model })
    }

    pub fn calibration(&self) -> &CalibrationRecord {
        &self.calibration
    }

    pub fn model(&self) -> &DistanceModel {
        &self.model
    }

    /// Distance in meters for an object `pixel_height` pixels tall, `None`
    /// when the height is zero.
    pub fn estimate(&self, pixel_height: u32) -> Option<f32> {
        if pixel_height == 0 {
            return None;
        }
        let ratio = self.calibration.reference_pixel_height as f32 / pixel_height as f32;
        Some(self.calibration.reference_distance_m * self.model.scale() * ratio)
    }
}

/// Measure the reference object in `frame` placed `reference_distance_m`
/// away and build a calibration record from its bounding-box height.
pub fn measure_reference(
    frame: &ColorImageView<'_>,
    profile: &ColorProfile,
    reference_distance_m: f32,
) -> Result<CalibrationRecord, CalibrationError> {
    if !reference_distance_m.is_finite() || reference_distance_m <= 0.0 {
        return Err(CalibrationError::InvalidDistance(reference_distance_m));
    }
    let located = locate(frame, profile)?;
    let blob = located
        .selected
        .ok_or_else(|| CalibrationError::ReferenceNotFound(profile.name.clone()))?;
    log::info!(
        "reference `{}` measured: {} px tall at {:.3} m",
        profile.name,
        blob.bbox.height,
        reference_distance_m
    );
    let record = CalibrationRecord::new(reference_distance_m, blob.bbox.height);
    record.validate()?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use colorpose_core::{ChannelOrder, ColorImage};

    fn estimator(distance: f32, px: u32) -> DistanceEstimator {
        DistanceEstimator::new(CalibrationRecord::new(distance, px), DistanceModel::default())
            .unwrap()
    }

    #[test]
    fn doubling_height_halves_distance() {
        let est = estimator(0.5, 200);
        let d1 = est.estimate(100).unwrap();
        let d2 = est.estimate(200).unwrap();
        assert_relative_eq!(d1, 2.0 * d2, max_relative = 1e-6);
        assert_relative_eq!(d2, 0.5 * 50.0 / 41.0, max_relative = 1e-6);
    }

    #[test]
    fn zero_height_has_no_distance() {
        assert_eq!(estimator(0.5, 200).estimate(0), None);
    }

    #[test]
    fn invalid_records_are_rejected() {
        assert!(matches!(
            CalibrationRecord::new(0.0, 100).validate(),
            Err(CalibrationError::InvalidDistance(_))
        ));
        assert!(matches!(
            CalibrationRecord::new(f32::NAN, 100).validate(),
            Err(CalibrationError::InvalidDistance(_))
        ));
        assert!(matches!(
            CalibrationRecord::new(1.0, 0).validate(),
            Err(CalibrationError::InvalidPixelHeight)
        ));
        let bad_model = DistanceModel {
            reference_height_mm: 0.0,
            target_height_mm: 50.0,
        };
        assert!(matches!(
            DistanceEstimator::new(CalibrationRecord::new(1.0, 10), bad_model),
            Err(CalibrationError::InvalidModel { .. })
        ));
    }

    #[test]
    fn legacy_keys_are_accepted() {
        let json = r#"{
            "ref_distance_m": 0.75,
            "ref_pixel_height": 312,
            "model": "D_est = ref_distance_m * (ref_pixel_height / h)",
            "note": "Valid for the same white object and camera setup."
        }"#;
        let rec: CalibrationRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.reference_pixel_height, 312);
        assert_relative_eq!(rec.reference_distance_m, 0.75);
        rec.validate().unwrap();
    }

    #[test]
    fn load_json_rejects_missing_and_non_positive_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(matches!(
            CalibrationRecord::load_json(&missing),
            Err(CalibrationError::Io(_))
        ));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, r#"{"reference_distance_m": -1.0, "reference_pixel_height": 5}"#)
            .unwrap();
        assert!(matches!(
            CalibrationRecord::load_json(&bad),
            Err(CalibrationError::InvalidDistance(_))
        ));

        let garbage = dir.path().join("garbage.json");
        std::fs::write(&garbage, "not json").unwrap();
        assert!(matches!(
            CalibrationRecord::load_json(&garbage),
            Err(CalibrationError::Json(_))
        ));

        let good = dir.path().join("good.json");
        CalibrationRecord::new(0.4, 250).write_json(&good).unwrap();
        assert_eq!(CalibrationRecord::load_json(&good).unwrap().reference_pixel_height, 250);
    }

    #[test]
    fn measure_reference_uses_box_height() {
        let mut img = ColorImage::filled(320, 240, ChannelOrder::Bgr, [40, 40, 40]);
        img.fill_rect_rgb(100, 60, 80, 120, [250, 250, 250]);
        let rec = measure_reference(&img.view(), &ColorProfile::white_reference(), 0.6).unwrap();
        assert_eq!(rec.reference_pixel_height, 120);
        assert_relative_eq!(rec.reference_distance_m, 0.6);
    }

    #[test]
    fn measure_reference_reports_missing_object() {
        let img = ColorImage::filled(64, 48, ChannelOrder::Bgr, [40, 40, 40]);
        assert!(matches!(
            measure_reference(&img.view(), &ColorProfile::white_reference(), 0.6),
            Err(CalibrationError::ReferenceNotFound(_))
        ));
        assert!(matches!(
            measure_reference(&img.view(), &ColorProfile::white_reference(), -2.0),
            Err(CalibrationError::InvalidDistance(_))
        ));
    }
}
