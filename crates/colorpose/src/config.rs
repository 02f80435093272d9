//! JSON configuration for detection and tracking runs.

use std::{fs, path::Path, path::PathBuf};

use colorpose_bus::ChannelMap;
use colorpose_detect::{
    CalibrationRecord, Capabilities, ColorProfile, DetectorParams, DistanceModel, ObjectDetector,
    ProfileError,
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::rotation::Rotation;

/// A built-in preset name or a full profile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProfileSpec {
    Preset(String),
    Custom(ColorProfile),
}

impl Default for ProfileSpec {
    fn default() -> Self {
        ProfileSpec::Preset("blue_target".to_string())
    }
}

impl ProfileSpec {
    pub fn resolve(&self) -> Result<ColorProfile, ProfileError> {
        let profile = match self {
            ProfileSpec::Preset(name) => ColorProfile::preset(name)?,
            ProfileSpec::Custom(profile) => profile.clone(),
        };
        profile.validate()?;
        Ok(profile)
    }
}

fn default_miss_warn_threshold() -> u32 {
    30
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectConfig {
    #[serde(default)]
    pub profile: ProfileSpec,
    #[serde(default)]
    pub capabilities: Capabilities,
    #[serde(default)]
    pub distance_model: DistanceModel,
    /// Required when `capabilities.distance` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calibration_path: Option<PathBuf>,
    #[serde(default)]
    pub channels: ChannelMap,
    /// Consecutive misses before the tracker warns; `0` disables the warning.
    #[serde(default = "default_miss_warn_threshold")]
    pub miss_warn_threshold: u32,
    #[serde(default)]
    pub rotation: Rotation,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            profile: ProfileSpec::default(),
            capabilities: Capabilities::default(),
            distance_model: DistanceModel::default(),
            calibration_path: None,
            channels: ChannelMap::default(),
            miss_warn_threshold: default_miss_warn_threshold(),
            rotation: Rotation::default(),
        }
    }
}

impl DetectConfig {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), AppError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Point at a calibration file and turn the distance stage on.
    pub fn with_calibration(mut self, path: impl Into<PathBuf>) -> Self {
        self.calibration_path = Some(path.into());
        self.capabilities.distance = true;
        self
    }

    pub fn detector_params(&self) -> Result<DetectorParams, ProfileError> {
        Ok(DetectorParams {
            profile: self.profile.resolve()?,
            capabilities: self.capabilities,
            distance_model: self.distance_model,
        })
    }

    /// Load the calibration record if the distance stage needs one.
    pub fn load_calibration(&self) -> Result<Option<CalibrationRecord>, AppError> {
        if !self.capabilities.distance {
            return Ok(None);
        }
        match &self.calibration_path {
            Some(path) => {
                let record = CalibrationRecord::load_json(path)?;
                log::info!(
                    "calibration loaded from {}: {} px at {:.3} m",
                    path.display(),
                    record.reference_pixel_height,
                    record.reference_distance_m
                );
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// Validate the whole configuration and build the detector.
    pub fn build_detector(&self) -> Result<ObjectDetector, AppError> {
        self.channels.validate()?;
        let params = self.detector_params()?;
        let calibration = self.load_calibration()?;
        Ok(ObjectDetector::with_calibration(params, calibration)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colorpose_detect::{CalibrationError, DetectError, SelectionPolicy};

    #[test]
    fn empty_document_uses_defaults() {
        let cfg: DetectConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, DetectConfig::default());
        let det = cfg.build_detector().unwrap();
        assert_eq!(det.params().profile.name, "blue_target");
    }

    #[test]
    fn profile_can_be_preset_or_inline() {
        let cfg: DetectConfig = serde_json::from_str(r#"{"profile": "white"}"#).unwrap();
        assert_eq!(
            cfg.detector_params().unwrap().profile,
            ColorProfile::white_package()
        );

        let cfg: DetectConfig = serde_json::from_str(
            r#"{
                "profile": {
                    "name": "green",
                    "hsv": { "lower": [40, 80, 60], "upper": [80, 255, 255] },
                    "min_area": 200
                },
                "rotation": "ccw90",
                "channels": { "errors": 512, "pose": 513 }
            }"#,
        )
        .unwrap();
        let params = cfg.detector_params().unwrap();
        assert_eq!(params.profile.name, "green");
        assert_eq!(params.profile.min_area, 200);
        assert_eq!(params.profile.selection, SelectionPolicy::MaxArea);
        assert_eq!(cfg.rotation, Rotation::Ccw90);
        assert_eq!(cfg.channels.errors, 512);
    }

    #[test]
    fn unknown_preset_fails_to_build() {
        let cfg: DetectConfig = serde_json::from_str(r#"{"profile": "green"}"#).unwrap();
        assert!(matches!(
            cfg.build_detector(),
            Err(AppError::Profile(ProfileError::UnknownPreset(_)))
        ));
    }

    #[test]
    fn distance_requires_a_readable_calibration() {
        let dir = tempfile::tempdir().unwrap();
        let missing = DetectConfig::default().with_calibration(dir.path().join("none.json"));
        assert!(matches!(
            missing.build_detector(),
            Err(AppError::Calibration(CalibrationError::Io(_)))
        ));

        let mut no_path = DetectConfig::default();
        no_path.capabilities.distance = true;
        assert!(matches!(
            no_path.build_detector(),
            Err(AppError::Detect(DetectError::CalibrationUnavailable))
        ));

        let path = dir.path().join("cal.json");
        CalibrationRecord::new(0.5, 200).write_json(&path).unwrap();
        let ok = DetectConfig::default().with_calibration(&path);
        let det = ok.build_detector().unwrap();
        assert!(det.distance_estimator().is_some());
    }

    #[test]
    fn config_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut cfg = DetectConfig::default();
        cfg.miss_warn_threshold = 5;
        cfg.rotation = Rotation::Half;
        cfg.write_json(&path).unwrap();
        assert_eq!(DetectConfig::load_json(&path).unwrap(), cfg);
    }
}
