//! Color profiles: what to segment and how to pick the winning blob.

use colorpose_core::HsvRange;
use serde::{Deserialize, Serialize};

fn default_min_area() -> u64 {
    500
}

fn default_kernel_size() -> usize {
    5
}

/// How surviving blobs are ranked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SelectionPolicy {
    /// Largest pixel area wins.
    #[default]
    MaxArea,
    /// Reject blobs whose bounding-box aspect (`w / h`) falls outside
    /// `[min_aspect, max_aspect]`, then the largest bounding-box area wins.
    ///
    /// Very wide blobs are usually a table edge or the floor, very tall thin
    /// ones a door frame or a cable.
    ShapeFiltered { min_aspect: f32, max_aspect: f32 },
}

/// Segmentation target: HSV window, area floor, cleaning kernel and
/// selection policy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorProfile {
    pub name: String,
    pub hsv: HsvRange,
    /// Blobs with fewer pixels than this are ignored.
    #[serde(default = "default_min_area")]
    pub min_area: u64,
    /// Side of the square structuring element used by the mask cleaner.
    #[serde(default = "default_kernel_size")]
    pub kernel_size: usize,
    #[serde(default)]
    pub selection: SelectionPolicy,
}

/// Profile validation errors.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ProfileError {
    #[error("profile `{name}`: HSV bounds must satisfy lower <= upper with hue <= 180")]
    InvalidHsvRange { name: String },
    #[error("profile `{name}`: kernel_size must be odd and >= 1 (got {kernel_size})")]
    InvalidKernel { name: String, kernel_size: usize },
    #[error("profile `{name}`: aspect bounds must satisfy 0 < min <= max (got [{min}, {max}])")]
    InvalidAspect { name: String, min: f32, max: f32 },
    #[error("unknown profile preset `{0}` (expected blue_target, white_package or white_reference)")]
    UnknownPreset(String),
}

impl ColorProfile {
    /// Blue target object tracked by the rig.
    pub fn blue_target() -> Self {
        Self {
            name: "blue_target".to_string(),
            hsv: HsvRange::new([100, 120, 80], [125, 255, 255]),
            min_area: default_min_area(),
            kernel_size: default_kernel_size(),
            selection: SelectionPolicy::MaxArea,
        }
    }

    /// White package lying on a work surface; rejects table-like blobs.
    pub fn white_package() -> Self {
        Self {
            name: "white_package".to_string(),
            hsv: HsvRange::new([0, 0, 170], [180, 40, 255]),
            min_area: default_min_area(),
            kernel_size: default_kernel_size(),
            selection: SelectionPolicy::ShapeFiltered {
                min_aspect: 0.3,
                max_aspect: 3.0,
            },
        }
    }

    /// White calibration cube, segmented with a stricter value floor.
    pub fn white_reference() -> Self {
        Self {
            name: "white_reference".to_string(),
            hsv: HsvRange::new([0, 0, 200], [180, 60, 255]),
            min_area: default_min_area(),
            kernel_size: default_kernel_size(),
            selection: SelectionPolicy::MaxArea,
        }
    }

    /// Look up a built-in profile by name.
    pub fn preset(name: &str) -> Result<Self, ProfileError> {
        match name {
            "blue_target" | "blue" => Ok(Self::blue_target()),
            "white_package" | "white" => Ok(Self::white_package()),
            "white_reference" | "reference" => Ok(Self::white_reference()),
            other => Err(ProfileError::UnknownPreset(other.to_string())),
        }
    }

    pub fn with_min_area(mut self, min_area: u64) -> Self {
        self.min_area = min_area;
        self
    }

    pub fn with_selection(mut self, selection: SelectionPolicy) -> Self {
        self.selection = selection;
        self
    }

    /// Check bounds, kernel and aspect window.
    pub fn validate(&self) -> Result<(), ProfileError> {
        if !self.hsv.is_well_formed() {
            return Err(ProfileError::InvalidHsvRange {
                name: self.name.clone(),
            });
        }
        if self.kernel_size == 0 || self.kernel_size % 2 == 0 {
            return Err(ProfileError::InvalidKernel {
                name: self.name.clone(),
                kernel_size: self.kernel_size,
            });
        }
        if let SelectionPolicy::ShapeFiltered {
            min_aspect,
            max_aspect,
        } = self.selection
        {
            let ok = min_aspect.is_finite()
                && max_aspect.is_finite()
                && min_aspect > 0.0
                && min_aspect <= max_aspect;
            if !ok {
                return Err(ProfileError::InvalidAspect {
                    name: self.name.clone(),
                    min: min_aspect,
                    max: max_aspect,
                });
            }
        }
        Ok(())
    }
}
