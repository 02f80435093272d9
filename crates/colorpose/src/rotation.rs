use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Rotation applied to frames before detection, for cameras mounted sideways
/// or upside down.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    #[serde(rename = "none")]
    None,
    /// 90 degrees clockwise.
    #[serde(rename = "cw90")]
    Cw90,
    /// 90 degrees counter-clockwise.
    #[serde(rename = "ccw90")]
    Ccw90,
    #[serde(rename = "180")]
    Half,
}

impl Rotation {
    pub fn as_str(self) -> &'static str {
        match self {
            Rotation::None => "none",
            Rotation::Cw90 => "cw90",
            Rotation::Ccw90 => "ccw90",
            Rotation::Half => "180",
        }
    }

    /// Output dimensions for a `width x height` input.
    pub fn rotated_size(self, width: u32, height: u32) -> (u32, u32) {
        match self {
            Rotation::None | Rotation::Half => (width, height),
            Rotation::Cw90 | Rotation::Ccw90 => (height, width),
        }
    }

    #[cfg(feature = "image")]
    pub fn apply(self, img: &::image::RgbImage) -> ::image::RgbImage {
        use ::image::imageops;
        match self {
            Rotation::None => img.clone(),
            Rotation::Cw90 => imageops::rotate90(img),
            Rotation::Ccw90 => imageops::rotate270(img),
            Rotation::Half => imageops::rotate180(img),
        }
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rotation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "0" => Ok(Rotation::None),
            "cw90" | "90" => Ok(Rotation::Cw90),
            "ccw90" | "270" => Ok(Rotation::Ccw90),
            "180" => Ok(Rotation::Half),
            other => Err(format!(
                "unknown rotation `{other}` (expected none, cw90, ccw90 or 180)"
            )),
        }
    }
}
