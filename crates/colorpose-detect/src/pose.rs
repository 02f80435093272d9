//! Centering error, left/right tilt and distance from blob geometry.

use colorpose_core::PixelRect;
use serde::{Deserialize, Serialize};

use crate::calibration::DistanceEstimator;
use crate::geometry::Geometry;

/// Optional stages of the pose estimator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    #[serde(default = "default_true")]
    pub tilt: bool,
    /// Requires a calibration record.
    #[serde(default)]
    pub distance: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            tilt: true,
            distance: false,
        }
    }
}

/// Left-vs-right apparent height asymmetry.
///
/// `tilt_rel > 0` means the left quarter of the object looks taller, i.e. its
/// left edge is probably closer to the camera. This is a coarse perspective
/// heuristic, not a calibrated yaw angle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TiltEstimate {
    pub left_height: f32,
    pub right_height: f32,
    pub tilt_rel: f32,
}

/// Output of one detection pass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: PixelRect,
    /// Pixel area of the selected blob.
    pub area: u64,
    pub center_x: u32,
    pub center_y: u32,
    /// `(cx - W/2) / (W/2)`: 0 centered, -1 left edge, +1 right edge.
    pub error_x_rel: f32,
    /// `(cy - H/2) / (H/2)`: 0 centered, -1 top edge, +1 bottom edge.
    pub error_y_rel: f32,
    pub tilt: Option<TiltEstimate>,
    pub distance_m: Option<f32>,
    /// Set when a division had to be neutralised: a frame half-dimension of
    /// zero, or a box narrower than 4 columns reaching the tilt stage.
    #[serde(default)]
    pub degenerate: bool,
}

impl Detection {
    /// Tilt ratio, `0.0` when tilt was not computed.
    #[inline]
    pub fn tilt_rel(&self) -> f32 {
        self.tilt.map(|t| t.tilt_rel).unwrap_or(0.0)
    }
}

fn mean_nonzero(heights: &[u32]) -> Option<f32> {
    let (sum, n) = heights
        .iter()
        .filter(|&&h| h > 0)
        .fold((0u64, 0u32), |(s, n), &h| (s + h as u64, n + 1));
    (n > 0).then(|| sum as f32 / n as f32)
}

/// Compare the first and last quarter of a column height profile.
///
/// Returns the estimate and whether the profile was too narrow (< 4 columns)
/// to split, in which case both sides are the whole profile and tilt is 0.
pub fn estimate_tilt(column_heights: &[u32]) -> (TiltEstimate, bool) {
    let w = column_heights.len();
    let narrow = w < 4;
    let (left, right) = if narrow {
        (column_heights, column_heights)
    } else {
        (&column_heights[..w / 4], &column_heights[3 * w / 4..])
    };

    let (hl, hr) = match (mean_nonzero(left), mean_nonzero(right)) {
        (Some(hl), Some(hr)) => (hl, hr),
        (hl, hr) => {
            let est = TiltEstimate {
                left_height: hl.unwrap_or(0.0),
                right_height: hr.unwrap_or(0.0),
                tilt_rel: 0.0,
            };
            return (est, narrow);
        }
    };

    let avg = 0.5 * (hl + hr);
    let tilt_rel = if avg > 0.0 { (hl - hr) / avg } else { 0.0 };
    let est = TiltEstimate {
        left_height: hl,
        right_height: hr,
        tilt_rel,
    };
    (est, narrow)
}

/// Normalised offset of `c` from the frame's integer half-size, with a flag
/// set when the half-size is zero.
fn centering_error(c: u32, frame_size: usize) -> (f32, bool) {
    let half = (frame_size / 2) as f32;
    if half == 0.0 {
        return (0.0, true);
    }
    ((c as f32 - half) / half, false)
}

/// Turn blob geometry into a [`Detection`] for a `frame_width x frame_height`
/// frame.
pub fn estimate(
    frame_width: usize,
    frame_height: usize,
    geometry: &Geometry,
    distance: Option<&DistanceEstimator>,
    capabilities: Capabilities,
) -> Detection {
    let (error_x_rel, dx) = centering_error(geometry.center_x, frame_width);
    let (error_y_rel, dy) = centering_error(geometry.center_y, frame_height);
    let mut degenerate = dx || dy;

    let tilt = capabilities.tilt.then(|| {
        let (est, narrow) = estimate_tilt(&geometry.column_heights);
        degenerate |= narrow;
        est
    });

    let distance_m = if capabilities.distance {
        distance.and_then(|d| d.estimate(geometry.bbox.height))
    } else {
        None
    };

    if degenerate {
        log::debug!(
            "degenerate geometry: frame {}x{}, box {:?}",
            frame_width,
            frame_height,
            geometry.bbox
        );
    }

    Detection {
        bbox: geometry.bbox,
        area: geometry.area,
        center_x: geometry.center_x,
        center_y: geometry.center_y,
        error_x_rel,
        error_y_rel,
        tilt,
        distance_m,
        degenerate,
    }
}
