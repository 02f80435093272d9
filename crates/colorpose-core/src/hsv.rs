//! 8-bit hue/saturation/value conversion.
//!
//! Uses the OpenCV 8-bit convention so thresholds tuned with OpenCV tools
//! carry over unchanged: hue is halved to fit a byte (`0..180`), saturation
//! and value span `0..=255`.

use serde::{Deserialize, Serialize};

/// Largest hue value produced by [`rgb_to_hsv`] plus one.
pub const HUE_RANGE: u8 = 180;

/// Convert an `[r, g, b]` pixel to `[h, s, v]`.
#[inline]
pub fn rgb_to_hsv(rgb: [u8; 3]) -> [u8; 3] {
    let [r, g, b] = rgb.map(i32::from);
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = v - min;

    let s = if v == 0 {
        0
    } else {
        (2 * 255 * diff + v) / (2 * v)
    };

    let h = if diff == 0 {
        0
    } else {
        // Sixths of the color wheel, 30 hue units each.
        let sector = if v == r {
            g - b
        } else if v == g {
            b - r + 2 * diff
        } else {
            r - g + 4 * diff
        };
        let h = (2 * 30 * sector + diff).div_euclid(2 * diff);
        if h < 0 {
            h + HUE_RANGE as i32
        } else {
            h
        }
    };

    [h as u8, s as u8, v as u8]
}

/// Inclusive per-channel HSV bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvRange {
    pub const fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    #[inline]
    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|c| hsv[c] >= self.lower[c] && hsv[c] <= self.upper[c])
    }

    /// `true` when every lower bound is <= its upper bound and hue stays in range.
    pub fn is_well_formed(&self) -> bool {
        (0..3).all(|c| self.lower[c] <= self.upper[c]) && self.upper[0] <= HUE_RANGE
    }
}
