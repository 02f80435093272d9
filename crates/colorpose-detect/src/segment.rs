//! HSV thresholding.

use colorpose_core::{rgb_to_hsv, ColorImageView, HsvRange, Mask};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Threshold `frame` into a mask: foreground where the pixel's HSV value lies
/// inside `range` on all three channels.
///
/// The caller is expected to have validated the frame.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(frame, range), fields(width = frame.width, height = frame.height))
)]
pub fn segment(frame: &ColorImageView<'_>, range: &HsvRange) -> Mask {
    let mut mask = Mask::new(frame.width, frame.height);
    for (dst, px) in mask.data.iter_mut().zip(frame.data.chunks_exact(3)) {
        let hsv = rgb_to_hsv(frame.order.to_rgb([px[0], px[1], px[2]]));
        if range.contains(hsv) {
            *dst = Mask::FOREGROUND;
        }
    }
    mask
}
