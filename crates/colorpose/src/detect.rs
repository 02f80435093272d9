//! Helpers bridging `image` buffers and the detector.

use std::path::Path;

use ::image::{GrayImage, ImageReader, Luma, Rgb, RgbImage};
use colorpose_core::{ChannelOrder, ColorImage, ColorImageView, Mask};
use colorpose_detect::{Detection, DetectError, ObjectDetector};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::error::AppError;

/// Borrow an `image::RgbImage` as a detector frame.
pub fn color_view(img: &RgbImage) -> ColorImageView<'_> {
    ColorImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        order: ChannelOrder::Rgb,
        data: img.as_raw(),
    }
}

/// Convert a core frame of either channel order into an `image::RgbImage`.
pub fn to_rgb_image(img: &ColorImage) -> Result<RgbImage, AppError> {
    let too_large = || AppError::FrameTooLarge {
        width: img.width,
        height: img.height,
    };
    let w = u32::try_from(img.width).map_err(|_| too_large())?;
    let h = u32::try_from(img.height).map_err(|_| too_large())?;
    let view = img.view();
    Ok(RgbImage::from_fn(w, h, |x, y| {
        Rgb(img.order.to_rgb(view.pixel(x as usize, y as usize)))
    }))
}

/// Render a mask as an 8-bit grayscale image.
pub fn mask_image(mask: &Mask) -> Result<GrayImage, AppError> {
    let too_large = || AppError::FrameTooLarge {
        width: mask.width,
        height: mask.height,
    };
    let w = u32::try_from(mask.width).map_err(|_| too_large())?;
    let h = u32::try_from(mask.height).map_err(|_| too_large())?;
    Ok(GrayImage::from_fn(w, h, |x, y| {
        Luma([mask.data[y as usize * mask.width + x as usize]])
    }))
}

/// Decode an image file into RGB.
pub fn load_frame(path: impl AsRef<Path>) -> Result<RgbImage, AppError> {
    Ok(ImageReader::open(path)?.with_guessed_format()?.decode()?.to_rgb8())
}

/// Run `detector` on an `image::RgbImage`.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(detector, img), fields(width = img.width(), height = img.height()))
)]
pub fn detect_image(
    detector: &ObjectDetector,
    img: &RgbImage,
) -> Result<Option<Detection>, DetectError> {
    detector.detect(&color_view(img))
}

#[cfg(test)]
mod tests {
    use super::*;
    use colorpose_detect::{ColorProfile, DetectorParams};

    fn blue_square() -> RgbImage {
        let mut img = RgbImage::from_pixel(320, 240, Rgb([30, 30, 30]));
        for y in 70..170 {
            for x in 110..210 {
                img.put_pixel(x, y, Rgb([20, 60, 220]));
            }
        }
        img
    }

    #[test]
    fn rgb_image_detects_like_core_frame() {
        let img = blue_square();
        let detector = ObjectDetector::new(DetectorParams::new(ColorProfile::blue_target())).unwrap();
        let det = detect_image(&detector, &img).unwrap().unwrap();
        assert_eq!((det.center_x, det.center_y), (160, 120));
        assert_eq!(det.error_x_rel, 0.0);
    }

    #[test]
    fn bgr_frames_convert_back_to_rgb() {
        let mut frame = ColorImage::filled(3, 2, ChannelOrder::Bgr, [1, 2, 3]);
        frame.put_rgb(2, 1, [200, 100, 50]);
        let img = to_rgb_image(&frame).unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [1, 2, 3]);
        assert_eq!(img.get_pixel(2, 1).0, [200, 100, 50]);
    }

    #[test]
    fn mask_renders_as_gray() {
        let mut mask = Mask::new(4, 3);
        mask.set(1, 2, true);
        let gray = mask_image(&mask).unwrap();
        assert_eq!(gray.get_pixel(1, 2).0, [255]);
        assert_eq!(gray.get_pixel(0, 0).0, [0]);
    }
}
