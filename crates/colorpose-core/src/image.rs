use serde::{Deserialize, Serialize};

/// Byte order of the three channels in a packed 8-bit color frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOrder {
    /// Blue, green, red (OpenCV / Picamera2 BGR888 convention).
    #[default]
    Bgr,
    /// Red, green, blue (`image::RgbImage`).
    Rgb,
}

impl ChannelOrder {
    /// Reorder a pixel stored in this layout into `[r, g, b]`.
    #[inline]
    pub fn to_rgb(self, px: [u8; 3]) -> [u8; 3] {
        match self {
            ChannelOrder::Bgr => [px[2], px[1], px[0]],
            ChannelOrder::Rgb => px,
        }
    }

    /// Reorder an `[r, g, b]` triple into this layout.
    #[inline]
    pub fn from_rgb(self, rgb: [u8; 3]) -> [u8; 3] {
        // Swapping R and B is its own inverse.
        self.to_rgb(rgb)
    }
}

/// Reasons a frame buffer cannot be processed.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("invalid frame dimensions (width={width}, height={height})")]
    InvalidDimensions { width: usize, height: usize },
    #[error("invalid frame buffer length (expected {expected} bytes, got {got})")]
    BufferLength { expected: usize, got: usize },
}

fn checked_len(width: usize, height: usize, channels: usize) -> Result<usize, FrameError> {
    if width == 0 || height == 0 {
        return Err(FrameError::InvalidDimensions { width, height });
    }
    width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(channels))
        .ok_or(FrameError::InvalidDimensions { width, height })
}

/// Borrowed packed 3-channel 8-bit frame, row-major.
#[derive(Clone, Copy, Debug)]
pub struct ColorImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub order: ChannelOrder,
    pub data: &'a [u8], // len = w*h*3
}

impl<'a> ColorImageView<'a> {
    /// Wrap a buffer after checking that its length matches the dimensions.
    pub fn new(
        width: usize,
        height: usize,
        order: ChannelOrder,
        data: &'a [u8],
    ) -> Result<Self, FrameError> {
        let view = Self {
            width,
            height,
            order,
            data,
        };
        view.validate()?;
        Ok(view)
    }

    /// Check dimensions and buffer length.
    ///
    /// Views built through struct literals skip [`ColorImageView::new`], so
    /// consumers call this before touching pixels.
    pub fn validate(&self) -> Result<(), FrameError> {
        let expected = checked_len(self.width, self.height, 3)?;
        if self.data.len() != expected {
            return Err(FrameError::BufferLength {
                expected,
                got: self.data.len(),
            });
        }
        Ok(())
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        let i = (y * self.width + x) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// Copy into an owned image with the same layout.
    pub fn to_owned_image(&self) -> ColorImage {
        ColorImage {
            width: self.width,
            height: self.height,
            order: self.order,
            data: self.data.to_vec(),
        }
    }
}

/// Owned packed 3-channel 8-bit frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorImage {
    pub width: usize,
    pub height: usize,
    pub order: ChannelOrder,
    pub data: Vec<u8>,
}

impl ColorImage {
    /// Frame filled with a single `[r, g, b]` color.
    pub fn filled(width: usize, height: usize, order: ChannelOrder, rgb: [u8; 3]) -> Self {
        let px = order.from_rgb(rgb);
        let mut data = Vec::with_capacity(width * height * 3);
        for _ in 0..width * height {
            data.extend_from_slice(&px);
        }
        Self {
            width,
            height,
            order,
            data,
        }
    }

    pub fn view(&self) -> ColorImageView<'_> {
        ColorImageView {
            width: self.width,
            height: self.height,
            order: self.order,
            data: &self.data,
        }
    }

    /// Write an `[r, g, b]` color; out-of-frame coordinates are ignored.
    #[inline]
    pub fn put_rgb(&mut self, x: i64, y: i64, rgb: [u8; 3]) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let i = (y as usize * self.width + x as usize) * 3;
        self.data[i..i + 3].copy_from_slice(&self.order.from_rgb(rgb));
    }

    /// Fill an axis-aligned rectangle, clipped to the frame.
    pub fn fill_rect_rgb(&mut self, x: usize, y: usize, w: usize, h: usize, rgb: [u8; 3]) {
        let x1 = (x + w).min(self.width);
        let y1 = (y + h).min(self.height);
        for yy in y.min(y1)..y1 {
            for xx in x.min(x1)..x1 {
                self.put_rgb(xx as i64, yy as i64, rgb);
            }
        }
    }
}

/// Binary mask: `0` is background, [`Mask::FOREGROUND`] is foreground.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mask {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>, // row-major, len = w*h
}

impl Mask {
    pub const FOREGROUND: u8 = 255;

    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    pub fn filled(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![Self::FOREGROUND; width * height],
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.data[y * self.width + x] != 0
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, on: bool) {
        self.data[y * self.width + x] = if on { Self::FOREGROUND } else { 0 };
    }

    /// Set every pixel of a rectangle (clipped to the mask) to foreground.
    pub fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize) {
        let x1 = (x + w).min(self.width);
        let y1 = (y + h).min(self.height);
        for yy in y.min(y1)..y1 {
            for xx in x.min(x1)..x1 {
                self.set(xx, yy, true);
            }
        }
    }

    /// Number of foreground pixels.
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_rejects_zero_dimensions() {
        let err = ColorImageView::new(0, 4, ChannelOrder::Bgr, &[]).unwrap_err();
        assert_eq!(
            err,
            FrameError::InvalidDimensions {
                width: 0,
                height: 4
            }
        );
    }

    #[test]
    fn view_rejects_short_buffer() {
        let data = [0u8; 11];
        let err = ColorImageView::new(2, 2, ChannelOrder::Rgb, &data).unwrap_err();
        assert_eq!(
            err,
            FrameError::BufferLength {
                expected: 12,
                got: 11
            }
        );
    }

    #[test]
    fn put_rgb_respects_channel_order() {
        let mut img = ColorImage::filled(2, 1, ChannelOrder::Bgr, [0, 0, 0]);
        img.put_rgb(1, 0, [10, 20, 30]);
        img.put_rgb(-1, 0, [255, 255, 255]);
        assert_eq!(img.data, vec![0, 0, 0, 30, 20, 10]);
        assert_eq!(img.view().pixel(1, 0), [30, 20, 10]);
    }

    #[test]
    fn mask_fill_rect_is_clipped() {
        let mut m = Mask::new(4, 4);
        m.fill_rect(2, 2, 10, 10);
        assert_eq!(m.count(), 4);
        assert!(m.get(3, 3));
        assert!(!m.get(1, 1));
    }
}
