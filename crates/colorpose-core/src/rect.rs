use serde::{Deserialize, Serialize};

/// Axis-aligned pixel rectangle: top-left corner plus size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// `width * height`, widened so large boxes cannot overflow.
    #[inline]
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// `width / height`; zero for an empty box.
    #[inline]
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            return 0.0;
        }
        self.width as f32 / self.height as f32
    }

    /// Integer (floor) center, matching `x + w // 2`.
    #[inline]
    pub fn center(&self) -> (u32, u32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    /// Grow the box to include pixel `(px, py)`.
    pub fn include(&mut self, px: u32, py: u32) {
        if self.width == 0 || self.height == 0 {
            *self = Self::new(px, py, 1, 1);
            return;
        }
        let x1 = (self.x + self.width).max(px + 1);
        let y1 = (self.y + self.height).max(py + 1);
        self.x = self.x.min(px);
        self.y = self.y.min(py);
        self.width = x1 - self.x;
        self.height = y1 - self.y;
    }
}
