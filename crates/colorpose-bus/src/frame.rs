use std::fmt;

/// Largest identifier representable in an 11-bit standard frame.
pub const MAX_STANDARD_ID: u32 = 0x7FF;

/// Bus-level failures.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    #[error("frame id 0x{0:X} does not fit a standard 11-bit identifier")]
    InvalidId(u32),
    #[error("transmit failed: {0}")]
    Transmit(String),
}

/// Standard (non-extended) data frame carrying two little-endian `f32`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BusFrame {
    id: u32,
    data: [u8; 8],
}

impl BusFrame {
    pub fn new(id: u32, data: [u8; 8]) -> Result<Self, BusError> {
        if id > MAX_STANDARD_ID {
            return Err(BusError::InvalidId(id));
        }
        Ok(Self { id, data })
    }

    /// Pack `a` into bytes 0..4 and `b` into bytes 4..8.
    pub fn from_pair(id: u32, a: f32, b: f32) -> Result<Self, BusError> {
        let mut data = [0u8; 8];
        data[..4].copy_from_slice(&a.to_le_bytes());
        data[4..].copy_from_slice(&b.to_le_bytes());
        Self::new(id, data)
    }

    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[inline]
    pub fn data(&self) -> &[u8; 8] {
        &self.data
    }

    pub fn values(&self) -> (f32, f32) {
        let [a0, a1, a2, a3, b0, b1, b2, b3] = self.data;
        (
            f32::from_le_bytes([a0, a1, a2, a3]),
            f32::from_le_bytes([b0, b1, b2, b3]),
        )
    }

    /// Payload as lowercase hex without separators.
    pub fn hex(&self) -> String {
        self.data.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Display for BusFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (a, b) = self.values();
        write!(f, "ID=0x{:X}, v1={}, v2={}, bytes={}", self.id, a, b, self.hex())
    }
}
