//! Transmitter seam and the implementations shipped with the workspace.

use crate::frame::{BusError, BusFrame};

/// Something that puts frames on a bus.
///
/// Implementations report failures; they do not retry.
pub trait BusTransmitter {
    fn send(&mut self, frame: &BusFrame) -> Result<(), BusError>;
}

impl<T: BusTransmitter + ?Sized> BusTransmitter for &mut T {
    fn send(&mut self, frame: &BusFrame) -> Result<(), BusError> {
        (**self).send(frame)
    }
}

impl<T: BusTransmitter + ?Sized> BusTransmitter for Box<T> {
    fn send(&mut self, frame: &BusFrame) -> Result<(), BusError> {
        (**self).send(frame)
    }
}

/// Keeps every frame in memory.
#[derive(Clone, Debug, Default)]
pub struct RecordingTransmitter {
    frames: Vec<BusFrame>,
    failing: bool,
}

impl RecordingTransmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transmitter whose every send fails, as with a bus in error-passive
    /// state.
    pub fn failing() -> Self {
        Self {
            frames: Vec::new(),
            failing: true,
        }
    }

    pub fn set_failing(&mut self, failing: bool) {
        self.failing = failing;
    }

    pub fn frames(&self) -> &[BusFrame] {
        &self.frames
    }

    pub fn take(&mut self) -> Vec<BusFrame> {
        std::mem::take(&mut self.frames)
    }
}

impl BusTransmitter for RecordingTransmitter {
    fn send(&mut self, frame: &BusFrame) -> Result<(), BusError> {
        if self.failing {
            return Err(BusError::Transmit("recording transmitter set to fail".into()));
        }
        self.frames.push(*frame);
        Ok(())
    }
}

/// Logs each frame at `info` level and never fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogTransmitter;

impl BusTransmitter for LogTransmitter {
    fn send(&mut self, frame: &BusFrame) -> Result<(), BusError> {
        log::info!("sent: {frame}");
        Ok(())
    }
}
