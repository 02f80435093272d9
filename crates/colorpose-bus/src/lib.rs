//! CAN output for colorpose detections.
//!
//! Every detection produces a frame on the `errors` channel carrying the
//! normalised centering error. When tilt or distance was computed, a second
//! frame on the `pose` channel carries `(tilt_rel, distance_m)`, with `NaN`
//! standing in for whichever value is missing. Payloads are two
//! little-endian `f32`.
//!
//! Publishing is best effort: failures are logged and counted, never
//! retried.

mod frame;
mod publish;
mod transmit;

pub use frame::{BusError, BusFrame, MAX_STANDARD_ID};
pub use publish::{detection_frames, publish_detection, ChannelMap, PublishReport};
pub use transmit::{BusTransmitter, LogTransmitter, RecordingTransmitter};
