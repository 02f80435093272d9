use colorpose_detect::Detection;
use serde::{Deserialize, Serialize};

use crate::frame::{BusError, BusFrame, MAX_STANDARD_ID};
use crate::transmit::BusTransmitter;

#[cfg(feature = "tracing")]
use tracing::instrument;

fn default_errors_id() -> u32 {
    0x100
}

fn default_pose_id() -> u32 {
    0x101
}

/// Frame identifiers used for detection output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMap {
    /// `(error_x_rel, error_y_rel)`, sent for every detection.
    #[serde(default = "default_errors_id")]
    pub errors: u32,
    /// `(tilt_rel, distance_m)`, sent when either was computed.
    #[serde(default = "default_pose_id")]
    pub pose: u32,
}

impl Default for ChannelMap {
    fn default() -> Self {
        Self {
            errors: default_errors_id(),
            pose: default_pose_id(),
        }
    }
}

impl ChannelMap {
    pub fn validate(&self) -> Result<(), BusError> {
        for id in [self.errors, self.pose] {
            if id > MAX_STANDARD_ID {
                return Err(BusError::InvalidId(id));
            }
        }
        Ok(())
    }
}

/// Frames produced for one detection.
pub fn detection_frames(
    channels: &ChannelMap,
    detection: &Detection,
) -> Result<Vec<BusFrame>, BusError> {
    let mut frames = vec![BusFrame::from_pair(
        channels.errors,
        detection.error_x_rel,
        detection.error_y_rel,
    )?];
    if detection.tilt.is_some() || detection.distance_m.is_some() {
        let tilt = detection.tilt.map(|t| t.tilt_rel).unwrap_or(f32::NAN);
        let distance = detection.distance_m.unwrap_or(f32::NAN);
        frames.push(BusFrame::from_pair(channels.pose, tilt, distance)?);
    }
    Ok(frames)
}

/// Outcome of a best-effort publish.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PublishReport {
    pub sent: usize,
    pub failed: usize,
}

/// Send `detection` on `tx`, logging failures instead of returning them.
#[cfg_attr(feature = "tracing", instrument(level = "debug", skip_all))]
pub fn publish_detection<T: BusTransmitter + ?Sized>(
    tx: &mut T,
    channels: &ChannelMap,
    detection: &Detection,
) -> PublishReport {
    let mut report = PublishReport::default();
    let frames = match detection_frames(channels, detection) {
        Ok(frames) => frames,
        Err(err) => {
            log::warn!("cannot encode detection: {err}");
            report.failed += 1;
            return report;
        }
    };
    for frame in &frames {
        match tx.send(frame) {
            Ok(()) => report.sent += 1,
            Err(err) => {
                log::warn!("failed to send frame 0x{:X}: {err}", frame.id());
                report.failed += 1;
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transmit::RecordingTransmitter;
    use colorpose_core::PixelRect;
    use colorpose_detect::TiltEstimate;

    fn detection() -> Detection {
        Detection {
            bbox: PixelRect::new(0, 0, 10, 10),
            area: 100,
            center_x: 5,
            center_y: 5,
            error_x_rel: -0.5,
            error_y_rel: 0.25,
            tilt: None,
            distance_m: None,
            degenerate: false,
        }
    }

    #[test]
    fn errors_only_when_nothing_else_computed() {
        let frames = detection_frames(&ChannelMap::default(), &detection()).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].id(), 0x100);
        assert_eq!(frames[0].values(), (-0.5, 0.25));
    }

    #[test]
    fn missing_distance_is_sent_as_nan() {
        let mut d = detection();
        d.tilt = Some(TiltEstimate {
            left_height: 20.0,
            right_height: 10.0,
            tilt_rel: 0.5,
        });
        let frames = detection_frames(&ChannelMap::default(), &d).unwrap();
        assert_eq!(frames[1].id(), 0x101);
        let (tilt, dist) = frames[1].values();
        assert_eq!(tilt, 0.5);
        assert!(dist.is_nan());

        d.tilt = None;
        d.distance_m = Some(0.8);
        let (tilt, dist) = detection_frames(&ChannelMap::default(), &d).unwrap()[1].values();
        assert!(tilt.is_nan());
        assert_eq!(dist, 0.8);
    }

    #[test]
    fn failures_are_counted_not_raised() {
        let mut d = detection();
        d.distance_m = Some(1.0);
        let mut tx = RecordingTransmitter::failing();
        let report = publish_detection(&mut tx, &ChannelMap::default(), &d);
        assert_eq!(report, PublishReport { sent: 0, failed: 2 });

        let bad = ChannelMap {
            errors: 0x100,
            pose: 0x1000,
        };
        assert_eq!(bad.validate(), Err(BusError::InvalidId(0x1000)));
        let mut ok_tx = RecordingTransmitter::new();
        let report = publish_detection(&mut ok_tx, &bad, &d);
        assert_eq!(report.failed, 1);
        assert!(ok_tx.frames().is_empty());
    }

    #[test]
    fn channel_map_json_defaults() {
        let map: ChannelMap = serde_json::from_str(r#"{"pose": 514}"#).unwrap();
        assert_eq!(map, ChannelMap { errors: 0x100, pose: 514 });
    }
}
