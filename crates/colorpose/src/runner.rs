//! Frame-by-frame tracking loop: detect, publish, count.

use std::fs;
use std::path::PathBuf;

use colorpose_bus::{publish_detection, BusTransmitter, ChannelMap, PublishReport};
use colorpose_core::ColorImageView;
use colorpose_detect::{DetectError, Detection, ObjectDetector};
use serde::Serialize;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::annotate::{annotate, AnnotateStyle};
use crate::detect::color_view;
use crate::error::AppError;
use crate::source::FrameSource;

/// Result of one tracker step.
#[derive(Clone, Debug, PartialEq)]
pub enum StepOutcome {
    Hit {
        detection: Detection,
        publish: PublishReport,
    },
    /// `streak` counts consecutive misses including this one.
    Miss { streak: u32 },
}

impl StepOutcome {
    pub fn detection(&self) -> Option<&Detection> {
        match self {
            StepOutcome::Hit { detection, .. } => Some(detection),
            StepOutcome::Miss { .. } => None,
        }
    }
}

/// Counters for a finished run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TrackSummary {
    pub frames: usize,
    pub hits: usize,
    pub misses: usize,
    /// Frames that could not be sent or encoded.
    pub bus_failures: usize,
}

/// Owns a detector and a transmitter and drives them frame by frame.
pub struct Tracker<T> {
    detector: ObjectDetector,
    transmitter: T,
    channels: ChannelMap,
    miss_warn_threshold: u32,
    miss_streak: u32,
    annotate_dir: Option<(PathBuf, AnnotateStyle)>,
}

impl<T: BusTransmitter> Tracker<T> {
    pub fn new(detector: ObjectDetector, transmitter: T) -> Self {
        Self {
            detector,
            transmitter,
            channels: ChannelMap::default(),
            miss_warn_threshold: 30,
            miss_streak: 0,
            annotate_dir: None,
        }
    }

    pub fn with_channels(mut self, channels: ChannelMap) -> Self {
        self.channels = channels;
        self
    }

    /// Warn once after `threshold` consecutive misses; `0` disables it.
    pub fn with_miss_warn_threshold(mut self, threshold: u32) -> Self {
        self.miss_warn_threshold = threshold;
        self
    }

    /// Write an annotated PNG per hit into `dir` during [`Tracker::run`].
    pub fn with_annotation_dir(mut self, dir: impl Into<PathBuf>, style: AnnotateStyle) -> Self {
        self.annotate_dir = Some((dir.into(), style));
        self
    }

    pub fn detector(&self) -> &ObjectDetector {
        &self.detector
    }

    pub fn transmitter(&self) -> &T {
        &self.transmitter
    }

    pub fn into_transmitter(self) -> T {
        self.transmitter
    }

    pub fn miss_streak(&self) -> u32 {
        self.miss_streak
    }

    /// Detect on one frame and publish the result.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, frame), fields(width = frame.width, height = frame.height))
    )]
    pub fn step(&mut self, frame: &ColorImageView<'_>) -> Result<StepOutcome, DetectError> {
        match self.detector.detect(frame)? {
            Some(detection) => {
                if self.miss_warn_threshold > 0 && self.miss_streak >= self.miss_warn_threshold {
                    log::info!("target reacquired after {} missed frame(s)", self.miss_streak);
                }
                self.miss_streak = 0;
                log::debug!(
                    "errX:{:.3} errY:{:.3} tilt:{:.3} height:{}px dist:{:?}",
                    detection.error_x_rel,
                    detection.error_y_rel,
                    detection.tilt_rel(),
                    detection.bbox.height,
                    detection.distance_m
                );
                let publish = publish_detection(&mut self.transmitter, &self.channels, &detection);
                Ok(StepOutcome::Hit { detection, publish })
            }
            None => {
                self.miss_streak = self.miss_streak.saturating_add(1);
                if self.miss_warn_threshold > 0 && self.miss_streak == self.miss_warn_threshold {
                    log::warn!("no target for {} consecutive frame(s)", self.miss_streak);
                }
                Ok(StepOutcome::Miss {
                    streak: self.miss_streak,
                })
            }
        }
    }

    /// Drain `source`, returning the counters. Source, detector and file
    /// errors stop the run; bus failures do not.
    pub fn run<S: FrameSource + ?Sized>(&mut self, source: &mut S) -> Result<TrackSummary, AppError> {
        if let Some((dir, _)) = &self.annotate_dir {
            fs::create_dir_all(dir)?;
        }
        let mut summary = TrackSummary::default();
        while let Some(frame) = source.next_frame()? {
            let outcome = self.step(&color_view(&frame.image))?;
            summary.frames += 1;
            match &outcome {
                StepOutcome::Hit { detection, publish } => {
                    summary.hits += 1;
                    summary.bus_failures += publish.failed;
                    if let Some((dir, style)) = &self.annotate_dir {
                        let out = annotate(&frame.image, detection, style);
                        out.save(dir.join(frame.output_file_name("png")))?;
                    }
                }
                StepOutcome::Miss { .. } => summary.misses += 1,
            }
        }
        log::info!(
            "tracked {} frame(s): {} hit(s), {} miss(es), {} bus failure(s)",
            summary.frames,
            summary.hits,
            summary.misses,
            summary.bus_failures
        );
        Ok(summary)
    }
}
