//! Frame sources feeding the tracker.

use std::fs;
use std::path::{Path, PathBuf};

use ::image::RgbImage;

use crate::detect::load_frame;
use crate::error::AppError;
use crate::rotation::Rotation;

const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "bmp", "tif", "tiff"];

/// One frame handed to the tracker.
#[derive(Clone, Debug)]
pub struct SourceFrame {
    pub index: usize,
    /// Short name used when writing per-frame outputs.
    pub name: String,
    pub image: RgbImage,
}

impl SourceFrame {
    /// `{index:05}_{name}.{extension}`; unique within one run even when two
    /// files share a stem.
    pub fn output_file_name(&self, extension: &str) -> String {
        format!("{:05}_{}.{extension}", self.index, self.name)
    }
}

/// Supplies consecutive frames; `Ok(None)` marks the end of the stream.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<SourceFrame>, AppError>;
}

/// Image files of a directory, read in lexical file-name order.
#[derive(Clone, Debug)]
pub struct ImageSequence {
    paths: Vec<PathBuf>,
    next: usize,
    rotation: Rotation,
}

impl ImageSequence {
    /// List the image files in `dir`. Fails when there are none.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, AppError> {
        let dir = dir.as_ref();
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && has_image_extension(&path) {
                paths.push(path);
            }
        }
        if paths.is_empty() {
            return Err(AppError::EmptySequence(dir.to_path_buf()));
        }
        paths.sort();
        log::debug!("{} image(s) in {}", paths.len(), dir.display());
        Ok(Self::from_paths(paths))
    }

    pub fn from_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            paths,
            next: 0,
            rotation: Rotation::None,
        }
    }

    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

impl FrameSource for ImageSequence {
    fn next_frame(&mut self) -> Result<Option<SourceFrame>, AppError> {
        let Some(path) = self.paths.get(self.next) else {
            return Ok(None);
        };
        let index = self.next;
        self.next += 1;

        let image = self.rotation.apply(&load_frame(path)?);
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("frame_{index:05}"));
        Ok(Some(SourceFrame { index, name, image }))
    }
}

/// In-memory frames, mainly for tests and replay.
#[derive(Clone, Debug, Default)]
pub struct VecSource {
    frames: std::collections::VecDeque<RgbImage>,
    served: usize,
}

impl VecSource {
    pub fn new(frames: impl IntoIterator<Item = RgbImage>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            served: 0,
        }
    }
}

impl FrameSource for VecSource {
    fn next_frame(&mut self) -> Result<Option<SourceFrame>, AppError> {
        Ok(self.frames.pop_front().map(|image| {
            let index = self.served;
            self.served += 1;
            SourceFrame {
                index,
                name: format!("frame_{index:05}"),
                image,
            }
        }))
    }
}
