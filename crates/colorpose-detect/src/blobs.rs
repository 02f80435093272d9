//! Connected-component extraction and candidate selection.

use colorpose_core::{Mask, PixelRect};
use serde::{Deserialize, Serialize};

use crate::profile::{ColorProfile, SelectionPolicy};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// One external 8-connected foreground region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobCandidate {
    /// Position in scan order (0 = first region met in raster order).
    pub label: usize,
    pub bbox: PixelRect,
    /// Pixels enclosed by the outer border, holes included.
    pub area: u64,
}

impl BlobCandidate {
    /// Bounding-box aspect ratio `w / h`.
    #[inline]
    pub fn aspect(&self) -> f32 {
        self.bbox.aspect()
    }
}

const NEIGHBOURS: [(isize, isize); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

const EDGE_NEIGHBOURS: [(isize, isize); 4] = [(0, -1), (-1, 0), (1, 0), (0, 1)];

fn neighbour(
    (x, y): (usize, usize),
    (dx, dy): (isize, isize),
    w: usize,
    h: usize,
) -> Option<usize> {
    let nx = x.checked_add_signed(dx).filter(|&nx| nx < w)?;
    let ny = y.checked_add_signed(dy).filter(|&ny| ny < h)?;
    Some(ny * w + nx)
}

/// Background pixels 4-connected to the frame border. Everything else is
/// foreground or a hole inside foreground.
fn outside_background(mask: &Mask) -> Vec<bool> {
    let (w, h) = (mask.width, mask.height);
    let mut outside = vec![false; w * h];
    let mut stack: Vec<usize> = (0..w * h)
        .filter(|&i| {
            let (x, y) = (i % w, i / w);
            (x == 0 || y == 0 || x + 1 == w || y + 1 == h) && mask.data[i] == 0
        })
        .collect();
    for &i in &stack {
        outside[i] = true;
    }

    while let Some(idx) = stack.pop() {
        for d in EDGE_NEIGHBOURS {
            let Some(n) = neighbour((idx % w, idx / w), d, w, h) else {
                continue;
            };
            if !outside[n] && mask.data[n] == 0 {
                outside[n] = true;
                stack.push(n);
            }
        }
    }
    outside
}

/// Enumerate external 8-connected foreground regions.
///
/// Holes are filled before labelling, so anything nested inside another
/// region's hole belongs to that region and `area` counts the enclosed
/// pixels. Regions are returned in raster order of their first pixel (top to
/// bottom, then left to right), which is also the tie-break order used by
/// [`select`].
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(mask), fields(width = mask.width, height = mask.height))
)]
pub fn find_blobs(mask: &Mask) -> Vec<BlobCandidate> {
    let (w, h) = (mask.width, mask.height);
    let outside = outside_background(mask);
    let mut visited = vec![false; w * h];
    let mut stack = Vec::new();
    let mut out = Vec::new();

    for start in 0..w * h {
        if visited[start] || outside[start] {
            continue;
        }
        visited[start] = true;
        stack.push(start);

        let mut bbox = PixelRect::default();
        let mut area = 0u64;
        while let Some(idx) = stack.pop() {
            let (x, y) = (idx % w, idx / w);
            bbox.include(x as u32, y as u32);
            area += 1;
            for d in NEIGHBOURS {
                let Some(n) = neighbour((x, y), d, w, h) else {
                    continue;
                };
                if !visited[n] && !outside[n] {
                    visited[n] = true;
                    stack.push(n);
                }
            }
        }

        out.push(BlobCandidate {
            label: out.len(),
            bbox,
            area,
        });
    }

    out
}

/// Pick the best candidate under `profile`'s area floor and selection policy.
///
/// Ties keep the earliest candidate in scan order.
pub fn select(candidates: &[BlobCandidate], profile: &ColorProfile) -> Option<BlobCandidate> {
    let survivors = candidates.iter().filter(|c| c.area >= profile.min_area);

    let best = match profile.selection {
        SelectionPolicy::MaxArea => first_max_by_key(survivors, |c| c.area),
        SelectionPolicy::ShapeFiltered {
            min_aspect,
            max_aspect,
        } => first_max_by_key(
            survivors.filter(|c| {
                let aspect = c.aspect();
                (min_aspect..=max_aspect).contains(&aspect)
            }),
            |c| c.bbox.area(),
        ),
    };

    if best.is_none() && !candidates.is_empty() {
        log::debug!(
            "{} blob(s) found for profile `{}`, none passed the filters",
            candidates.len(),
            profile.name
        );
    }
    best.copied()
}

/// Like `Iterator::max_by_key`, but keeps the *first* maximum.
fn first_max_by_key<'a, I, F>(iter: I, key: F) -> Option<&'a BlobCandidate>
where
    I: Iterator<Item = &'a BlobCandidate>,
    F: Fn(&BlobCandidate) -> u64,
{
    let mut best: Option<(&BlobCandidate, u64)> = None;
    for c in iter {
        let k = key(c);
        if best.map(|(_, bk)| k > bk).unwrap_or(true) {
            best = Some((c, k));
        }
    }
    best.map(|(c, _)| c)
}
