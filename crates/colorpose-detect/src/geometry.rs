use colorpose_core::{Mask, PixelRect};

use crate::blobs::BlobCandidate;

/// Bounding box, integer center and per-column height profile of a blob.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Geometry {
    pub bbox: PixelRect,
    pub area: u64,
    pub center_x: u32,
    pub center_y: u32,
    /// One entry per box column: span between the lowest and highest
    /// foreground row in that column, `0` for empty columns.
    pub column_heights: Vec<u32>,
}

/// Measure a selected candidate against the mask it came from.
///
/// Every foreground pixel inside the bounding box counts towards the column
/// profile, not only the candidate's own pixels.
pub fn extract(candidate: &BlobCandidate, mask: &Mask) -> Geometry {
    let bbox = candidate.bbox;
    let (center_x, center_y) = bbox.center();
    let x0 = bbox.x as usize;
    let y0 = bbox.y as usize;
    let x1 = (x0 + bbox.width as usize).min(mask.width);
    let y1 = (y0 + bbox.height as usize).min(mask.height);

    let column_heights = (x0..x0 + bbox.width as usize)
        .map(|x| {
            if x >= x1 {
                return 0;
            }
            let mut rows = (y0..y1).filter(|&y| mask.get(x, y));
            match rows.next() {
                Some(top) => {
                    let bottom = rows.last().unwrap_or(top);
                    (bottom - top) as u32
                }
                None => 0,
            }
        })
        .collect();

    Geometry {
        bbox,
        area: candidate.area,
        center_x,
        center_y,
        column_heights,
    }
}
