//! Diagnostic overlay for a detection, drawn with `imageproc`.

use ::image::{Rgb, RgbImage};
use ab_glyph::{FontRef, PxScale};
use colorpose_detect::Detection;
use imageproc::drawing::{
    draw_filled_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut, draw_text_mut, text_size,
};
use imageproc::rect::Rect;
use serde::{Deserialize, Serialize};

const GREEN: Rgb<u8> = Rgb([0, 255, 0]);
const RED: Rgb<u8> = Rgb([255, 0, 0]);
const YELLOW: Rgb<u8> = Rgb([255, 255, 0]);
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

static OVERLAY_FONT: &[u8] = include_bytes!("../assets/DejaVuSansMono.ttf");

/// What to draw and how thick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotateStyle {
    /// Vertical lines at the quarter columns used for tilt.
    pub guides: bool,
    /// `L:.. R:.. T:..` readout above the box.
    pub text: bool,
    /// Arrow from the center towards the side that looks closer.
    pub arrow: bool,
    pub thickness: u32,
    pub center_radius: u32,
    /// Text height in pixels.
    pub text_scale: f32,
}

impl Default for AnnotateStyle {
    fn default() -> Self {
        Self {
            guides: true,
            text: true,
            arrow: true,
            thickness: 2,
            center_radius: 5,
            text_scale: 14.0,
        }
    }
}

/// Draw `detection` onto a copy of `img`.
pub fn annotate(img: &RgbImage, detection: &Detection, style: &AnnotateStyle) -> RgbImage {
    let mut out = img.clone();
    let b = detection.bbox;
    let (x, y, w, h) = (b.x as i32, b.y as i32, b.width as i32, b.height as i32);
    let t = style.thickness.max(1) as i32;

    // Box, drawn inwards from the outline.
    for i in 0..t {
        let (iw, ih) = (w - 2 * i, h - 2 * i);
        if iw <= 0 || ih <= 0 {
            break;
        }
        draw_hollow_rect_mut(
            &mut out,
            Rect::at(x + i, y + i).of_size(iw as u32, ih as u32),
            GREEN,
        );
    }

    let center = (detection.center_x as i32, detection.center_y as i32);
    draw_filled_circle_mut(&mut out, center, style.center_radius as i32, RED);

    if style.guides {
        for gx in [x + w / 4, x + 3 * w / 4] {
            draw_line_segment_mut(
                &mut out,
                (gx as f32, y as f32),
                (gx as f32, (y + h - 1) as f32),
                YELLOW,
            );
        }
    }

    if style.text {
        let label = overlay_text(detection);
        if !label.is_empty() {
            draw_label(&mut out, &label, x, y, style.text_scale);
        }
    }

    if style.arrow {
        if let Some(tilt) = detection.tilt {
            let len = (tilt.tilt_rel.abs().min(1.0) * 0.2 * w as f32).round() as i32;
            if len > 0 {
                // Positive tilt: left side taller, so it points left.
                let dir = if tilt.tilt_rel > 0.0 { -1 } else { 1 };
                let tip = (center.0 + dir * len, center.1);
                draw_arrow(&mut out, center, tip, t);
            }
        }
    }

    out
}

/// Text readout drawn above the box.
pub fn overlay_text(detection: &Detection) -> String {
    let mut s = match detection.tilt {
        Some(t) => format!(
            "L:{:.1} R:{:.1} T:{:.2}",
            t.left_height, t.right_height, t.tilt_rel
        ),
        None => String::new(),
    };
    if let Some(d) = detection.distance_m {
        if !s.is_empty() {
            s.push(' ');
        }
        s.push_str(&format!("D:{d:.2}m"));
    }
    s
}

fn draw_label(img: &mut RgbImage, label: &str, x: i32, y: i32, scale: f32) {
    let font = match FontRef::try_from_slice(OVERLAY_FONT) {
        Ok(font) => font,
        Err(err) => {
            log::warn!("overlay font unusable, skipping text: {err}");
            return;
        }
    };
    let scale = PxScale::from(scale);
    let (tw, th) = text_size(scale, &font, label);
    let tx = x.min(img.width() as i32 - tw as i32).max(0);
    let ty = (y - th as i32 - 4).max(0);
    draw_text_mut(img, WHITE, tx, ty, scale, &font, label);
}

/// Horizontal or slanted arrow `thickness` rows thick.
fn draw_arrow(img: &mut RgbImage, from: (i32, i32), tip: (i32, i32), thickness: i32) {
    let len = (tip.0 - from.0).abs().max((tip.1 - from.1).abs());
    let head = (len / 3).max(2);
    let back = if tip.0 > from.0 { -head } else { head };
    let wings = [(tip.0 + back, tip.1 - head), (tip.0 + back, tip.1 + head)];

    let (r0, r1) = (-(thickness - 1) / 2, thickness / 2);
    for o in r0..=r1 {
        let shift = |(px, py): (i32, i32)| (px as f32, (py + o) as f32);
        draw_line_segment_mut(img, shift(from), shift(tip), YELLOW);
        for wing in wings {
            draw_line_segment_mut(img, shift(tip), shift(wing), YELLOW);
        }
    }
}
