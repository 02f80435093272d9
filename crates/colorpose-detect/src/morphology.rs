//! Binary morphology with a square structuring element.
//!
//! Out-of-frame samples are skipped rather than padded, so erosion never eats
//! into a blob from the frame border and dilation never grows one from it.
//! All-background and all-foreground masks are fixed points of every
//! operation here.

use colorpose_core::Mask;

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(Clone, Copy)]
enum Op {
    Erode,
    Dilate,
}

/// Separable `k x k` min/max filter: a row pass, then a column pass.
fn square_filter(mask: &Mask, kernel_size: usize, op: Op) -> Mask {
    let r = kernel_size / 2;
    if r == 0 || mask.data.is_empty() {
        return mask.clone();
    }
    let (w, h) = (mask.width, mask.height);
    let combine = |acc: bool, v: bool| match op {
        Op::Erode => acc && v,
        Op::Dilate => acc || v,
    };
    let init = matches!(op, Op::Erode);

    let mut rows = Mask::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let x0 = x.saturating_sub(r);
            let x1 = (x + r).min(w - 1);
            let v = (x0..=x1).fold(init, |acc, xx| combine(acc, mask.get(xx, y)));
            rows.set(x, y, v);
        }
    }

    let mut out = Mask::new(w, h);
    for y in 0..h {
        let y0 = y.saturating_sub(r);
        let y1 = (y + r).min(h - 1);
        for x in 0..w {
            let v = (y0..=y1).fold(init, |acc, yy| combine(acc, rows.get(x, yy)));
            out.set(x, y, v);
        }
    }
    out
}

/// A pixel stays set only if every in-frame pixel of its `k x k`
/// neighbourhood is set.
pub fn erode(mask: &Mask, kernel_size: usize) -> Mask {
    square_filter(mask, kernel_size, Op::Erode)
}

/// A pixel becomes set if any in-frame pixel of its `k x k` neighbourhood
/// is set.
pub fn dilate(mask: &Mask, kernel_size: usize) -> Mask {
    square_filter(mask, kernel_size, Op::Dilate)
}

/// Erosion then dilation: removes specks narrower than the kernel.
pub fn open(mask: &Mask, kernel_size: usize) -> Mask {
    dilate(&erode(mask, kernel_size), kernel_size)
}

/// Dilation then erosion: fills gaps narrower than the kernel.
pub fn close(mask: &Mask, kernel_size: usize) -> Mask {
    erode(&dilate(mask, kernel_size), kernel_size)
}

/// Opening followed by closing with the same element.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(mask), fields(width = mask.width, height = mask.height))
)]
pub fn clean(mask: &Mask, kernel_size: usize) -> Mask {
    close(&open(mask, kernel_size), kernel_size)
}
