use ndarray::{s, ArrayViewMut3, Axis};

use crate::redaction::domain::region_redactor::RegionRedactor;
use crate::shared::constants::DEFAULT_PIXELATION_BLOCKS;
use crate::shared::frame::Frame;
use crate::shared::pixel_rect::PixelRect;

/// Block-mean pixelation.
///
/// Splits each region into a `block_count x block_count` grid and flat-fills
/// every cell with its per-channel mean, truncated to an integer.
pub struct PixelateFilter {
    block_count: u32,
}

impl PixelateFilter {
    pub fn new(block_count: u32) -> Self {
        debug_assert!(block_count > 0, "block_count must be positive");
        Self { block_count }
    }
}

impl Default for PixelateFilter {
    fn default() -> Self {
        Self::new(DEFAULT_PIXELATION_BLOCKS)
    }
}

impl RegionRedactor for PixelateFilter {
    fn redact(&self, frame: &mut Frame, rects: &[PixelRect]) {
        for rect in rects {
            apply(frame, rect, self.block_count);
        }
    }
}

/// Pixelates `rect` of `frame` in place. Degenerate rectangles are a no-op.
pub fn apply(frame: &mut Frame, rect: &PixelRect, block_count: u32) {
    if rect.is_degenerate() || block_count == 0 {
        return;
    }
    pixelate(frame.region_mut(rect), block_count as usize);
}

/// Cell boundaries `k * len / blocks` for `k = 0..=blocks`.
///
/// Neighbouring cells differ in size by at most one pixel; when `len` is
/// smaller than `blocks` some cells are empty.
fn boundaries(len: usize, blocks: usize) -> Vec<usize> {
    (0..=blocks).map(|k| k * len / blocks).collect()
}

fn pixelate(mut region: ArrayViewMut3<'_, u8>, blocks: usize) {
    let (height, width, channels) = region.dim();
    if height == 0 || width == 0 {
        return;
    }
    let ys = boundaries(height, blocks);
    let xs = boundaries(width, blocks);

    for rows in ys.windows(2) {
        for cols in xs.windows(2) {
            let (y0, y1, x0, x1) = (rows[0], rows[1], cols[0], cols[1]);
            if y0 == y1 || x0 == x1 {
                continue;
            }
            let count = ((y1 - y0) * (x1 - x0)) as u64;
            let mut cell = region.slice_mut(s![y0..y1, x0..x1, ..]);
            for c in 0..channels {
                let mut plane = cell.index_axis_mut(Axis(2), c);
                let sum: u64 = plane.iter().map(|&v| v as u64).sum();
                plane.fill((sum / count) as u8);
            }
        }
    }
}
