use ndarray::Axis;
use serde::{Deserialize, Serialize};

use crate::redaction::domain::region_redactor::RegionRedactor;
use crate::shared::constants::{DEFAULT_OUTLINE_COLOR, DEFAULT_OUTLINE_THICKNESS};
use crate::shared::frame::Frame;
use crate::shared::pixel_rect::PixelRect;

/// Border drawn around each redacted region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineStyle {
    pub thickness: u32,
    pub color: [u8; 3],
}

impl Default for OutlineStyle {
    fn default() -> Self {
        Self {
            thickness: DEFAULT_OUTLINE_THICKNESS,
            color: DEFAULT_OUTLINE_COLOR,
        }
    }
}

/// Decorator that draws an outline on top of another redactor's output.
///
/// Useful for reviewing which regions were redacted. The border is drawn
/// inside each rectangle so it never touches pixels outside it.
pub struct OutlinedRedactor {
    inner: Box<dyn RegionRedactor>,
    style: OutlineStyle,
}

impl OutlinedRedactor {
    pub fn new(inner: Box<dyn RegionRedactor>, style: OutlineStyle) -> Self {
        Self { inner, style }
    }
}

impl RegionRedactor for OutlinedRedactor {
    fn redact(&self, frame: &mut Frame, rects: &[PixelRect]) {
        self.inner.redact(frame, rects);
        for rect in rects {
            draw_outline(frame, rect, &self.style);
        }
    }
}

fn draw_outline(frame: &mut Frame, rect: &PixelRect, style: &OutlineStyle) {
    if rect.is_degenerate() || style.thickness == 0 {
        return;
    }
    let t = style.thickness;
    let top = PixelRect::new(rect.x1, rect.y1, rect.x2, (rect.y1 + t).min(rect.y2));
    let bottom = PixelRect::new(rect.x1, rect.y2.saturating_sub(t).max(rect.y1), rect.x2, rect.y2);
    let left = PixelRect::new(rect.x1, rect.y1, (rect.x1 + t).min(rect.x2), rect.y2);
    let right = PixelRect::new(rect.x2.saturating_sub(t).max(rect.x1), rect.y1, rect.x2, rect.y2);

    for band in [top, bottom, left, right] {
        let mut view = frame.region_mut(&band);
        for mut pixel in view.lanes_mut(Axis(2)) {
            for (dst, &src) in pixel.iter_mut().zip(style.color.iter()) {
                *dst = src;
            }
        }
    }
}
