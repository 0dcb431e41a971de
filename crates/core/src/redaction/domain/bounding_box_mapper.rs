use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::detection::domain::detection::NormalizedBox;
use crate::shared::constants::{DEFAULT_MARGIN_HEIGHT_DIVISOR, DEFAULT_MARGIN_WIDTH_DIVISOR};
use crate::shared::pixel_rect::PixelRect;

/// How an expanded rectangle that crosses a frame edge is handled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClampPolicy {
    /// Clip the rectangle to the frame.
    #[default]
    Clamp,
    /// Drop any rectangle that is not already fully inside the frame.
    Reject,
}

impl FromStr for ClampPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "clamp" => Ok(ClampPolicy::Clamp),
            "reject" => Ok(ClampPolicy::Reject),
            other => Err(format!("clamp policy must be 'clamp' or 'reject', got '{other}'")),
        }
    }
}

/// Expansion applied on every side of a detected box.
///
/// Margins are integer fractions of the frame: `frame_width / width_divisor`
/// horizontally and `frame_height / height_divisor` vertically.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MarginPolicy {
    pub width_divisor: u32,
    pub height_divisor: u32,
}

impl MarginPolicy {
    pub fn new(width_divisor: u32, height_divisor: u32) -> Self {
        debug_assert!(width_divisor > 0 && height_divisor > 0);
        Self {
            width_divisor,
            height_divisor,
        }
    }

    pub fn margins(&self, frame_width: u32, frame_height: u32) -> (i64, i64) {
        (
            (frame_width / self.width_divisor.max(1)) as i64,
            (frame_height / self.height_divisor.max(1)) as i64,
        )
    }
}

impl Default for MarginPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MARGIN_WIDTH_DIVISOR, DEFAULT_MARGIN_HEIGHT_DIVISOR)
    }
}

/// Expanded box in pixel space before any clamping; may be negative or
/// extend past the frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExpandedRect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

/// Converts normalized detector boxes into pixel rectangles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BoundingBoxMapper {
    margin: MarginPolicy,
    clamp: ClampPolicy,
}

impl BoundingBoxMapper {
    pub fn new(margin: MarginPolicy, clamp: ClampPolicy) -> Self {
        Self { margin, clamp }
    }

    /// Scales `b` to pixels (truncating) and grows it by the margin on all sides.
    pub fn expand(&self, b: &NormalizedBox, frame_width: u32, frame_height: u32) -> ExpandedRect {
        let (mw, mh) = self.margin.margins(frame_width, frame_height);
        let fw = frame_width as f64;
        let fh = frame_height as f64;
        ExpandedRect {
            x: (b.left * fw) as i64 - mw,
            y: (b.top * fh) as i64 - mh,
            width: (b.width * fw) as i64 + 2 * mw,
            height: (b.height * fh) as i64 + 2 * mh,
        }
    }

    /// Maps `b` to a pixel rectangle inside `frame_width x frame_height`.
    ///
    /// Returns `None` only under [`ClampPolicy::Reject`] when the expanded
    /// box leaves the frame. The returned rectangle may be degenerate.
    pub fn map(&self, b: &NormalizedBox, frame_width: u32, frame_height: u32) -> Option<PixelRect> {
        let e = self.expand(b, frame_width, frame_height);
        let fw = frame_width as i64;
        let fh = frame_height as i64;

        match self.clamp {
            ClampPolicy::Clamp => {
                let x1 = e.x.clamp(0, fw);
                let y1 = e.y.clamp(0, fh);
                // Extent is kept from the clamped corner, so a box pushed
                // past the top or left edge keeps its full width and height.
                let x2 = (x1 + e.width).clamp(x1, fw);
                let y2 = (y1 + e.height).clamp(y1, fh);
                Some(PixelRect::new(x1 as u32, y1 as u32, x2 as u32, y2 as u32))
            }
            ClampPolicy::Reject => {
                let inside = e.x >= 0
                    && e.y >= 0
                    && e.width >= 0
                    && e.height >= 0
                    && e.x + e.width <= fw
                    && e.y + e.height <= fh;
                inside.then(|| {
                    PixelRect::new(
                        e.x as u32,
                        e.y as u32,
                        (e.x + e.width) as u32,
                        (e.y + e.height) as u32,
                    )
                })
            }
        }
    }
}
