/// Integer pixel rectangle `[x1, x2) x [y1, y2)` in frame coordinates.
///
/// Produced by the bounding-box mapper; always satisfies `x1 <= x2` and
/// `y1 <= y2`. A rectangle with zero width or height is degenerate and is
/// never handed to a redactor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PixelRect {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl PixelRect {
    pub fn new(x1: u32, y1: u32, x2: u32, y2: u32) -> Self {
        debug_assert!(x1 <= x2 && y1 <= y2, "PixelRect corners out of order");
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }

    pub fn is_degenerate(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    pub fn fits_within(&self, frame_width: u32, frame_height: u32) -> bool {
        self.x2 <= frame_width && self.y2 <= frame_height
    }
}
