use crate::shared::frame::Frame;
use crate::shared::pixel_rect::PixelRect;

/// Domain interface for obscuring rectangular regions of a frame.
///
/// Implementations modify the frame in place. Every rectangle they receive
/// is non-degenerate and lies inside the frame; redaction cannot fail.
pub trait RegionRedactor: Send {
    fn redact(&self, frame: &mut Frame, rects: &[PixelRect]);
}
