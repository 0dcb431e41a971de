use ndarray::{s, ArrayView3, ArrayViewMut3};

use crate::shared::pixel_rect::PixelRect;

/// A decoded video frame: contiguous RGB bytes in row-major order.
///
/// Pixel format conversion happens in the video adapters; redaction code
/// only sees `height x width x channels` views.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    /// A frame filled with one RGB color.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3], index: usize) -> Self {
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 3)
            .collect();
        Self::new(data, width, height, 3, index)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    pub fn as_ndarray_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        ArrayViewMut3::from_shape(self.shape(), &mut self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Mutable view of the pixels covered by `rect`, clipped to the frame.
    pub fn region_mut(&mut self, rect: &PixelRect) -> ArrayViewMut3<'_, u8> {
        let (x1, y1, x2, y2) = self.clip(rect);
        self.as_ndarray_mut().slice_move(s![y1..y2, x1..x2, ..])
    }

    pub fn region(&self, rect: &PixelRect) -> ArrayView3<'_, u8> {
        let (x1, y1, x2, y2) = self.clip(rect);
        self.as_ndarray().slice_move(s![y1..y2, x1..x2, ..])
    }

    fn clip(&self, rect: &PixelRect) -> (usize, usize, usize, usize) {
        let w = self.width as usize;
        let h = self.height as usize;
        let x2 = (rect.x2 as usize).min(w);
        let y2 = (rect.y2 as usize).min(h);
        ((rect.x1 as usize).min(x2), (rect.y1 as usize).min(y2), x2, y2)
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 12]; // 2x2x3
        let frame = Frame::new(data.clone(), 2, 2, 3, 5);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.index(), 5);
        assert_eq!(frame.data(), &data[..]);
    }

    #[test]
    fn test_filled_repeats_color() {
        let frame = Frame::filled(2, 1, [1, 2, 3], 0);
        assert_eq!(frame.data(), &[1, 2, 3, 1, 2, 3]);
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * channels")]
    fn test_mismatched_data_length_panics_in_debug() {
        Frame::new(vec![0u8; 10], 2, 2, 3, 0);
    }

    #[test]
    fn test_as_ndarray_pixel_access() {
        // row=1, col=0, R
        let mut data = vec![0u8; 12];
        data[6] = 255;
        let frame = Frame::new(data, 2, 2, 3, 0);
        let arr = frame.as_ndarray();
        assert_eq!(arr.shape(), &[2, 2, 3]);
        assert_eq!(arr[[1, 0, 0]], 255);
        assert_eq!(arr[[1, 0, 1]], 0);
    }

    #[test]
    fn test_region_mut_writes_only_inside_rect() {
        let mut frame = Frame::filled(4, 4, [0, 0, 0], 0);
        frame
            .region_mut(&PixelRect::new(1, 1, 3, 2))
            .fill(9);
        let arr = frame.as_ndarray();
        assert_eq!(arr[[1, 1, 0]], 9);
        assert_eq!(arr[[1, 2, 2]], 9);
        assert_eq!(arr[[0, 1, 0]], 0);
        assert_eq!(arr[[2, 1, 0]], 0);
        assert_eq!(arr[[1, 3, 0]], 0);
    }

    #[test]
    fn test_region_is_clipped_to_frame() {
        let frame = Frame::filled(4, 3, [5, 5, 5], 0);
        let view = frame.region(&PixelRect::new(2, 1, 10, 10));
        assert_eq!(view.shape(), &[2, 2, 3]);
    }
}
