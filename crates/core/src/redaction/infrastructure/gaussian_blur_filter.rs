use crate::redaction::domain::region_redactor::RegionRedactor;
use crate::shared::constants::{DEFAULT_GAUSSIAN_KERNEL_SIZE, DEFAULT_GAUSSIAN_SIGMA};
use crate::shared::frame::Frame;
use crate::shared::pixel_rect::PixelRect;

use super::gaussian;

/// Gaussian blur of each region with a fixed kernel.
///
/// Only pixels inside a region feed its blur, so nothing outside the
/// detection bleeds in and the surrounding frame stays untouched.
pub struct GaussianBlurFilter {
    kernel: Vec<f32>,
}

impl GaussianBlurFilter {
    pub fn new(kernel_size: usize, sigma: f64) -> Self {
        Self {
            kernel: gaussian::gaussian_kernel_1d(kernel_size, sigma),
        }
    }

    pub fn kernel_size(&self) -> usize {
        self.kernel.len()
    }
}

impl Default for GaussianBlurFilter {
    fn default() -> Self {
        Self::new(DEFAULT_GAUSSIAN_KERNEL_SIZE, DEFAULT_GAUSSIAN_SIGMA)
    }
}

impl RegionRedactor for GaussianBlurFilter {
    fn redact(&self, frame: &mut Frame, rects: &[PixelRect]) {
        for rect in rects.iter().filter(|r| !r.is_degenerate()) {
            gaussian::blur_in_place(frame.region_mut(rect), &self.kernel);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_kernel() {
        assert_eq!(GaussianBlurFilter::default().kernel_size(), 99);
    }

    #[test]
    fn test_blurs_inside_region_only() {
        let mut frame = Frame::filled(60, 60, [0, 0, 0], 0);
        {
            let mut arr = frame.as_ndarray_mut();
            for y in 20..25 {
                for x in 20..25 {
                    arr[[y, x, 0]] = 255;
                }
            }
            // Bright pixel outside the blurred region
            arr[[55, 55, 0]] = 255;
        }

        let filter = GaussianBlurFilter::new(9, 3.0);
        filter.redact(&mut frame, &[PixelRect::new(10, 10, 40, 40)]);

        let arr = frame.as_ndarray();
        assert!(arr[[19, 22, 0]] > 0, "blur should spread to adjacent pixels");
        assert!(arr[[22, 22, 0]] < 255);
        assert_eq!(arr[[55, 55, 0]], 255);
        assert_eq!(arr[[5, 5, 0]], 0);
    }

    #[test]
    fn test_degenerate_rect_skipped() {
        let mut frame = Frame::filled(20, 20, [10, 20, 30], 0);
        frame.as_ndarray_mut()[[5, 5, 0]] = 250;
        let original = frame.clone();
        GaussianBlurFilter::new(5, 1.0).redact(&mut frame, &[PixelRect::new(5, 5, 5, 10)]);
        assert_eq!(frame, original);
    }
}
