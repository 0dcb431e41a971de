use ndarray::{Array3, ArrayViewMut3};

/// Normalized 1D Gaussian kernel of odd `kernel_size` and explicit `sigma`.
pub fn gaussian_kernel_1d(kernel_size: usize, sigma: f64) -> Vec<f32> {
    debug_assert!(kernel_size >= 1 && kernel_size % 2 == 1);
    debug_assert!(sigma > 0.0);
    let half = (kernel_size / 2) as f64;
    let weights: Vec<f64> = (0..kernel_size)
        .map(|i| {
            let x = i as f64 - half;
            (-x * x / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f64 = weights.iter().sum();
    weights.iter().map(|&w| (w / sum) as f32).collect()
}

/// Separable Gaussian blur over an `(h, w, c)` region in place.
///
/// Samples past the region edge replicate the nearest edge pixel, so only
/// pixels inside the region contribute.
pub fn blur_in_place(mut region: ArrayViewMut3<'_, u8>, kernel: &[f32]) {
    let (height, width, channels) = region.dim();
    if kernel.len() <= 1 || height == 0 || width == 0 {
        return;
    }
    let half = (kernel.len() / 2) as isize;
    let mut temp = Array3::<f32>::zeros((height, width, channels));

    // Horizontal pass: region -> temp
    for y in 0..height {
        for x in 0..width {
            for c in 0..channels {
                let mut sum = 0.0f32;
                for (k, &w) in kernel.iter().enumerate() {
                    let sx = (x as isize + k as isize - half).clamp(0, width as isize - 1) as usize;
                    sum += region[[y, sx, c]] as f32 * w;
                }
                temp[[y, x, c]] = sum;
            }
        }
    }

    // Vertical pass: temp -> region
    for y in 0..height {
        for x in 0..width {
            for c in 0..channels {
                let mut sum = 0.0f32;
                for (k, &w) in kernel.iter().enumerate() {
                    let sy =
                        (y as isize + k as isize - half).clamp(0, height as isize - 1) as usize;
                    sum += temp[[sy, x, c]] * w;
                }
                region[[y, x, c]] = sum.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array3;

    #[test]
    fn test_kernel_sums_to_one() {
        let k = gaussian_kernel_1d(99, 30.0);
        assert_eq!(k.len(), 99);
        assert_relative_eq!(k.iter().sum::<f32>(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_kernel_is_symmetric_and_peaks_at_center() {
        let k = gaussian_kernel_1d(7, 1.5);
        for i in 0..k.len() / 2 {
            assert_relative_eq!(k[i], k[k.len() - 1 - i], epsilon = 1e-7);
            assert!(k[3] >= k[i]);
        }
    }

    #[test]
    fn test_uniform_region_unchanged() {
        let mut img = Array3::<u8>::from_elem((10, 10, 3), 128);
        blur_in_place(img.view_mut(), &gaussian_kernel_1d(5, 1.0));
        assert!(img.iter().all(|&v| v == 128));
    }

    #[test]
    fn test_bright_pixel_spreads() {
        let mut img = Array3::<u8>::zeros((11, 11, 3));
        img[[5, 5, 0]] = 255;
        blur_in_place(img.view_mut(), &gaussian_kernel_1d(5, 1.0));
        assert!(img[[5, 5, 0]] < 255);
        assert!(img[[5, 6, 0]] > 0);
        assert!(img[[4, 5, 0]] > 0);
        assert_eq!(img[[5, 5, 1]], 0);
    }

    #[test]
    fn test_kernel_size_1_is_identity() {
        let mut img = Array3::<u8>::from_shape_fn((4, 4, 3), |(y, x, c)| (y * 16 + x * 4 + c) as u8);
        let original = img.clone();
        blur_in_place(img.view_mut(), &gaussian_kernel_1d(1, 1.0));
        assert_eq!(img, original);
    }
}
