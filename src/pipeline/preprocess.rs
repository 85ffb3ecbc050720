//! Grayscale conversion and noise smoothing
//!
//! First pipeline stage: collapse the input to a single luminance channel
//! and suppress high-frequency sensor noise before edge extraction.

use image::{DynamicImage, GrayImage};
use imageproc::filter::gaussian_blur_f32;

/// Default smoothing kernel size (odd), matching a 5x5 Gaussian.
pub const DEFAULT_SMOOTHING_KERNEL: u32 = 5;

/// Convert to grayscale and apply Gaussian smoothing.
///
/// `kernel_size` must be odd; the Gaussian sigma is derived from it the
/// same way OpenCV derives sigma from an explicit kernel size, so tuned
/// parameter sets port over unchanged.
pub fn preprocess(image: &DynamicImage, kernel_size: u32) -> GrayImage {
    debug_assert!(kernel_size % 2 == 1, "smoothing kernel must be odd");
    let gray = image.to_luma8();
    gaussian_blur_f32(&gray, sigma_for_kernel(kernel_size))
}

/// Sigma implied by an odd kernel size: 0.3 * ((k - 1) / 2 - 1) + 0.8.
fn sigma_for_kernel(kernel_size: u32) -> f32 {
    let k = kernel_size.max(1) as f32;
    0.3 * ((k - 1.0) * 0.5 - 1.0) + 0.8
}
