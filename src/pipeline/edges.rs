//! Edge extraction
//!
//! Dual-threshold gradient edge detection with hysteresis: gradients above
//! the upper threshold are strong edges, those between the thresholds
//! survive only when connected to a strong edge. Plates have strong
//! rectangular borders, so the two thresholds let a caller trade recall
//! against background noise.

use image::GrayImage;
use imageproc::edges::canny;

/// Produce a binary edge map (0 or 255) from a smoothed grayscale image.
///
/// Requires `min_threshold <= max_threshold`; the Parameter Set validation
/// enforces this before the pipeline runs.
pub fn extract_edges(gray: &GrayImage, min_threshold: u32, max_threshold: u32) -> GrayImage {
    canny(gray, min_threshold as f32, max_threshold as f32)
}
