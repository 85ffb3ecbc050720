//! Crop extraction and OCR legibility normalization
//!
//! Extracts the padded sub-image around a candidate, clipped to the source
//! extent (never reads outside it), and upsamples small crops so the
//! recognizer sees text at a workable height. Also prepares a binarized
//! version of the crop for the recognizer: grayscale, light blur, Otsu
//! threshold and a small closing to reconnect broken glyph strokes.

use image::imageops::{self, FilterType};
use image::{GrayImage, RgbImage};
use imageproc::contrast::{otsu_level, threshold, ThresholdType};
use imageproc::filter::gaussian_blur_f32;
use tracing::debug;

use super::morphology;
use super::propose::BoundingBox;

/// Extract the candidate's padded crop from the source image.
///
/// The padded window is clipped to the source bounds. Crops shorter than
/// `min_height` are upscaled isotropically with linear interpolation until
/// they reach it. The proposer's area filter guarantees the region itself
/// is non-degenerate.
pub fn extract_crop(
    source: &RgbImage,
    region: &BoundingBox,
    padding: u32,
    min_height: u32,
) -> RgbImage {
    let (src_w, src_h) = source.dimensions();

    let x0 = region.x.saturating_sub(padding).min(src_w.saturating_sub(1));
    let y0 = region.y.saturating_sub(padding).min(src_h.saturating_sub(1));
    let x1 = (region.x + region.width + padding).min(src_w);
    let y1 = (region.y + region.height + padding).min(src_h);

    let crop_w = (x1 - x0).max(1);
    let crop_h = (y1 - y0).max(1);
    let crop = imageops::crop_imm(source, x0, y0, crop_w, crop_h).to_image();

    if crop_h >= min_height {
        return crop;
    }

    // Isotropic upscale to the legibility floor.
    let scale = min_height as f64 / crop_h as f64;
    let new_w = ((crop_w as f64 * scale).round() as u32).max(1);
    debug!(
        "upscaling crop {}x{} -> {}x{} for legibility",
        crop_w, crop_h, new_w, min_height
    );
    imageops::resize(&crop, new_w, min_height, FilterType::Triangle)
}

/// Binarize a crop for the text recognizer.
pub fn prepare_for_ocr(crop: &RgbImage) -> GrayImage {
    let gray = image::DynamicImage::ImageRgb8(crop.clone()).to_luma8();
    let blurred = gaussian_blur_f32(&gray, 0.8);
    let level = otsu_level(&blurred);
    let binary = threshold(&blurred, level, ThresholdType::Binary);
    // 2x2 closing to reconnect strokes the threshold may have broken.
    morphology::erode(&morphology::dilate(&binary, 2, 2), 2, 2)
}
