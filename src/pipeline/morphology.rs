//! Morphological gap-filling and speckle removal
//!
//! Closing (dilation then erosion) with a rectangular structuring element
//! bridges gaps between plate-border edge fragments into a closed contour;
//! an optional opening (erosion then dilation) with the same kernel removes
//! the small speckle regions closing can create. Kernel size controls how
//! large a gap gets bridged, so it stays a tunable parameter: larger
//! kernels merge unrelated edges, smaller ones leave plate borders broken.
//!
//! imageproc's `Norm`-based morphology is isotropic and cannot express a
//! W x H rectangle, so dilation/erosion are implemented here as separable
//! row/column min-max passes over the binary map.

use image::GrayImage;

/// Close then optionally open a binary map with a `width x height`
/// rectangular structuring element.
pub fn close_and_open(
    edges: &GrayImage,
    kernel_width: u32,
    kernel_height: u32,
    apply_opening: bool,
) -> GrayImage {
    let closed = erode(&dilate(edges, kernel_width, kernel_height), kernel_width, kernel_height);
    if apply_opening {
        dilate(&erode(&closed, kernel_width, kernel_height), kernel_width, kernel_height)
    } else {
        closed
    }
}

/// Rectangular dilation: each output pixel is the max over the kernel
/// window anchored at its center. Pixels outside the image count as 0.
pub fn dilate(image: &GrayImage, kernel_width: u32, kernel_height: u32) -> GrayImage {
    let rows = pass_rows(image, kernel_width, true);
    pass_cols(&rows, kernel_height, true)
}

/// Rectangular erosion: each output pixel is the min over the kernel
/// window; out-of-bounds positions are ignored rather than counted as 0,
/// so the border rows are not eroded away wholesale.
pub fn erode(image: &GrayImage, kernel_width: u32, kernel_height: u32) -> GrayImage {
    let rows = pass_rows(image, kernel_width, false);
    pass_cols(&rows, kernel_height, false)
}

// The rectangle is separable: a horizontal pass then a vertical pass.

fn pass_rows(image: &GrayImage, kernel: u32, take_max: bool) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut out = GrayImage::new(width, height);
    // OpenCV-style anchor: offsets [-k/2, k - 1 - k/2].
    let left = (kernel / 2) as i64;
    let right = (kernel - 1 - kernel / 2) as i64;

    for y in 0..height {
        for x in 0..width {
            let lo = (x as i64 - left).max(0) as u32;
            let hi = (x as i64 + right).min(width as i64 - 1) as u32;
            let mut acc = image.get_pixel(lo, y).0[0];
            for xx in (lo + 1)..=hi {
                let v = image.get_pixel(xx, y).0[0];
                acc = if take_max { acc.max(v) } else { acc.min(v) };
            }
            out.put_pixel(x, y, image::Luma([acc]));
        }
    }
    out
}

fn pass_cols(image: &GrayImage, kernel: u32, take_max: bool) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut out = GrayImage::new(width, height);
    let top = (kernel / 2) as i64;
    let bottom = (kernel - 1 - kernel / 2) as i64;

    for x in 0..width {
        for y in 0..height {
            let lo = (y as i64 - top).max(0) as u32;
            let hi = (y as i64 + bottom).min(height as i64 - 1) as u32;
            let mut acc = image.get_pixel(x, lo).0[0];
            for yy in (lo + 1)..=hi {
                let v = image.get_pixel(x, yy).0[0];
                acc = if take_max { acc.max(v) } else { acc.min(v) };
            }
            out.put_pixel(x, y, image::Luma([acc]));
        }
    }
    out
}
