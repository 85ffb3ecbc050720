//! Region proposal: contour extraction, geometric filtering, ranking
//!
//! Extracts outer contours from the morphed binary map, measures each one
//! (shoelace area, axis-aligned bounding box, rotated min-area rect,
//! convex-hull solidity), filters by the Parameter Set and keeps the
//! largest-area survivors. Area is the ranking proxy for "most
//! plate-like": background clutter of similar aspect ratio tends to be
//! smaller than the plate itself.
//!
//! Degenerate contours (too few points, zero-size rects) are filtered out
//! silently; they are expected by-products of edge extraction, not errors.

use image::GrayImage;
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::geometry::{convex_hull, min_area_rect};
use imageproc::point::Point;
use serde::Serialize;
use tracing::debug;

use crate::config::DetectionParams;

/// Axis-aligned bounding box of a candidate, in source image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Rotated minimum-area rectangle of a candidate.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RotatedRect {
    /// Center (x, y)
    pub center: (f64, f64),
    /// Longer pair of measured side lengths comes out in `width`/`height`
    /// as returned by the rotating-calipers corners, unordered.
    pub width: f64,
    pub height: f64,
    /// Angle of the `width` side against the x axis, degrees
    pub angle_degrees: f64,
}

/// A contour-derived rectangle that passed every geometric filter.
///
/// Owned by a single detection invocation; discarded after the crop is
/// extracted.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateRegion {
    pub bounding_box: BoundingBox,
    pub rotated_rect: RotatedRect,
    /// Shoelace contour area, pixels
    pub area: f64,
    /// max(side) / min(side) of the rotated rect, always >= 1
    pub aspect_ratio: f64,
    /// Contour area over convex hull area, in (0, 1]
    pub solidity: f64,
}

/// Extract, filter and rank candidate regions from a binary morphed map.
///
/// Never fails: a map with no contours, or none surviving the filters,
/// yields an empty list meaning "no plate found".
pub fn propose_regions(morphed: &GrayImage, params: &DetectionParams) -> Vec<CandidateRegion> {
    let contours: Vec<Contour<i32>> = find_contours(morphed);
    let total = contours.len();

    let mut candidates: Vec<CandidateRegion> = contours
        .iter()
        // Top-level outer boundaries only. A blob nested inside another
        // contour's hole is also typed Outer, so the parent link has to
        // be checked as well to ignore nested/internal contours.
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .filter_map(|c| measure_contour(&c.points))
        .filter(|cand| passes_filters(cand, params))
        .collect();

    // Largest area first; ties keep discovery order.
    candidates.sort_by(|a, b| b.area.partial_cmp(&a.area).unwrap_or(std::cmp::Ordering::Equal));
    candidates.truncate(params.max_candidates);

    debug!(
        "region proposal: {} contours, {} candidates kept (cap {})",
        total,
        candidates.len(),
        params.max_candidates
    );
    candidates
}

/// Measure one contour. Returns `None` for degenerate contours that cannot
/// form a rectangle.
fn measure_contour(points: &[Point<i32>]) -> Option<CandidateRegion> {
    if points.len() < 3 {
        return None;
    }

    let area = shoelace_area(points);
    if area <= 0.0 {
        return None;
    }

    let bounding_box = bounding_box_of(points);
    let corners = min_area_rect(points);
    let rotated_rect = rotated_rect_from_corners(&corners);

    // Zero-dimension rects cannot yield a ratio; reject outright.
    let short = rotated_rect.width.min(rotated_rect.height);
    let long = rotated_rect.width.max(rotated_rect.height);
    if short <= 0.0 {
        return None;
    }
    let aspect_ratio = long / short;

    let hull = convex_hull(points);
    let hull_area = shoelace_area(&hull);
    if hull_area <= 0.0 {
        return None;
    }
    let solidity = (area / hull_area).min(1.0);

    Some(CandidateRegion {
        bounding_box,
        rotated_rect,
        area,
        aspect_ratio,
        solidity,
    })
}

/// Area, aspect ratio and solidity gates. Area and aspect bounds are
/// exclusive: boundary-equal values are rejected.
fn passes_filters(cand: &CandidateRegion, params: &DetectionParams) -> bool {
    cand.area > params.min_area
        && cand.area < params.max_area
        && cand.aspect_ratio > params.min_aspect_ratio
        && cand.aspect_ratio < params.max_aspect_ratio
        && cand.solidity > params.min_solidity
}

/// Absolute polygon area via the shoelace formula.
fn shoelace_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut doubled = 0i64;
    for i in 0..points.len() {
        let p = points[i];
        let q = points[(i + 1) % points.len()];
        doubled += p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64;
    }
    (doubled.abs() as f64) / 2.0
}

fn bounding_box_of(points: &[Point<i32>]) -> BoundingBox {
    let min_x = points.iter().map(|p| p.x).min().unwrap_or(0);
    let min_y = points.iter().map(|p| p.y).min().unwrap_or(0);
    let max_x = points.iter().map(|p| p.x).max().unwrap_or(0);
    let max_y = points.iter().map(|p| p.y).max().unwrap_or(0);

    BoundingBox {
        x: min_x.max(0) as u32,
        y: min_y.max(0) as u32,
        width: (max_x - min_x + 1).max(0) as u32,
        height: (max_y - min_y + 1).max(0) as u32,
    }
}

fn rotated_rect_from_corners(corners: &[Point<i32>; 4]) -> RotatedRect {
    let side = |a: Point<i32>, b: Point<i32>| {
        let dx = (b.x - a.x) as f64;
        let dy = (b.y - a.y) as f64;
        (dx * dx + dy * dy).sqrt()
    };
    let width = side(corners[0], corners[1]);
    let height = side(corners[1], corners[2]);
    let center_x = corners.iter().map(|p| p.x as f64).sum::<f64>() / 4.0;
    let center_y = corners.iter().map(|p| p.y as f64).sum::<f64>() / 4.0;
    let angle_degrees = ((corners[1].y - corners[0].y) as f64)
        .atan2((corners[1].x - corners[0].x) as f64)
        .to_degrees();

    RotatedRect {
        center: (center_x, center_y),
        width,
        height,
        angle_degrees,
    }
}
