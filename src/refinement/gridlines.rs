//! Image-wide grid/ruling line detection via a Hough vote transform.

use image::RgbImage;
use imageproc::hough::{detect_lines, LineDetectionOptions};

use crate::refinement::edgemap::raw_edge_map;
use crate::refinement::types::GridLines;

/// Nearby detected lines within this radius collapse into one candidate.
const SUPPRESSION_RADIUS: u32 = 8;

/// Detect grid lines over the whole image and bucket them by orientation.
///
/// Lines with angle below 45° or above 135° run near-vertical and snap x
/// coordinates; the rest run near-horizontal and snap y coordinates. Offsets
/// are the raw Hough `rho` values.
pub fn detect_grid_lines(
    image: &RgbImage,
    low_threshold: f32,
    high_threshold: f32,
    vote_threshold: u32,
) -> GridLines {
    let edges = raw_edge_map(image, low_threshold, high_threshold);
    let lines = detect_lines(
        &edges,
        LineDetectionOptions {
            vote_threshold,
            suppression_radius: SUPPRESSION_RADIUS,
        },
    );

    let mut grid = GridLines::default();
    for line in lines {
        if line.angle_in_degrees < 45 || line.angle_in_degrees > 135 {
            grid.vertical.push(line.r);
        } else {
            grid.horizontal.push(line.r);
        }
    }
    tracing::debug!(
        vertical = grid.vertical.len(),
        horizontal = grid.horizontal.len(),
        "grid lines detected"
    );
    grid
}

/// Snap a coordinate to the nearest line within `tolerance`, or keep it.
pub fn snap_to_nearest_line(coord: i32, lines: &[f32], tolerance: i32) -> i32 {
    let mut min_dist = f32::INFINITY;
    let mut best = coord;

    for &line in lines {
        let dist = (coord as f32 - line).abs();
        if dist < min_dist && dist <= tolerance as f32 {
            min_dist = dist;
            best = line as i32;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn snaps_within_tolerance_only() {
        let lines = vec![118.0, 300.0];
        assert_eq!(snap_to_nearest_line(120, &lines, 20), 118);
        assert_eq!(snap_to_nearest_line(120, &lines, 1), 120);
        assert_eq!(snap_to_nearest_line(310, &lines, 20), 300);
    }

    #[test]
    fn prefers_the_closest_line() {
        let lines = vec![100.0, 110.0];
        assert_eq!(snap_to_nearest_line(104, &lines, 20), 100);
        assert_eq!(snap_to_nearest_line(106, &lines, 20), 110);
    }

    #[test]
    fn no_lines_keeps_the_coordinate() {
        assert_eq!(snap_to_nearest_line(42, &[], 20), 42);
    }

    #[test]
    fn vertical_step_is_detected_as_vertical_line() {
        // Black left half, white right half, boundary at column 118.
        let mut img = RgbImage::from_pixel(400, 300, Rgb([0, 0, 0]));
        for y in 0..300 {
            for x in 118..400 {
                img.put_pixel(x, y, Rgb([255, 255, 255]));
            }
        }
        let grid = detect_grid_lines(&img, 50.0, 150.0, 100);
        assert!(
            grid.vertical.iter().any(|&r| (r - 118.0).abs() <= 2.0),
            "expected a vertical line near 118, got {:?}",
            grid.vertical
        );
        assert!(grid.horizontal.is_empty());
    }
}
