//! Snap box edges to image-wide detected grid lines.

use image::RgbImage;

use crate::refinement::gridlines::{detect_grid_lines, snap_to_nearest_line};
use crate::refinement::types::{ElementBox, GridLines};

#[derive(Debug, Clone)]
pub struct GridLineSnapper {
    pub low_threshold: f32,
    pub high_threshold: f32,
    /// Minimum Hough accumulator votes for a line.
    pub vote_threshold: u32,
    /// Maximum edge-to-line distance (px) for a snap.
    pub tolerance: i32,
}

impl GridLineSnapper {
    /// Detect lines once over the whole image, then snap every box to them.
    pub fn snap(&self, image: &RgbImage, boxes: &[ElementBox]) -> Vec<ElementBox> {
        if boxes.is_empty() {
            return Vec::new();
        }
        let grid = detect_grid_lines(
            image,
            self.low_threshold,
            self.high_threshold,
            self.vote_threshold,
        );
        if grid.is_empty() {
            return boxes.to_vec();
        }
        self.snap_to(&grid, boxes)
    }

    /// Snap all four edges of each box against an already-detected line set.
    ///
    /// A snap that would collapse either dimension keeps the original box.
    pub fn snap_to(&self, grid: &GridLines, boxes: &[ElementBox]) -> Vec<ElementBox> {
        boxes
            .iter()
            .map(|b| {
                // Widths come from an external detector and may not fit i32.
                let right = (i64::from(b.x) + i64::from(b.width)).min(i64::from(i32::MAX)) as i32;
                let bottom = (i64::from(b.y) + i64::from(b.height)).min(i64::from(i32::MAX)) as i32;

                let left_snap = snap_to_nearest_line(b.x, &grid.vertical, self.tolerance);
                let right_snap = snap_to_nearest_line(right, &grid.vertical, self.tolerance);
                let top_snap = snap_to_nearest_line(b.y, &grid.horizontal, self.tolerance);
                let bottom_snap = snap_to_nearest_line(bottom, &grid.horizontal, self.tolerance);

                let new_w = right_snap - left_snap;
                let new_h = bottom_snap - top_snap;

                if new_w > 0 && new_h > 0 {
                    b.with_rect(left_snap, top_snap, new_w as u32, new_h as u32)
                } else {
                    tracing::debug!(label = %b.label, "grid snap collapsed box, keeping original");
                    b.clone()
                }
            })
            .collect()
    }
}
