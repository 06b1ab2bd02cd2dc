//! Grayscale/edge extraction and contour fitting.
//!
//! Shared leaf utilities: the tightening strategies and the grid-line
//! detector both start from a Canny edge map.

use image::{GrayImage, RgbImage};
use imageproc::contours::{find_contours, BorderType};
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::dilate;

use crate::refinement::types::CropRect;

/// Sigma matching the 5×5 blur kernel used upstream of Canny.
const BLUR_SIGMA: f32 = 1.1;

/// Grayscale → blur → Canny → 3×3 dilate.
///
/// Dilation bridges broken edge fragments so contour extraction sees
/// connected outlines instead of dashes.
pub fn edge_map(crop: &RgbImage, low_threshold: f32, high_threshold: f32) -> GrayImage {
    let gray = image::imageops::grayscale(crop);
    let blurred = gaussian_blur_f32(&gray, BLUR_SIGMA);
    let edges = canny(&blurred, low_threshold, high_threshold);
    dilate(&edges, Norm::LInf, 1)
}

/// Edge map without blur or dilation, for line voting over the full image.
pub fn raw_edge_map(image: &RgbImage, low_threshold: f32, high_threshold: f32) -> GrayImage {
    let gray = image::imageops::grayscale(image);
    canny(&gray, low_threshold, high_threshold)
}

/// Union bounding rectangle of all external contours in an edge map.
///
/// Returns `None` when there are no contours or the union rectangle is
/// degenerate on either axis.
pub fn contour_union(edges: &GrayImage) -> Option<CropRect> {
    let contours = find_contours::<u32>(edges);

    let mut min_x = u32::MAX;
    let mut min_y = u32::MAX;
    let mut max_x = 0u32;
    let mut max_y = 0u32;
    let mut seen = false;

    for contour in &contours {
        if contour.border_type != BorderType::Outer {
            continue;
        }
        for p in &contour.points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
            seen = true;
        }
    }

    if !seen || max_x <= min_x || max_y <= min_y {
        return None;
    }

    Some(CropRect {
        x: min_x,
        y: min_y,
        width: max_x - min_x,
        height: max_y - min_y,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn blank(w: u32, h: u32, v: u8) -> RgbImage {
        RgbImage::from_pixel(w, h, Rgb([v, v, v]))
    }

    #[test]
    fn uniform_crop_has_no_contours() {
        let crop = blank(80, 60, 128);
        let edges = edge_map(&crop, 50.0, 150.0);
        assert!(contour_union(&edges).is_none());
    }

    #[test]
    fn drawn_rectangle_yields_union_near_its_outline() {
        let mut crop = blank(80, 60, 0);
        // 3 px thick white frame from (10,10) to (60,40)
        for t in 0..3u32 {
            for x in 10..=60 {
                crop.put_pixel(x, 10 + t, Rgb([255, 255, 255]));
                crop.put_pixel(x, 40 - t, Rgb([255, 255, 255]));
            }
            for y in 10..=40 {
                crop.put_pixel(10 + t, y, Rgb([255, 255, 255]));
                crop.put_pixel(60 - t, y, Rgb([255, 255, 255]));
            }
        }
        let edges = edge_map(&crop, 50.0, 150.0);
        let rect = contour_union(&edges).expect("frame should produce contours");
        // Blur + dilation smear the outline by a few pixels; the union must
        // still hug the frame.
        assert!(rect.x <= 10 && rect.x + rect.width >= 58);
        assert!(rect.y <= 10 && rect.y + rect.height >= 38);
        assert!(rect.x + rect.width <= 66);
        assert!(rect.y + rect.height <= 46);
    }

    #[test]
    fn degenerate_union_is_rejected() {
        // A single isolated bright pixel: any contour collapses to a point.
        let mut edges = GrayImage::new(20, 20);
        edges.put_pixel(5, 5, image::Luma([255]));
        assert!(contour_union(&edges).is_none());
    }
}
