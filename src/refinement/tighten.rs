//! The per-crop box tightening strategies.
//!
//! Each strategy looks at one clamped crop and proposes a tighter rectangle
//! in crop-local coordinates, or `None`. The basic pipeline composes them
//! into a fallback chain; the advanced pipeline reuses the same primitives
//! through its own stages.

use image::{GrayImage, RgbImage};

use crate::errors::BoxMendResult;
use crate::refinement::edgemap::{contour_union, edge_map};
use crate::refinement::ocr::text_union;
use crate::refinement::traits::{BoxTightener, TextRecognizer};
use crate::refinement::types::CropRect;

/// Tighten to the union of external contours in the crop's edge map.
pub struct ContourTightener {
    pub low_threshold: f32,
    pub high_threshold: f32,
}

impl BoxTightener for ContourTightener {
    fn name(&self) -> &'static str {
        "contour"
    }

    fn tighten(&self, crop: &RgbImage) -> BoxMendResult<Option<CropRect>> {
        let edges = edge_map(crop, self.low_threshold, self.high_threshold);
        Ok(contour_union(&edges))
    }
}

/// Tighten to the union of OCR word boxes in the crop.
pub struct TextBoundsTightener {
    recognizer: Box<dyn TextRecognizer>,
}

impl TextBoundsTightener {
    pub fn new(recognizer: Box<dyn TextRecognizer>) -> Self {
        Self { recognizer }
    }
}

impl BoxTightener for TextBoundsTightener {
    fn name(&self) -> &'static str {
        "ocr"
    }

    fn tighten(&self, crop: &RgbImage) -> BoxMendResult<Option<CropRect>> {
        let words = self.recognizer.word_boxes(crop)?;
        Ok(text_union(&words))
    }
}

/// Tighten by walking inward from each crop edge until the mean absolute
/// brightness difference between consecutive rows/columns exceeds the
/// threshold.
pub struct BorderScanTightener {
    pub threshold: u8,
}

impl BorderScanTightener {
    fn col_diff(gray: &GrayImage, a: u32, b: u32) -> f64 {
        let h = gray.height();
        let sum: u64 = (0..h)
            .map(|y| {
                let pa = gray.get_pixel(a, y)[0] as i16;
                let pb = gray.get_pixel(b, y)[0] as i16;
                (pa - pb).unsigned_abs() as u64
            })
            .sum();
        sum as f64 / h as f64
    }

    fn row_diff(gray: &GrayImage, a: u32, b: u32) -> f64 {
        let w = gray.width();
        let sum: u64 = (0..w)
            .map(|x| {
                let pa = gray.get_pixel(x, a)[0] as i16;
                let pb = gray.get_pixel(x, b)[0] as i16;
                (pa - pb).unsigned_abs() as u64
            })
            .sum();
        sum as f64 / w as f64
    }
}

impl BoxTightener for BorderScanTightener {
    fn name(&self) -> &'static str {
        "border-scan"
    }

    fn tighten(&self, crop: &RgbImage) -> BoxMendResult<Option<CropRect>> {
        let gray = image::imageops::grayscale(crop);
        let (w, h) = gray.dimensions();
        if w == 0 || h == 0 {
            return Ok(None);
        }
        let threshold = self.threshold as f64;

        let mut left = 0u32;
        for col in 1..w {
            if Self::col_diff(&gray, col, col - 1) > threshold {
                left = col;
                break;
            }
        }

        let mut right = w - 1;
        for col in (0..w - 1).rev() {
            if Self::col_diff(&gray, col, col + 1) > threshold {
                right = col;
                break;
            }
        }

        let mut top = 0u32;
        for row in 1..h {
            if Self::row_diff(&gray, row, row - 1) > threshold {
                top = row;
                break;
            }
        }

        let mut bottom = h - 1;
        for row in (0..h - 1).rev() {
            if Self::row_diff(&gray, row, row + 1) > threshold {
                bottom = row;
                break;
            }
        }

        let new_w = right as i64 - left as i64 + 1;
        let new_h = bottom as i64 - top as i64 + 1;
        let moved = left > 0 || right < w - 1 || top > 0 || bottom < h - 1;

        if new_w > 0 && new_h > 0 && moved {
            Ok(Some(CropRect {
                x: left,
                y: top,
                width: new_w as u32,
                height: new_h as u32,
            }))
        } else {
            Ok(None)
        }
    }
}
