use image::RgbImage;

use crate::errors::BoxMendResult;
use crate::refinement::types::{CropRect, ElementBox};

/// Strategy trait for tightening a single box against pixel evidence.
///
/// Implementations receive the clamped crop of a box and return a candidate
/// rectangle in crop-local coordinates, or `None` when the crop offers no
/// usable evidence. Errors are treated by callers as a failed attempt, never
/// as a batch abort.
pub trait BoxTightener {
    /// Short name for logging.
    fn name(&self) -> &'static str;

    fn tighten(&self, crop: &RgbImage) -> BoxMendResult<Option<CropRect>>;
}

/// A word-level text token located inside a crop.
#[derive(Debug, Clone, PartialEq)]
pub struct WordBox {
    pub text: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Strategy trait for OCR backends.
///
/// The production implementation wraps Tesseract (behind the `tesseract`
/// feature); tests inject fakes so the OCR-dependent stages stay testable
/// without an engine installed.
pub trait TextRecognizer {
    /// Word boxes for every recognized token in the crop. Tokens that are
    /// empty after trimming must not be returned.
    fn word_boxes(&self, crop: &RgbImage) -> BoxMendResult<Vec<WordBox>>;
}

/// Slot for mask-based segmentation in the advanced pipeline.
///
/// Reserved for a future region-proposal model; the default implementation
/// passes the list through unchanged so pipeline wiring will not need to
/// change when a real model lands.
pub trait SegmentationStage {
    fn segment(&self, image: &RgbImage, boxes: &[ElementBox]) -> BoxMendResult<Vec<ElementBox>>;
}

/// The no-op segmentation stage.
#[derive(Debug, Default)]
pub struct PassthroughSegmenter;

impl SegmentationStage for PassthroughSegmenter {
    fn segment(&self, _image: &RgbImage, boxes: &[ElementBox]) -> BoxMendResult<Vec<ElementBox>> {
        Ok(boxes.to_vec())
    }
}
