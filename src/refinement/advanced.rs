//! Whole-list sequential refinement: margin clustering → grid lines → text
//! anchors → mask segmentation → final validation.

use image::RgbImage;

use crate::config::RefineConfig;
use crate::refinement::grid_snap::GridLineSnapper;
use crate::refinement::margin_cluster::MarginClusterSnapper;
use crate::refinement::ocr::default_recognizer;
use crate::refinement::text_anchor::TextAnchorCombiner;
use crate::refinement::traits::{PassthroughSegmenter, SegmentationStage, TextRecognizer};
use crate::refinement::types::ElementBox;

/// Runs the full list through each stage in a fixed order.
///
/// Stage toggles are resolved against the available capabilities once, here
/// in the constructor; a disabled stage stays disabled for the pipeline's
/// lifetime. Failures isolate at stage granularity: a failing stage passes
/// its input list through unchanged.
pub struct AdvancedRefinementPipeline {
    margin: Option<MarginClusterSnapper>,
    grid: Option<GridLineSnapper>,
    text: Option<TextAnchorCombiner>,
    mask: Option<Box<dyn SegmentationStage>>,
    shrink_guard_ratio: f64,
}

impl AdvancedRefinementPipeline {
    /// Build from config, resolving the OCR capability once.
    pub fn new(config: &RefineConfig) -> Self {
        let recognizer = if config.enable_text_anchors {
            let r = default_recognizer();
            if r.is_none() {
                tracing::warn!("text anchors requested but OCR unavailable — stage disabled");
            }
            r
        } else {
            None
        };
        Self::with_recognizer(config, recognizer)
    }

    /// Build with an explicit recognizer (or none, disabling text anchors).
    pub fn with_recognizer(
        config: &RefineConfig,
        recognizer: Option<Box<dyn TextRecognizer>>,
    ) -> Self {
        let margin = config
            .enable_margin_clustering
            .then(|| MarginClusterSnapper::new(config.margin_eps));
        let grid = config.enable_grid_lines.then(|| GridLineSnapper {
            low_threshold: config.edge_low_threshold,
            high_threshold: config.edge_high_threshold,
            vote_threshold: config.line_vote_threshold,
            tolerance: config.snap_tolerance_px,
        });
        let text = if config.enable_text_anchors {
            recognizer.map(TextAnchorCombiner::new)
        } else {
            None
        };
        let mask: Option<Box<dyn SegmentationStage>> = config
            .enable_mask_segmentation
            .then(|| Box::new(PassthroughSegmenter) as Box<dyn SegmentationStage>);

        Self {
            margin,
            grid,
            text,
            mask,
            shrink_guard_ratio: config.shrink_guard_ratio,
        }
    }

    /// Substitute the mask-segmentation slot with a real model.
    pub fn with_segmentation_stage(mut self, stage: Box<dyn SegmentationStage>) -> Self {
        self.mask = Some(stage);
        self
    }

    /// Refine all boxes. Output has the same length and order as the input,
    /// and every output box is in bounds with positive extents.
    pub fn refine(&self, image: &RgbImage, boxes: &[ElementBox]) -> Vec<ElementBox> {
        if boxes.is_empty() {
            return Vec::new();
        }
        let (img_w, img_h) = image.dimensions();
        let mut working = boxes.to_vec();

        if let Some(margin) = &self.margin {
            tracing::debug!("applying margin clustering");
            working = margin.snap(&working, img_w, img_h);
        }
        if let Some(grid) = &self.grid {
            tracing::debug!("applying grid line snapping");
            working = grid.snap(image, &working);
        }
        if let Some(text) = &self.text {
            tracing::debug!("applying text anchor combination");
            working = text.combine(image, &working);
        }
        if let Some(mask) = &self.mask {
            tracing::debug!("applying mask segmentation");
            let expected = working.len();
            let segmented = mask.segment(image, &working).and_then(|out| {
                if out.len() == expected {
                    Ok(out)
                } else {
                    Err(crate::errors::BoxMendError::Refinement(format!(
                        "segmentation changed box count from {expected} to {}",
                        out.len()
                    )))
                }
            });
            working = match segmented {
                Ok(out) => out,
                Err(e) => {
                    tracing::warn!(error = %e, "segmentation failed, keeping input");
                    working
                }
            };
        }

        self.validate_and_cleanup(&working, img_w, img_h)
    }

    /// Clamp every box into the image, then reject clamp-and-shrink results
    /// whose area fell below the guard ratio of the baseline area.
    ///
    /// The baseline is `original_width × original_height` when the caller
    /// tracked them, otherwise the clamped dimensions themselves (in which
    /// case the guard cannot fire).
    fn validate_and_cleanup(
        &self,
        boxes: &[ElementBox],
        img_w: u32,
        img_h: u32,
    ) -> Vec<ElementBox> {
        boxes
            .iter()
            .map(|b| {
                let Some(crop) = b.clamped_crop(img_w, img_h) else {
                    return b.clone();
                };

                let baseline = u64::from(b.original_width.unwrap_or(crop.width))
                    * u64::from(b.original_height.unwrap_or(crop.height));
                let new_area = crop.area();

                if baseline > 0 && new_area as f64 >= self.shrink_guard_ratio * baseline as f64 {
                    b.with_rect(crop.x as i32, crop.y as i32, crop.width, crop.height)
                } else {
                    tracing::info!(label = %b.label, "cleanup shrank box too far, reverting");
                    b.clone()
                }
            })
            .collect()
    }
}
