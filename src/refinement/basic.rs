//! Per-box fallback refinement: contour → OCR → border scan → keep original.

use image::RgbImage;

use crate::config::RefineConfig;
use crate::refinement::ocr::default_recognizer;
use crate::refinement::tighten::{BorderScanTightener, ContourTightener, TextBoundsTightener};
use crate::refinement::traits::{BoxTightener, TextRecognizer};
use crate::refinement::types::{CropRect, ElementBox};

/// Refines each box independently through a chain of tightening strategies.
///
/// The first strategy that produces a candidate wins; the candidate is then
/// checked against the shrink guard. A guard failure, an empty chain result,
/// or any error leaves that box as it came in — one malformed box never
/// aborts the batch.
pub struct BasicRefinementPipeline {
    tighteners: Vec<Box<dyn BoxTightener>>,
    shrink_guard_ratio: f64,
}

impl BasicRefinementPipeline {
    /// Build the chain from config, resolving the OCR capability once.
    pub fn new(config: &RefineConfig) -> Self {
        let recognizer = if config.enable_ocr {
            let r = default_recognizer();
            if r.is_none() {
                tracing::warn!("OCR requested but unavailable — skipping the OCR attempt");
            }
            r
        } else {
            None
        };
        Self::with_recognizer(config, recognizer)
    }

    /// Build the chain with an explicit recognizer (or none).
    pub fn with_recognizer(
        config: &RefineConfig,
        recognizer: Option<Box<dyn TextRecognizer>>,
    ) -> Self {
        let mut tighteners: Vec<Box<dyn BoxTightener>> = vec![Box::new(ContourTightener {
            low_threshold: config.edge_low_threshold,
            high_threshold: config.edge_high_threshold,
        })];
        if config.enable_ocr {
            if let Some(r) = recognizer {
                tighteners.push(Box::new(TextBoundsTightener::new(r)));
            }
        }
        tighteners.push(Box::new(BorderScanTightener {
            threshold: config.brightness_change_threshold,
        }));

        Self {
            tighteners,
            shrink_guard_ratio: config.shrink_guard_ratio,
        }
    }

    /// Refine all boxes. Output has the same length and order as the input.
    pub fn refine(&self, image: &RgbImage, boxes: &[ElementBox]) -> Vec<ElementBox> {
        let (img_w, img_h) = image.dimensions();

        boxes
            .iter()
            .map(|b| self.refine_one(image, img_w, img_h, b))
            .collect()
    }

    fn refine_one(&self, image: &RgbImage, img_w: u32, img_h: u32, b: &ElementBox) -> ElementBox {
        let Some(crop_rect) = b.clamped_crop(img_w, img_h) else {
            tracing::warn!(label = %b.label, "empty crop, keeping original");
            return b.clone();
        };
        let crop = image::imageops::crop_imm(
            image,
            crop_rect.x,
            crop_rect.y,
            crop_rect.width,
            crop_rect.height,
        )
        .to_image();

        let Some((candidate, strategy)) = self.first_candidate(&crop, &b.label) else {
            return b.clone();
        };

        if !self.passes_shrink_guard(candidate, crop_rect) {
            tracing::info!(label = %b.label, strategy, "refinement too aggressive, keeping original");
            return b.clone();
        }

        tracing::debug!(label = %b.label, strategy, "box refined");
        b.with_rect(
            crop_rect.x as i32 + candidate.x as i32,
            crop_rect.y as i32 + candidate.y as i32,
            candidate.width,
            candidate.height,
        )
    }

    /// Walk the fallback chain; a strategy error counts as a miss.
    fn first_candidate(&self, crop: &RgbImage, label: &str) -> Option<(CropRect, &'static str)> {
        for t in &self.tighteners {
            match t.tighten(crop) {
                Ok(Some(rect)) => return Some((rect, t.name())),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(label, strategy = t.name(), error = %e, "tightening attempt failed");
                }
            }
        }
        None
    }

    fn passes_shrink_guard(&self, candidate: CropRect, base: CropRect) -> bool {
        candidate.width as f64 >= self.shrink_guard_ratio * base.width as f64
            && candidate.height as f64 >= self.shrink_guard_ratio * base.height as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::BoxMendResult;
    use crate::refinement::traits::WordBox;
    use image::Rgb;

    fn uniform(w: u32, h: u32, v: u8) -> RgbImage {
        RgbImage::from_pixel(w, h, Rgb([v, v, v]))
    }

    struct FixedWords(Vec<WordBox>);

    impl TextRecognizer for FixedWords {
        fn word_boxes(&self, _crop: &RgbImage) -> BoxMendResult<Vec<WordBox>> {
            Ok(self.0.clone())
        }
    }

    struct FailingOcr;

    impl TextRecognizer for FailingOcr {
        fn word_boxes(&self, _crop: &RgbImage) -> BoxMendResult<Vec<WordBox>> {
            Err(crate::errors::BoxMendError::Ocr("engine crashed".into()))
        }
    }

    #[test]
    fn falls_through_all_attempts_on_featureless_image() {
        let image = uniform(1920, 1080, 240);
        let boxes = vec![ElementBox::new("Submit", 120, 450, 200, 48)];
        let pipeline = BasicRefinementPipeline::with_recognizer(&RefineConfig::default(), None);
        let out = pipeline.refine(&image, &boxes);
        assert_eq!(out, boxes);
    }

    #[test]
    fn shrink_guard_rejects_small_ocr_candidate() {
        // OCR proposes a 10x10 patch inside a 200x48 box: under half on both
        // axes, so the original box must survive.
        let words = vec![WordBox {
            text: "x".into(),
            x: 90,
            y: 20,
            width: 10,
            height: 10,
        }];
        let image = uniform(800, 600, 240);
        let boxes = vec![ElementBox::new("Submit", 120, 450, 200, 48)];
        let pipeline = BasicRefinementPipeline::with_recognizer(
            &RefineConfig::default(),
            Some(Box::new(FixedWords(words))),
        );
        let out = pipeline.refine(&image, &boxes);
        assert_eq!(out, boxes);
    }

    #[test]
    fn accepts_ocr_candidate_above_guard() {
        let words = vec![WordBox {
            text: "Submit".into(),
            x: 10,
            y: 6,
            width: 170,
            height: 36,
        }];
        let image = uniform(800, 600, 240);
        let boxes = vec![ElementBox::new("Submit", 120, 450, 200, 48)];
        let pipeline = BasicRefinementPipeline::with_recognizer(
            &RefineConfig::default(),
            Some(Box::new(FixedWords(words))),
        );
        let out = pipeline.refine(&image, &boxes);
        assert_eq!(out[0].x, 130);
        assert_eq!(out[0].y, 456);
        assert_eq!(out[0].width, 170);
        assert_eq!(out[0].height, 36);
        assert_eq!(out[0].label, "Submit");
    }

    #[test]
    fn ocr_error_falls_through_to_border_scan() {
        // Bright 5 px bands flank the element inside the box crop.
        let mut image = uniform(400, 300, 10);
        for y in 100..160 {
            for x in 50..55 {
                image.put_pixel(x, y, Rgb([200, 200, 200]));
            }
            for x in 105..110 {
                image.put_pixel(x, y, Rgb([200, 200, 200]));
            }
        }
        let boxes = vec![ElementBox::new("b", 50, 110, 60, 40)];
        let cfg = RefineConfig {
            // Keep the contour attempt out of the way for this test.
            edge_low_threshold: 10_000.0,
            edge_high_threshold: 20_000.0,
            ..Default::default()
        };
        let pipeline = BasicRefinementPipeline::with_recognizer(&cfg, Some(Box::new(FailingOcr)));
        let out = pipeline.refine(&image, &boxes);
        // Border scan steps in 5 px from the left and right crop edges.
        assert_eq!(out[0].x, 55);
        assert_eq!(out[0].width, 50);
    }

    #[test]
    fn malformed_box_is_tolerated() {
        let image = uniform(200, 200, 128);
        let boxes = vec![
            ElementBox::new("off-screen", 5000, 5000, 10, 10),
            ElementBox::new("zero", 20, 20, 0, 0),
        ];
        let pipeline = BasicRefinementPipeline::with_recognizer(&RefineConfig::default(), None);
        let out = pipeline.refine(&image, &boxes);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], boxes[0]);
        assert_eq!(out[1], boxes[1]);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let image = uniform(100, 100, 0);
        let pipeline = BasicRefinementPipeline::with_recognizer(&RefineConfig::default(), None);
        assert!(pipeline.refine(&image, &[]).is_empty());
    }
}
