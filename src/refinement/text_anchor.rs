//! Reconcile OCR-derived text bounds with detector boxes, per axis.

use image::RgbImage;

use crate::errors::BoxMendResult;
use crate::refinement::ocr::text_union;
use crate::refinement::traits::TextRecognizer;
use crate::refinement::types::ElementBox;

/// Fraction of a box the text union must span before the text bound is
/// trusted over the detector's on that axis.
const TEXT_SPAN_TRUST_RATIO: f64 = 0.8;

pub struct TextAnchorCombiner {
    recognizer: Box<dyn TextRecognizer>,
}

impl TextAnchorCombiner {
    pub fn new(recognizer: Box<dyn TextRecognizer>) -> Self {
        Self { recognizer }
    }

    /// Combine every box with the text bounds found inside its crop.
    ///
    /// The two axes are decided independently: a box may take its horizontal
    /// extent from text while keeping its vertical extent, or vice versa.
    /// Any OCR failure isolates to this stage and returns the input list.
    pub fn combine(&self, image: &RgbImage, boxes: &[ElementBox]) -> Vec<ElementBox> {
        match self.try_combine(image, boxes) {
            Ok(out) => out,
            Err(e) => {
                tracing::warn!(error = %e, "text anchor combination failed, keeping input boxes");
                boxes.to_vec()
            }
        }
    }

    fn try_combine(&self, image: &RgbImage, boxes: &[ElementBox]) -> BoxMendResult<Vec<ElementBox>> {
        let (img_w, img_h) = image.dimensions();
        let mut out = Vec::with_capacity(boxes.len());

        for b in boxes {
            let Some(crop_rect) = b.clamped_crop(img_w, img_h) else {
                out.push(b.clone());
                continue;
            };
            let crop = image::imageops::crop_imm(
                image,
                crop_rect.x,
                crop_rect.y,
                crop_rect.width,
                crop_rect.height,
            )
            .to_image();

            let words = self.recognizer.word_boxes(&crop)?;
            let Some(text) = text_union(&words) else {
                out.push(b.clone());
                continue;
            };

            let width_ratio = text.width as f64 / crop_rect.width as f64;
            let height_ratio = text.height as f64 / crop_rect.height as f64;

            let (new_x, new_w) = if width_ratio > TEXT_SPAN_TRUST_RATIO {
                (crop_rect.x as i32 + text.x as i32, text.width)
            } else {
                (crop_rect.x as i32, crop_rect.width)
            };
            let (new_y, new_h) = if height_ratio > TEXT_SPAN_TRUST_RATIO {
                (crop_rect.y as i32 + text.y as i32, text.height)
            } else {
                (crop_rect.y as i32, crop_rect.height)
            };

            tracing::debug!(
                label = %b.label,
                width_ratio,
                height_ratio,
                "text anchors applied"
            );
            out.push(b.with_rect(new_x, new_y, new_w, new_h));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refinement::traits::WordBox;
    use image::Rgb;

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

    fn image(w: u32, h: u32) -> RgbImage {
        RgbImage::from_pixel(w, h, Rgb([255, 255, 255]))
    }

    #[test]
    fn wide_text_wins_horizontal_axis_only() {
        // Box 100x40 at (50,60). Text spans 90% of width, 50% of height.
        let words = vec![WordBox {
            text: "Submit".into(),
            x: 2,
            y: 5,
            width: 90,
            height: 20,
        }];
        let combiner = TextAnchorCombiner::new(Box::new(FixedWords(words)));
        let boxes = vec![ElementBox::new("Submit", 50, 60, 100, 40)];
        let out = combiner.combine(&image(400, 300), &boxes);

        assert_eq!(out[0].x, 52);
        assert_eq!(out[0].width, 90);
        assert_eq!(out[0].y, 60);
        assert_eq!(out[0].height, 40);
    }

    #[test]
    fn tall_text_wins_vertical_axis_only() {
        let words = vec![WordBox {
            text: "i".into(),
            x: 40,
            y: 2,
            width: 10,
            height: 36,
        }];
        let combiner = TextAnchorCombiner::new(Box::new(FixedWords(words)));
        let boxes = vec![ElementBox::new("icon", 50, 60, 100, 40)];
        let out = combiner.combine(&image(400, 300), &boxes);

        assert_eq!(out[0].x, 50);
        assert_eq!(out[0].width, 100);
        assert_eq!(out[0].y, 62);
        assert_eq!(out[0].height, 36);
    }

    #[test]
    fn no_text_keeps_box() {
        let combiner = TextAnchorCombiner::new(Box::new(FixedWords(vec![])));
        let boxes = vec![ElementBox::new("b", 10, 10, 30, 30)];
        let out = combiner.combine(&image(100, 100), &boxes);
        assert_eq!(out, boxes);
    }

    #[test]
    fn ocr_failure_isolates_to_the_stage() {
        let combiner = TextAnchorCombiner::new(Box::new(FailingOcr));
        let boxes = vec![
            ElementBox::new("a", 10, 10, 30, 30),
            ElementBox::new("b", 50, 50, 30, 30),
        ];
        let out = combiner.combine(&image(100, 100), &boxes);
        assert_eq!(out, boxes);
    }
}
