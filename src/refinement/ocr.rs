//! Text-bounds extraction over a crop.
//!
//! The Tesseract backend lives behind the `tesseract` feature; everything
//! else in the crate talks to the `TextRecognizer` trait so the OCR-driven
//! stages work with any backend (or a test fake).

use crate::refinement::traits::WordBox;
use crate::refinement::types::CropRect;

/// Union bounding rectangle of all non-empty text tokens.
pub fn text_union(words: &[WordBox]) -> Option<CropRect> {
    let mut min_x = u32::MAX;
    let mut min_y = u32::MAX;
    let mut max_right = 0u32;
    let mut max_bottom = 0u32;
    let mut seen = false;

    for w in words {
        if w.text.trim().is_empty() {
            continue;
        }
        min_x = min_x.min(w.x);
        min_y = min_y.min(w.y);
        max_right = max_right.max(w.x + w.width);
        max_bottom = max_bottom.max(w.y + w.height);
        seen = true;
    }

    if !seen || max_right <= min_x || max_bottom <= min_y {
        return None;
    }

    Some(CropRect {
        x: min_x,
        y: min_y,
        width: max_right - min_x,
        height: max_bottom - min_y,
    })
}

/// Resolve the default OCR capability once, at pipeline construction.
///
/// `None` when the crate was built without the `tesseract` feature or the
/// engine fails to initialize; callers disable their OCR stages in that case.
pub fn default_recognizer() -> Option<Box<dyn crate::refinement::traits::TextRecognizer>> {
    #[cfg(feature = "tesseract")]
    {
        tesseract::TesseractRecognizer::try_new("eng")
            .map(|r| Box::new(r) as Box<dyn crate::refinement::traits::TextRecognizer>)
    }
    #[cfg(not(feature = "tesseract"))]
    {
        None
    }
}

#[cfg(feature = "tesseract")]
pub mod tesseract {
    use image::RgbImage;
    use leptess::LepTess;

    use crate::errors::{BoxMendError, BoxMendResult};
    use crate::refinement::traits::{TextRecognizer, WordBox};

    /// Word-level OCR via Tesseract.
    ///
    /// A `LepTess` handle is created per call; the engine is not `Sync` and
    /// crops are small, so per-call initialization is the simpler trade.
    pub struct TesseractRecognizer {
        language: String,
    }

    impl TesseractRecognizer {
        /// Probe the engine once. Returns `None` (with a warning) when the
        /// language data is missing or Tesseract is not installed.
        pub fn try_new(language: &str) -> Option<Self> {
            match LepTess::new(None, language) {
                Ok(_) => {
                    tracing::info!(language, "Tesseract OCR available");
                    Some(Self {
                        language: language.to_string(),
                    })
                }
                Err(e) => {
                    tracing::warn!(error = %e, language, "Tesseract unavailable — OCR stages disabled");
                    None
                }
            }
        }
    }

    impl TextRecognizer for TesseractRecognizer {
        fn word_boxes(&self, crop: &RgbImage) -> BoxMendResult<Vec<WordBox>> {
            let mut lt = LepTess::new(None, &self.language)
                .map_err(|e| BoxMendError::Ocr(format!("init: {e}")))?;

            // The handle only accepts encoded bytes, so the crop goes
            // through an in-memory PNG first.
            let mut png_buf = std::io::Cursor::new(Vec::new());
            crop.write_to(&mut png_buf, image::ImageFormat::Png)
                .map_err(|e| BoxMendError::Image(format!("PNG encode: {e}")))?;
            lt.set_image_from_mem(png_buf.get_ref())
                .map_err(|e| BoxMendError::Ocr(format!("set image: {e}")))?;

            // A crop with no recognizable components is a valid empty result.
            let boxes =
                match lt.get_component_boxes(leptess::capi::TessPageIteratorLevel_RIL_WORD, true) {
                    Some(boxes) => boxes,
                    None => return Ok(Vec::new()),
                };

            let mut words = Vec::new();
            for b in &boxes {
                let geom = b.get_geometry();
                lt.set_rectangle(geom.x, geom.y, geom.w, geom.h);
                let text = lt.get_utf8_text().unwrap_or_default().trim().to_string();
                if text.is_empty() {
                    continue;
                }
                words.push(WordBox {
                    text,
                    x: geom.x.max(0) as u32,
                    y: geom.y.max(0) as u32,
                    width: geom.w.max(0) as u32,
                    height: geom.h.max(0) as u32,
                });
            }
            Ok(words)
        }
    }
}
