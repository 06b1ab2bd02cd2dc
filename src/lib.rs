//! BoxMend — pixel-evidence refinement for UI element bounding boxes.
//!
//! An external detector (typically a vision-language model looking at a
//! screenshot) produces approximate element boxes. This crate tightens each
//! box toward the element's true visible extent using conservative geometric
//! corrections: coordinate clustering, grid-line snapping, OCR text bounds,
//! contour fitting, and brightness-gradient border scanning — with explicit
//! fallback chains and guards against over-correction.
//!
//! The crate never invents or drops boxes: `refine(image, boxes)` returns a
//! list of the same length and schema, with every box clamped in bounds.
//!
//! ```no_run
//! use boxmend::{AdvancedRefinementPipeline, ElementBox, RefineConfig};
//!
//! let image = image::open("screenshot.png").unwrap().to_rgb8();
//! let boxes = vec![ElementBox::new("Submit", 120, 450, 200, 48)];
//!
//! let pipeline = AdvancedRefinementPipeline::new(&RefineConfig::default());
//! let refined = pipeline.refine(&image, &boxes);
//! assert_eq!(refined.len(), boxes.len());
//! ```

pub mod config;
pub mod errors;
pub mod refinement;

pub use crate::config::{load_config, save_config, RefineConfig};
pub use crate::errors::{BoxMendError, BoxMendResult};
pub use crate::refinement::{
    AdvancedRefinementPipeline, BasicRefinementPipeline, ElementBox, SegmentationStage,
    TextRecognizer, WordBox,
};
