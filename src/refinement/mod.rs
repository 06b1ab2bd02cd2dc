//! The refinement engine: tightens detector boxes toward the true visible
//! extent of each UI element using pixel evidence from the screenshot.
//!
//! Two orchestrations over the same primitives:
//! - [`BasicRefinementPipeline`] — per-box fallback chain
//!   (contour → OCR → border scan → keep original).
//! - [`AdvancedRefinementPipeline`] — whole-list sequential chain
//!   (margin clustering → grid lines → text anchors → segmentation slot →
//!   validation).

pub mod advanced;
pub mod basic;
pub mod edgemap;
pub mod grid_snap;
pub mod gridlines;
pub mod margin_cluster;
pub mod ocr;
pub mod text_anchor;
pub mod tighten;
pub mod traits;
pub mod types;

pub use advanced::AdvancedRefinementPipeline;
pub use basic::BasicRefinementPipeline;
pub use grid_snap::GridLineSnapper;
pub use margin_cluster::MarginClusterSnapper;
pub use text_anchor::TextAnchorCombiner;
pub use traits::{BoxTightener, PassthroughSegmenter, SegmentationStage, TextRecognizer, WordBox};
pub use types::{CropRect, ElementBox, GridLines};
