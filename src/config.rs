use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{BoxMendError, BoxMendResult};

/// Tuning knobs for both refinement pipelines.
///
/// Every field has a serde default so a partial TOML file (or an empty one)
/// yields a working configuration. Stage toggles request a stage; whether it
/// actually runs also depends on the capabilities resolved at pipeline
/// construction (e.g. OCR support).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefineConfig {
    /// Snap box origins to clustered margin positions.
    #[serde(default = "default_true")]
    pub enable_margin_clustering: bool,
    /// Snap box edges to image-wide detected grid lines.
    #[serde(default = "default_true")]
    pub enable_grid_lines: bool,
    /// Reconcile boxes with OCR-derived text bounds, per axis.
    #[serde(default = "default_true")]
    pub enable_text_anchors: bool,
    /// Mask-based segmentation slot. Currently a passthrough; reserved for a
    /// region-proposal model.
    #[serde(default)]
    pub enable_mask_segmentation: bool,
    /// OCR fallback attempt in the basic per-box chain.
    #[serde(default = "default_true")]
    pub enable_ocr: bool,

    /// Neighbourhood radius for margin clustering, in normalized coordinates.
    #[serde(default = "default_margin_eps")]
    pub margin_eps: f64,
    /// Minimum accumulator votes for a detected grid line.
    #[serde(default = "default_line_vote_threshold")]
    pub line_vote_threshold: u32,
    /// Maximum distance (px) between a box edge and a grid line for snapping.
    #[serde(default = "default_snap_tolerance_px")]
    pub snap_tolerance_px: i32,
    /// Reject refinements shrinking a box below this fraction of its baseline.
    #[serde(default = "default_shrink_guard_ratio")]
    pub shrink_guard_ratio: f64,
    /// Mean intensity step (0-255) that counts as a border during scanning.
    #[serde(default = "default_brightness_change_threshold")]
    pub brightness_change_threshold: u8,
    /// Canny low threshold for edge extraction.
    #[serde(default = "default_edge_low_threshold")]
    pub edge_low_threshold: f32,
    /// Canny high threshold for edge extraction.
    #[serde(default = "default_edge_high_threshold")]
    pub edge_high_threshold: f32,
}

impl RefineConfig {
    /// Reject values the pipelines cannot work with.
    pub fn validate(&self) -> BoxMendResult<()> {
        if !(self.shrink_guard_ratio > 0.0 && self.shrink_guard_ratio <= 1.0) {
            return Err(BoxMendError::Config(format!(
                "shrink_guard_ratio must be in (0, 1], got {}",
                self.shrink_guard_ratio
            )));
        }
        if !(self.margin_eps > 0.0) {
            return Err(BoxMendError::Config(format!(
                "margin_eps must be positive, got {}",
                self.margin_eps
            )));
        }
        if self.edge_low_threshold > self.edge_high_threshold {
            return Err(BoxMendError::Config(format!(
                "edge thresholds out of order: low {} > high {}",
                self.edge_low_threshold, self.edge_high_threshold
            )));
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_margin_eps() -> f64 {
    0.01
}

fn default_line_vote_threshold() -> u32 {
    100
}

fn default_snap_tolerance_px() -> i32 {
    20
}

fn default_shrink_guard_ratio() -> f64 {
    0.5
}

fn default_brightness_change_threshold() -> u8 {
    30
}

fn default_edge_low_threshold() -> f32 {
    50.0
}

fn default_edge_high_threshold() -> f32 {
    150.0
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            enable_margin_clustering: true,
            enable_grid_lines: true,
            enable_text_anchors: true,
            enable_mask_segmentation: false,
            enable_ocr: true,
            margin_eps: default_margin_eps(),
            line_vote_threshold: default_line_vote_threshold(),
            snap_tolerance_px: default_snap_tolerance_px(),
            shrink_guard_ratio: default_shrink_guard_ratio(),
            brightness_change_threshold: default_brightness_change_threshold(),
            edge_low_threshold: default_edge_low_threshold(),
            edge_high_threshold: default_edge_high_threshold(),
        }
    }
}

pub fn load_config(path: &Path) -> BoxMendResult<RefineConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: RefineConfig = toml::from_str(&content)?;
    config.validate()?;
    tracing::info!(path = %path.display(), "config loaded");
    Ok(config)
}

pub fn save_config(path: &Path, config: &RefineConfig) -> BoxMendResult<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    tracing::info!(path = %path.display(), "config saved");
    Ok(())
}
