use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle describing a UI element's estimated location.
///
/// Produced by an external detector, so coordinates may be out of bounds or
/// zero-area on input; every pipeline clamps before touching pixels and
/// guarantees in-bounds, positive-area boxes on output. Boxes are value
/// objects: stages build new ones and never mutate their input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementBox {
    /// Semantic label from the detector (e.g. "Submit").
    #[serde(alias = "element")]
    pub label: String,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    /// Detector confidence, passed through untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    /// Pre-refinement width, when the caller tracks it; anchors the area
    /// shrink guard in final validation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_width: Option<u32>,
    /// Pre-refinement height, see `original_width`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_height: Option<u32>,
}

impl ElementBox {
    pub fn new(label: impl Into<String>, x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            label: label.into(),
            x,
            y,
            width,
            height,
            confidence: None,
            original_width: None,
            original_height: None,
        }
    }

    /// Same box with new geometry, metadata carried over.
    pub fn with_rect(&self, x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            ..self.clone()
        }
    }

    /// Crop window for this box inside an `img_w` × `img_h` image.
    ///
    /// The origin is clamped into the image and the extent to the remaining
    /// room, with a 1 px floor so a tolerated zero-area input still yields a
    /// readable window. `None` only when the image itself is empty.
    pub fn clamped_crop(&self, img_w: u32, img_h: u32) -> Option<CropRect> {
        if img_w == 0 || img_h == 0 {
            return None;
        }
        let x = self.x.clamp(0, img_w as i32 - 1) as u32;
        let y = self.y.clamp(0, img_h as i32 - 1) as u32;
        let width = self.width.clamp(1, img_w - x);
        let height = self.height.clamp(1, img_h - y);
        Some(CropRect {
            x,
            y,
            width,
            height,
        })
    }
}

/// An in-bounds crop window, or a candidate rectangle in crop-local
/// coordinates produced by a tightening strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// Grid/ruling lines detected once per image, bucketed by orientation.
///
/// Offsets are raw Hough `rho` values: near-vertical lines snap x
/// coordinates, near-horizontal lines snap y coordinates.
#[derive(Debug, Clone, Default)]
pub struct GridLines {
    pub horizontal: Vec<f32>,
    pub vertical: Vec<f32>,
}

impl GridLines {
    pub fn is_empty(&self) -> bool {
        self.horizontal.is_empty() && self.vertical.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_out_of_bounds_box() {
        let b = ElementBox::new("x", -10, 5, 50, 2000);
        let crop = b.clamped_crop(100, 100).unwrap();
        assert_eq!(crop.x, 0);
        assert_eq!(crop.y, 5);
        assert_eq!(crop.width, 50);
        assert_eq!(crop.height, 95);
    }

    #[test]
    fn zero_area_box_gets_unit_floor() {
        let b = ElementBox::new("x", 20, 20, 0, 0);
        let crop = b.clamped_crop(100, 100).unwrap();
        assert_eq!((crop.width, crop.height), (1, 1));
    }

    #[test]
    fn origin_past_the_edge_is_pulled_back() {
        let b = ElementBox::new("x", 500, 500, 10, 10);
        let crop = b.clamped_crop(100, 100).unwrap();
        assert_eq!((crop.x, crop.y), (99, 99));
        assert_eq!((crop.width, crop.height), (1, 1));
    }

    #[test]
    fn empty_image_has_no_crop() {
        let b = ElementBox::new("x", 0, 0, 10, 10);
        assert!(b.clamped_crop(0, 100).is_none());
    }

    #[test]
    fn deserializes_detector_key_alias() {
        let b: ElementBox =
            serde_json::from_str(r#"{"element":"Submit","x":1,"y":2,"width":3,"height":4}"#)
                .unwrap();
        assert_eq!(b.label, "Submit");
        assert!(b.confidence.is_none());

        let b: ElementBox = serde_json::from_str(
            r#"{"label":"Go","x":1,"y":2,"width":3,"height":4,"confidence":0.9}"#,
        )
        .unwrap();
        assert_eq!(b.label, "Go");
        assert_eq!(b.confidence, Some(0.9));
    }
}
