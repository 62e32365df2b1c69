//! Bounding box data model.
//!
//! Boxes are stored in normalized image-fraction coordinates: x, y, width and
//! height are all fractions of the image dimensions, independent of any
//! viewport or zoom state.

use serde::{Deserialize, Serialize};

/// Unique identifier for a bounding box within a project.
pub type BoxId = u64;

/// Minimum normalized width/height for a box. Boxes drawn smaller than this
/// are discarded rather than created.
pub const MIN_BOX_SIZE: f32 = 0.01;

/// A rectangular object-detection annotation in normalized coordinates.
///
/// Invariant: `0 <= x`, `0 <= y`, `x + width <= 1`, `y + height <= 1`,
/// `width > 0`, `height > 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub id: BoxId,
    /// Top-left corner X as a fraction of image width.
    pub x: f32,
    /// Top-left corner Y as a fraction of image height.
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Id of the assigned class. Authoritative; `class_name` is a cache.
    pub class_id: u32,
    /// Class name cached at assignment time. May go stale after a rename.
    pub class_name: String,
    /// Detection confidence, present for imported model predictions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    /// Transient UI flags. Persisted with the project but never exported.
    #[serde(default)]
    pub selected: bool,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

fn default_visible() -> bool {
    true
}

impl BoundingBox {
    pub fn new(id: BoxId, x: f32, y: f32, width: f32, height: f32, class_id: u32) -> Self {
        Self {
            id,
            x,
            y,
            width,
            height,
            class_id,
            class_name: String::new(),
            confidence: None,
            selected: false,
            visible: true,
        }
    }

    pub fn with_class_name(mut self, name: impl Into<String>) -> Self {
        self.class_name = name.into();
        self
    }

    /// Check the normalized-geometry invariant.
    pub fn is_valid(&self) -> bool {
        self.x >= 0.0
            && self.y >= 0.0
            && self.width > 0.0
            && self.height > 0.0
            && self.x + self.width <= 1.0
            && self.y + self.height <= 1.0
    }

    /// Center point in normalized coordinates (YOLO's native representation).
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Saturate the box into the unit square, preserving size where possible
    /// and flooring dimensions at `MIN_BOX_SIZE`.
    pub fn clamped(mut self) -> Self {
        self.width = self.width.clamp(MIN_BOX_SIZE, 1.0);
        self.height = self.height.clamp(MIN_BOX_SIZE, 1.0);
        self.x = self.x.clamp(0.0, 1.0 - self.width);
        self.y = self.y.clamp(0.0, 1.0 - self.height);
        self
    }
}

/// Geometry and class fields for a box to be created.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxSpec {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub class_id: u32,
    pub confidence: Option<f32>,
}

impl BoxSpec {
    pub fn new(x: f32, y: f32, width: f32, height: f32, class_id: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            class_id,
            confidence: None,
        }
    }
}

/// Partial update for an existing box. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoxPatch {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub class_id: Option<u32>,
    pub class_name: Option<String>,
    pub visible: Option<bool>,
}

impl BoxPatch {
    /// Patch carrying only geometry fields.
    pub fn geometry(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }

    /// Patch reassigning the class (name cache refreshed by the store).
    pub fn class(class_id: u32) -> Self {
        Self {
            class_id: Some(class_id),
            ..Self::default()
        }
    }

    /// Apply this patch to a box, returning the updated copy.
    pub fn apply_to(&self, existing: &BoundingBox) -> BoundingBox {
        let mut updated = existing.clone();
        if let Some(x) = self.x {
            updated.x = x;
        }
        if let Some(y) = self.y {
            updated.y = y;
        }
        if let Some(width) = self.width {
            updated.width = width;
        }
        if let Some(height) = self.height {
            updated.height = height;
        }
        if let Some(class_id) = self.class_id {
            updated.class_id = class_id;
        }
        if let Some(ref class_name) = self.class_name {
            updated.class_name = class_name.clone();
        }
        if let Some(visible) = self.visible {
            updated.visible = visible;
        }
        updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_box() {
        let b = BoundingBox::new(1, 0.25, 0.25, 0.5, 0.5, 0);
        assert!(b.is_valid());
        assert_eq!(b.center(), (0.5, 0.5));
    }

    #[test]
    fn test_invalid_boxes() {
        assert!(!BoundingBox::new(1, -0.1, 0.0, 0.5, 0.5, 0).is_valid());
        assert!(!BoundingBox::new(1, 0.6, 0.0, 0.5, 0.5, 0).is_valid());
        assert!(!BoundingBox::new(1, 0.0, 0.0, 0.0, 0.5, 0).is_valid());
        assert!(!BoundingBox::new(1, 0.0, 0.9, 0.5, 0.2, 0).is_valid());
    }

    #[test]
    fn test_clamped_restores_invariant() {
        let b = BoundingBox::new(1, 0.8, -0.2, 0.5, 0.5, 0).clamped();
        assert!(b.is_valid());
        assert_eq!(b.x, 0.5);
        assert_eq!(b.y, 0.0);
    }

    #[test]
    fn test_patch_partial_update() {
        let b = BoundingBox::new(1, 0.1, 0.1, 0.2, 0.2, 0).with_class_name("car");
        let patch = BoxPatch {
            x: Some(0.3),
            ..BoxPatch::default()
        };
        let updated = patch.apply_to(&b);
        assert_eq!(updated.x, 0.3);
        assert_eq!(updated.y, 0.1);
        assert_eq!(updated.class_name, "car");
    }
}
