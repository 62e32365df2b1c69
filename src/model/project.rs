//! Project tree: classes, images, export configuration.

use serde::{Deserialize, Serialize};
use web_time::{SystemTime, UNIX_EPOCH};

use crate::model::class::YoloClass;
use crate::model::image::{ImageAnnotation, ImageId};

/// Unique identifier for a project.
pub type ProjectId = u64;

/// Current unix time in milliseconds.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Train/validation/test ratio triple. Need not sum to 1; it is normalized
/// before use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitRatios {
    pub train: f32,
    pub val: f32,
    pub test: f32,
}

impl SplitRatios {
    pub fn new(train: f32, val: f32, test: f32) -> Self {
        Self { train, val, test }
    }

    /// All components non-negative and at least one positive.
    pub fn is_valid(&self) -> bool {
        self.train >= 0.0
            && self.val >= 0.0
            && self.test >= 0.0
            && self.train + self.val + self.test > 0.0
    }

    /// Rescale so the components sum to 1.
    pub fn normalized(&self) -> Self {
        let total = self.train + self.val + self.test;
        Self {
            train: self.train / total,
            val: self.val / total,
            test: self.test / total,
        }
    }
}

impl Default for SplitRatios {
    fn default() -> Self {
        Self::new(0.7, 0.2, 0.1)
    }
}

/// Export configuration stored with the project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSettings {
    /// Copy image files into the export tree alongside label files.
    pub include_images: bool,
    /// Split the dataset into train/val/test; `None` exports flat.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split: Option<SplitRatios>,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            include_images: true,
            split: None,
        }
    }
}

/// A complete annotation project. Owns its classes and images exclusively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub classes: Vec<YoloClass>,
    pub images: Vec<ImageAnnotation>,
    pub export: ExportSettings,
    pub created_at: u64,
    pub last_modified: u64,
    /// Id counters persisted so ids are never reused after a reload.
    pub(crate) next_box_id: u64,
    pub(crate) next_image_id: u64,
}

impl Project {
    pub fn find_image(&self, id: ImageId) -> Option<&ImageAnnotation> {
        self.images.iter().find(|img| img.id == id)
    }

    pub fn find_image_mut(&mut self, id: ImageId) -> Option<&mut ImageAnnotation> {
        self.images.iter_mut().find(|img| img.id == id)
    }

    pub fn find_class(&self, id: u32) -> Option<&YoloClass> {
        self.classes.iter().find(|c| c.id == id)
    }

    /// Classes ordered by ascending id, the order the YOLO class index uses.
    pub fn classes_sorted(&self) -> Vec<YoloClass> {
        let mut sorted = self.classes.clone();
        sorted.sort_by_key(|c| c.id);
        sorted
    }

    pub fn total_boxes(&self) -> usize {
        self.images.iter().map(|img| img.boxes.len()).sum()
    }

    pub(crate) fn touch(&mut self) {
        self.last_modified = now_millis();
    }

    pub(crate) fn alloc_box_id(&mut self) -> u64 {
        let id = self.next_box_id;
        self.next_box_id += 1;
        id
    }

    pub(crate) fn alloc_image_id(&mut self) -> u64 {
        let id = self.next_image_id;
        self.next_image_id += 1;
        id
    }
}

/// Input for creating a new project.
#[derive(Debug, Clone, Default)]
pub struct ProjectSpec {
    pub name: String,
    pub description: String,
    pub classes: Vec<YoloClass>,
    pub export: ExportSettings,
}

impl ProjectSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_classes(mut self, classes: Vec<YoloClass>) -> Self {
        self.classes = classes;
        self
    }

    pub fn with_export(mut self, export: ExportSettings) -> Self {
        self.export = export;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_ratios_normalize() {
        let r = SplitRatios::new(7.0, 2.0, 1.0).normalized();
        assert!((r.train - 0.7).abs() < 1e-6);
        assert!((r.val - 0.2).abs() < 1e-6);
        assert!((r.test - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_split_ratios_validity() {
        assert!(SplitRatios::default().is_valid());
        assert!(!SplitRatios::new(0.0, 0.0, 0.0).is_valid());
        assert!(!SplitRatios::new(-0.5, 1.0, 0.5).is_valid());
    }

    #[test]
    fn test_classes_sorted_by_id() {
        let project = Project {
            id: 1,
            name: "p".into(),
            description: String::new(),
            classes: vec![
                YoloClass::new(2, "b", "#00ff00"),
                YoloClass::new(0, "a", "#ff0000"),
            ],
            images: Vec::new(),
            export: ExportSettings::default(),
            created_at: 0,
            last_modified: 0,
            next_box_id: 1,
            next_image_id: 1,
        };
        let sorted = project.classes_sorted();
        assert_eq!(sorted[0].id, 0);
        assert_eq!(sorted[1].id, 2);
    }
}
