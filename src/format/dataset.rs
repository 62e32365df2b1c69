//! Dataset splitting, descriptor generation, and pre-export validation.

use rand::seq::SliceRandom;
use serde::Serialize;

use crate::model::{BoxId, ImageId, Project, SplitRatios, YoloClass};

/// Which split an exported image landed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Val,
    Test,
}

impl Split {
    pub fn dir_name(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val => "val",
            Split::Test => "test",
        }
    }
}

/// Image ids partitioned into train/val/test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitAssignment {
    pub train: Vec<ImageId>,
    pub val: Vec<ImageId>,
    pub test: Vec<ImageId>,
}

impl SplitAssignment {
    pub fn split_of(&self, id: ImageId) -> Option<Split> {
        if self.train.contains(&id) {
            Some(Split::Train)
        } else if self.val.contains(&id) {
            Some(Split::Val)
        } else if self.test.contains(&id) {
            Some(Split::Test)
        } else {
            None
        }
    }
}

/// Shuffle the image ids and slice them by the normalized ratios.
///
/// Train and val take `floor(count * ratio)` images each; the remainder goes
/// to test. Membership is random but the counts are deterministic for a
/// given image count and ratio triple.
pub fn split_dataset(image_ids: &[ImageId], ratios: SplitRatios) -> SplitAssignment {
    let ratios = ratios.normalized();
    let mut shuffled: Vec<ImageId> = image_ids.to_vec();
    shuffled.shuffle(&mut rand::rng());

    let count = shuffled.len();
    let train_count = (count as f32 * ratios.train).floor() as usize;
    let val_count = (count as f32 * ratios.val).floor() as usize;

    let test = shuffled.split_off(train_count + val_count);
    let val = shuffled.split_off(train_count);
    SplitAssignment {
        train: shuffled,
        val,
        test,
    }
}

/// Render the dataset descriptor (`data.yaml`) enumerating split paths,
/// class count, and the index-to-name mapping.
pub fn generate_data_yaml(classes: &[YoloClass], split: bool) -> String {
    let mut sorted: Vec<&YoloClass> = classes.iter().collect();
    sorted.sort_by_key(|c| c.id);

    let names = sorted
        .iter()
        .map(|c| format!("'{}'", c.name.replace('\'', "''")))
        .collect::<Vec<_>>()
        .join(", ");

    let mut yaml = String::from("path: .\n");
    if split {
        yaml.push_str("train: train/images\n");
        yaml.push_str("val: val/images\n");
        yaml.push_str("test: test/images\n");
    } else {
        yaml.push_str("train: images\n");
        yaml.push_str("val: images\n");
    }
    yaml.push_str(&format!("nc: {}\n", sorted.len()));
    yaml.push_str(&format!("names: [{}]\n", names));
    yaml
}

/// A single advisory finding from pre-export validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationIssue {
    NoClasses,
    NoImages,
    DuplicateClassId { class_id: u32 },
    InvalidGeometry { image_id: ImageId, box_id: BoxId },
    UnknownClass {
        image_id: ImageId,
        box_id: BoxId,
        class_id: u32,
    },
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationIssue::NoClasses => write!(f, "project has no classes"),
            ValidationIssue::NoImages => write!(f, "project has no images"),
            ValidationIssue::DuplicateClassId { class_id } => {
                write!(f, "duplicate class id {class_id}")
            }
            ValidationIssue::InvalidGeometry { image_id, box_id } => {
                write!(f, "box {box_id} on image {image_id} has invalid geometry")
            }
            ValidationIssue::UnknownClass {
                image_id,
                box_id,
                class_id,
            } => write!(
                f,
                "box {box_id} on image {image_id} references unknown class {class_id}"
            ),
        }
    }
}

/// Collect every export-relevant problem in the project.
///
/// Advisory only: callers report the issues but may still export.
pub fn validate_project(project: &Project) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if project.classes.is_empty() {
        issues.push(ValidationIssue::NoClasses);
    }
    if project.images.is_empty() {
        issues.push(ValidationIssue::NoImages);
    }

    let mut seen_ids = std::collections::HashSet::new();
    for class in &project.classes {
        if !seen_ids.insert(class.id) {
            issues.push(ValidationIssue::DuplicateClassId { class_id: class.id });
        }
    }

    for image in &project.images {
        for b in &image.boxes {
            if !b.is_valid() {
                issues.push(ValidationIssue::InvalidGeometry {
                    image_id: image.id,
                    box_id: b.id,
                });
            }
            if project.find_class(b.class_id).is_none() {
                issues.push(ValidationIssue::UnknownClass {
                    image_id: image.id,
                    box_id: b.id,
                    class_id: b.class_id,
                });
            }
        }
    }

    issues
}

/// Per-class box count in the export summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassCount {
    pub name: String,
    pub count: usize,
}

/// Statistics summary written to the export root.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportStats {
    pub project_name: String,
    pub total_images: usize,
    pub completed_images: usize,
    pub total_boxes: usize,
    pub avg_boxes_per_image: f32,
    pub train_images: usize,
    pub val_images: usize,
    pub test_images: usize,
    pub class_counts: Vec<ClassCount>,
    /// Unix milliseconds when the export ran.
    pub exported_at: u64,
}

impl ExportStats {
    /// Tally the project, with split counts from the assignment when the
    /// export is split (all-zero val/test otherwise).
    pub fn tally(project: &Project, assignment: Option<&SplitAssignment>) -> Self {
        let class_counts = project
            .classes_sorted()
            .iter()
            .map(|class| ClassCount {
                name: class.name.clone(),
                count: project
                    .images
                    .iter()
                    .flat_map(|img| &img.boxes)
                    .filter(|b| b.class_id == class.id)
                    .count(),
            })
            .collect();

        let (train, val, test) = match assignment {
            Some(a) => (a.train.len(), a.val.len(), a.test.len()),
            None => (project.images.len(), 0, 0),
        };

        let total_images = project.images.len();
        let total_boxes = project.total_boxes();
        Self {
            project_name: project.name.clone(),
            total_images,
            completed_images: project.images.iter().filter(|img| img.completed).count(),
            total_boxes,
            avg_boxes_per_image: if total_images > 0 {
                total_boxes as f32 / total_images as f32
            } else {
                0.0
            },
            train_images: train,
            val_images: val,
            test_images: test,
            class_counts,
            exported_at: crate::model::now_millis(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoundingBox, ExportSettings, ImageAnnotation, ImageSource};

    #[test]
    fn test_split_counts_deterministic() {
        let ids: Vec<ImageId> = (0..10).collect();
        let assignment = split_dataset(&ids, SplitRatios::new(0.7, 0.2, 0.1));
        assert_eq!(assignment.train.len(), 7);
        assert_eq!(assignment.val.len(), 2);
        assert_eq!(assignment.test.len(), 1);
    }

    #[test]
    fn test_split_partition_is_disjoint_and_total() {
        let ids: Vec<ImageId> = (0..23).collect();
        let assignment = split_dataset(&ids, SplitRatios::default());

        let mut all: Vec<ImageId> = assignment
            .train
            .iter()
            .chain(&assignment.val)
            .chain(&assignment.test)
            .copied()
            .collect();
        all.sort_unstable();
        assert_eq!(all, ids);
    }

    #[test]
    fn test_split_normalizes_ratios() {
        // 7:2:1 in absolute terms behaves like 0.7/0.2/0.1.
        let ids: Vec<ImageId> = (0..10).collect();
        let assignment = split_dataset(&ids, SplitRatios::new(7.0, 2.0, 1.0));
        assert_eq!(assignment.train.len(), 7);
        assert_eq!(assignment.test.len(), 1);
    }

    #[test]
    fn test_data_yaml_split_layout() {
        let classes = vec![
            YoloClass::new(0, "car", "#ff0000"),
            YoloClass::new(1, "person", "#00ff00"),
        ];
        let yaml = generate_data_yaml(&classes, true);
        assert!(yaml.contains("train: train/images"));
        assert!(yaml.contains("nc: 2"));
        assert!(yaml.contains("names: ['car', 'person']"));
    }

    #[test]
    fn test_data_yaml_flat_layout() {
        let yaml = generate_data_yaml(&[YoloClass::new(0, "car", "#ff0000")], false);
        assert!(yaml.contains("train: images"));
        assert!(!yaml.contains("train/images"));
    }

    fn project_with(classes: Vec<YoloClass>, images: Vec<ImageAnnotation>) -> Project {
        Project {
            id: 1,
            name: "p".into(),
            description: String::new(),
            classes,
            images,
            export: ExportSettings::default(),
            created_at: 0,
            last_modified: 0,
            next_box_id: 100,
            next_image_id: 100,
        }
    }

    #[test]
    fn test_validate_empty_project() {
        let issues = validate_project(&project_with(vec![], vec![]));
        assert!(issues.contains(&ValidationIssue::NoClasses));
        assert!(issues.contains(&ValidationIssue::NoImages));
    }

    #[test]
    fn test_validate_flags_bad_boxes() {
        let mut image = ImageAnnotation::new(1, "a.jpg", ImageSource::Embedded(vec![]), 100, 100);
        image.boxes = vec![
            BoundingBox::new(1, 0.8, 0.8, 0.5, 0.5, 0),
            BoundingBox::new(2, 0.1, 0.1, 0.2, 0.2, 42),
            BoundingBox::new(3, 0.1, 0.1, 0.2, 0.2, 0),
        ];
        let issues = validate_project(&project_with(
            vec![YoloClass::new(0, "car", "#ff0000")],
            vec![image],
        ));

        assert!(issues.contains(&ValidationIssue::InvalidGeometry { image_id: 1, box_id: 1 }));
        assert!(issues.contains(&ValidationIssue::UnknownClass {
            image_id: 1,
            box_id: 2,
            class_id: 42
        }));
        assert_eq!(issues.len(), 2);
    }

    #[test]
    fn test_validate_duplicate_class_ids() {
        let mut image = ImageAnnotation::new(1, "a.jpg", ImageSource::Embedded(vec![]), 10, 10);
        image.boxes = vec![];
        let issues = validate_project(&project_with(
            vec![
                YoloClass::new(0, "a", "#ff0000"),
                YoloClass::new(0, "b", "#00ff00"),
            ],
            vec![image],
        ));
        assert_eq!(
            issues,
            vec![ValidationIssue::DuplicateClassId { class_id: 0 }]
        );
    }

    #[test]
    fn test_export_stats_tally() {
        let mut image = ImageAnnotation::new(1, "a.jpg", ImageSource::Embedded(vec![]), 10, 10);
        image.boxes = vec![
            BoundingBox::new(1, 0.1, 0.1, 0.2, 0.2, 0),
            BoundingBox::new(2, 0.5, 0.5, 0.2, 0.2, 0),
            BoundingBox::new(3, 0.1, 0.5, 0.2, 0.2, 1),
        ];
        let project = project_with(
            vec![
                YoloClass::new(0, "car", "#ff0000"),
                YoloClass::new(1, "person", "#00ff00"),
            ],
            vec![image],
        );

        let stats = ExportStats::tally(&project, None);
        assert_eq!(stats.total_boxes, 3);
        assert!((stats.avg_boxes_per_image - 3.0).abs() < 1e-6);
        assert_eq!(stats.train_images, 1);
        assert_eq!(stats.class_counts[0].count, 2);
        assert_eq!(stats.class_counts[1].count, 1);
    }
}
