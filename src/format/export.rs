//! Filesystem export: writes the label tree, manifest, descriptor, and
//! statistics summary for a project.

#![cfg(not(target_arch = "wasm32"))]

use std::fs;
use std::path::Path;

use crate::format::dataset::{
    generate_data_yaml, split_dataset, validate_project, ExportStats, SplitAssignment,
    ValidationIssue,
};
use crate::format::error::FormatError;
use crate::format::yolo::{classes_manifest, export_image_labels};
use crate::model::{ImageAnnotation, ImageSource, Project};

/// Outcome of a directory export. `issues` carries the advisory validation
/// findings; the export runs regardless.
#[derive(Debug)]
pub struct ExportReport {
    pub stats: ExportStats,
    pub issues: Vec<ValidationIssue>,
    pub warnings: Vec<String>,
}

/// Write the full export tree for a project under `root`.
///
/// With a split configured the layout is `train|val|test/{images,labels}/`;
/// otherwise flat `images/` and `labels/`. `classes.txt`, `data.yaml`, and
/// `export_stats.json` land at the root. Image files are copied only when
/// the project's export settings ask for them.
pub fn export_to_directory(project: &Project, root: &Path) -> Result<ExportReport, FormatError> {
    let issues = validate_project(project);
    for issue in &issues {
        log::warn!("⚠️ Export validation: {issue}");
    }

    let assignment: Option<SplitAssignment> = project.export.split.map(|ratios| {
        let ids: Vec<_> = project.images.iter().map(|img| img.id).collect();
        split_dataset(&ids, ratios)
    });

    fs::create_dir_all(root)?;
    let mut warnings = Vec::new();
    let classes = project.classes_sorted();

    for image in &project.images {
        let subdir = match &assignment {
            Some(a) => {
                // Every image id comes from this project, so membership
                // always resolves.
                let split = a.split_of(image.id).unwrap_or(crate::format::Split::Train);
                root.join(split.dir_name())
            }
            None => root.to_path_buf(),
        };
        let labels_dir = subdir.join("labels");
        fs::create_dir_all(&labels_dir)?;

        let export = export_image_labels(image, &classes);
        warnings.extend(export.warnings);
        fs::write(labels_dir.join(format!("{}.txt", image.stem())), export.content)?;

        if project.export.include_images {
            let images_dir = subdir.join("images");
            fs::create_dir_all(&images_dir)?;
            if let Err(e) = write_image(image, &images_dir) {
                warnings.push(format!("{}: image not copied ({e})", image.filename));
            }
        }
    }

    fs::write(root.join("classes.txt"), classes_manifest(&classes))?;
    fs::write(
        root.join("data.yaml"),
        generate_data_yaml(&classes, assignment.is_some()),
    )?;

    let stats = ExportStats::tally(project, assignment.as_ref());
    fs::write(
        root.join("export_stats.json"),
        serde_json::to_string_pretty(&stats)?,
    )?;

    log::info!(
        "📦 Exported {} images / {} boxes to {}",
        stats.total_images,
        stats.total_boxes,
        root.display()
    );
    Ok(ExportReport {
        stats,
        issues,
        warnings,
    })
}

fn write_image(image: &ImageAnnotation, images_dir: &Path) -> Result<(), std::io::Error> {
    let target = images_dir.join(&image.filename);
    match &image.source {
        ImageSource::Path(path) => {
            fs::copy(path, target)?;
        }
        ImageSource::Embedded(bytes) => {
            fs::write(target, bytes)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoundingBox, ExportSettings, SplitRatios, YoloClass};

    fn sample_project(split: Option<SplitRatios>, include_images: bool) -> Project {
        let mut images = Vec::new();
        for i in 0..10u64 {
            let mut image = ImageAnnotation::new(
                i,
                format!("img_{i:03}.jpg"),
                ImageSource::Embedded(vec![0xff, 0xd8]),
                640,
                480,
            );
            image.boxes = vec![BoundingBox::new(i, 0.25, 0.25, 0.5, 0.5, 0)];
            images.push(image);
        }
        Project {
            id: 1,
            name: "export-test".into(),
            description: String::new(),
            classes: vec![
                YoloClass::new(0, "car", "#ff0000"),
                YoloClass::new(1, "person", "#00ff00"),
            ],
            images,
            export: ExportSettings {
                include_images,
                split,
            },
            created_at: 0,
            last_modified: 0,
            next_box_id: 100,
            next_image_id: 100,
        }
    }

    #[test]
    fn test_flat_export_layout() {
        let dir = tempfile::tempdir().unwrap();
        let project = sample_project(None, true);
        let report = export_to_directory(&project, dir.path()).unwrap();

        assert!(report.issues.is_empty());
        assert!(dir.path().join("classes.txt").exists());
        assert!(dir.path().join("data.yaml").exists());
        assert!(dir.path().join("export_stats.json").exists());
        assert!(dir.path().join("labels/img_000.txt").exists());
        assert!(dir.path().join("images/img_000.jpg").exists());

        let label = fs::read_to_string(dir.path().join("labels/img_000.txt")).unwrap();
        assert_eq!(label, "0 0.500000 0.500000 0.500000 0.500000");

        let manifest = fs::read_to_string(dir.path().join("classes.txt")).unwrap();
        assert_eq!(manifest, "car\nperson");
    }

    #[test]
    fn test_split_export_layout() {
        let dir = tempfile::tempdir().unwrap();
        let project = sample_project(Some(SplitRatios::new(0.7, 0.2, 0.1)), false);
        let report = export_to_directory(&project, dir.path()).unwrap();

        assert_eq!(report.stats.train_images, 7);
        assert_eq!(report.stats.val_images, 2);
        assert_eq!(report.stats.test_images, 1);

        let count_labels = |split: &str| {
            fs::read_dir(dir.path().join(split).join("labels"))
                .map(|d| d.count())
                .unwrap_or(0)
        };
        assert_eq!(count_labels("train"), 7);
        assert_eq!(count_labels("val"), 2);
        assert_eq!(count_labels("test"), 1);

        // include_images false: no images/ directories anywhere.
        assert!(!dir.path().join("train/images").exists());
        assert!(!dir.path().join("images").exists());
    }

    #[test]
    fn test_export_proceeds_despite_validation_issues() {
        let dir = tempfile::tempdir().unwrap();
        let mut project = sample_project(None, false);
        project.images[0].boxes.push(BoundingBox::new(99, 0.1, 0.1, 0.2, 0.2, 42));

        let report = export_to_directory(&project, dir.path()).unwrap();
        assert!(report
            .issues
            .contains(&ValidationIssue::UnknownClass {
                image_id: 0,
                box_id: 99,
                class_id: 42
            }));
        // The bad box is skipped with a warning, everything else exports.
        assert_eq!(report.warnings.len(), 1);
        assert!(dir.path().join("labels/img_000.txt").exists());
    }

    #[test]
    fn test_export_stats_json_parses() {
        let dir = tempfile::tempdir().unwrap();
        let project = sample_project(None, false);
        export_to_directory(&project, dir.path()).unwrap();

        let json = fs::read_to_string(dir.path().join("export_stats.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["total_images"], 10);
        assert_eq!(value["total_boxes"], 10);
        assert_eq!(value["class_counts"][0]["name"], "car");
    }
}
