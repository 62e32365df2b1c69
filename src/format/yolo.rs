//! YOLO label-line codec.
//!
//! One `.txt` label file per image, one line per box:
//!
//! ```text
//! <class_index> <x_center> <y_center> <width> <height>
//! ```
//!
//! All coordinates are normalized to [0, 1] relative to image size and
//! rendered with fixed 6-decimal precision. `class_index` is the position of
//! the box's class in the class list sorted by ascending class id, not the
//! class id itself. A `classes.txt` manifest carries the names in that same
//! order.

use std::collections::HashMap;

use crate::format::error::ImportWarning;
use crate::model::{BoundingBox, ImageAnnotation, YoloClass};

/// Rendered label file for one image, plus boxes that could not be encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelExport {
    pub content: String,
    pub warnings: Vec<String>,
}

/// Parsed label file: accepted boxes plus per-line soft failures.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelImport {
    pub boxes: Vec<BoundingBox>,
    pub warnings: Vec<ImportWarning>,
}

/// Map class id to its line index in the manifest (position sorted by
/// ascending id).
pub fn class_index_map(classes: &[YoloClass]) -> HashMap<u32, usize> {
    let mut ids: Vec<u32> = classes.iter().map(|c| c.id).collect();
    ids.sort_unstable();
    ids.into_iter().enumerate().map(|(idx, id)| (id, idx)).collect()
}

/// Class names, one per line, ordered by ascending class id.
pub fn classes_manifest(classes: &[YoloClass]) -> String {
    let mut sorted: Vec<&YoloClass> = classes.iter().collect();
    sorted.sort_by_key(|c| c.id);
    sorted
        .iter()
        .map(|c| c.name.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render the label lines for one image. Boxes whose class id has no
/// matching class are skipped with a warning rather than failing the export.
pub fn export_image_labels(image: &ImageAnnotation, classes: &[YoloClass]) -> LabelExport {
    let index = class_index_map(classes);
    let mut lines = Vec::with_capacity(image.boxes.len());
    let mut warnings = Vec::new();

    for b in &image.boxes {
        let Some(&class_idx) = index.get(&b.class_id) else {
            warnings.push(format!(
                "{}: skipped box {} (unknown class {})",
                image.filename, b.id, b.class_id
            ));
            continue;
        };
        let (cx, cy) = b.center();
        lines.push(format!(
            "{} {:.6} {:.6} {:.6} {:.6}",
            class_idx, cx, cy, b.width, b.height
        ));
    }

    LabelExport {
        content: lines.join("\n"),
        warnings,
    }
}

/// Parse a label file against an ordered class list.
///
/// Malformed lines and out-of-range class indices are soft failures: the
/// line is skipped and the batch continues. Accepted geometry is converted
/// from center-form to top-left form and clamped into the unit square.
/// Returned boxes carry id 0; the store assigns real ids on import.
pub fn import_labels(content: &str, classes: &[YoloClass]) -> LabelImport {
    let mut sorted: Vec<&YoloClass> = classes.iter().collect();
    sorted.sort_by_key(|c| c.id);

    let mut boxes = Vec::new();
    let mut warnings = Vec::new();

    for (line_idx, raw) in content.lines().enumerate() {
        let line_num = line_idx + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() != 5 {
            warnings.push(ImportWarning::new(
                line_num,
                format!("expected 5 fields, got {}", parts.len()),
            ));
            continue;
        }

        let class_idx: usize = match parts[0].parse() {
            Ok(idx) => idx,
            Err(_) => {
                warnings.push(ImportWarning::new(
                    line_num,
                    format!("invalid class index '{}'", parts[0]),
                ));
                continue;
            }
        };
        let Some(class) = sorted.get(class_idx) else {
            warnings.push(ImportWarning::new(
                line_num,
                format!("class index {} out of range (have {})", class_idx, sorted.len()),
            ));
            continue;
        };

        let mut fields = [0.0f32; 4];
        let mut bad = false;
        for (slot, token) in fields.iter_mut().zip(&parts[1..]) {
            match token.parse::<f32>() {
                Ok(v) if v.is_finite() => *slot = v,
                _ => {
                    bad = true;
                    break;
                }
            }
        }
        if bad {
            warnings.push(ImportWarning::new(line_num, "invalid coordinate value"));
            continue;
        }

        let [cx, cy, w, h] = fields;
        if w <= 0.0 || h <= 0.0 {
            warnings.push(ImportWarning::new(line_num, "non-positive box dimensions"));
            continue;
        }

        let x = (cx - w / 2.0).clamp(0.0, 1.0);
        let y = (cy - h / 2.0).clamp(0.0, 1.0);
        let width = w.clamp(0.0, 1.0).min(1.0 - x);
        let height = h.clamp(0.0, 1.0).min(1.0 - y);

        boxes.push(
            BoundingBox::new(0, x, y, width, height, class.id)
                .with_class_name(class.name.clone()),
        );
    }

    log::debug!(
        "📥 Parsed {} boxes ({} warnings)",
        boxes.len(),
        warnings.len()
    );
    LabelImport { boxes, warnings }
}
