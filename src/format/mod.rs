//! YOLO dataset codec.
//!
//! Translation between the store's normalized box representation and the
//! YOLO label-line format, plus manifest/descriptor generation, dataset
//! splitting, pre-export validation, and the filesystem export tree.

mod dataset;
mod error;
#[cfg(not(target_arch = "wasm32"))]
mod export;
mod yolo;

pub use dataset::{
    generate_data_yaml, split_dataset, validate_project, ClassCount, ExportStats, Split,
    SplitAssignment, ValidationIssue,
};
pub use error::{FormatError, ImportWarning};
#[cfg(not(target_arch = "wasm32"))]
pub use export::{export_to_directory, ExportReport};
pub use yolo::{
    class_index_map, classes_manifest, export_image_labels, import_labels, LabelExport,
    LabelImport,
};
