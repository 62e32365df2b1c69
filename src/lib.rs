//! YAT - YOLO Annotation Tool
//!
//! Core engine for an image-annotation editor working in the YOLO
//! bounding-box format: a transactional annotation store with undo/redo and
//! durable persistence, a canvas coordinate/interaction engine, and the
//! dataset codec for label export and import.

pub mod canvas;
pub mod format;
#[cfg(not(target_arch = "wasm32"))]
pub mod intake;
pub mod model;
pub mod store;

pub use model::{
    BoundingBox, BoxId, BoxPatch, BoxSpec, ClassPatch, ExportSettings, ImageAnnotation, ImageId,
    ImageSource, Project, ProjectId, ProjectSpec, SplitRatios, YoloClass, MIN_BOX_SIZE,
};
pub use store::{AnnotationStore, ImageSpec, StoreError, StoreEvent};
