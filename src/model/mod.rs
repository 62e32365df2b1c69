//! Data models for annotation projects.

mod boxes;
mod class;
mod image;
mod project;

pub use boxes::{BoundingBox, BoxId, BoxPatch, BoxSpec, MIN_BOX_SIZE};
pub use class::{ClassPatch, YoloClass};
pub use image::{ImageAnnotation, ImageId, ImageSource};
pub use project::{
    now_millis, ExportSettings, Project, ProjectId, ProjectSpec, SplitRatios,
};
