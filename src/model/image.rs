//! Image records and their annotation lists.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::model::boxes::{BoundingBox, BoxId};

/// Unique identifier for an image within a project.
pub type ImageId = u64;

/// Where the image pixels come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageSource {
    /// A file on disk.
    Path(PathBuf),
    /// Embedded raw bytes (browser uploads, in-memory fixtures).
    Embedded(Vec<u8>),
}

/// A single image and its bounding boxes.
///
/// `width`/`height` are pixel dimensions fixed at creation from the decoded
/// image and never mutated afterward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageAnnotation {
    pub id: ImageId,
    pub filename: String,
    pub source: ImageSource,
    pub width: u32,
    pub height: u32,
    pub boxes: Vec<BoundingBox>,
    #[serde(default)]
    pub completed: bool,
    /// Unix milliseconds of the last mutation touching this image.
    pub last_modified: u64,
}

impl ImageAnnotation {
    pub fn new(id: ImageId, filename: impl Into<String>, source: ImageSource, width: u32, height: u32) -> Self {
        Self {
            id,
            filename: filename.into(),
            source,
            width,
            height,
            boxes: Vec::new(),
            completed: false,
            last_modified: crate::model::project::now_millis(),
        }
    }

    pub fn find_box(&self, id: BoxId) -> Option<&BoundingBox> {
        self.boxes.iter().find(|b| b.id == id)
    }

    pub fn find_box_mut(&mut self, id: BoxId) -> Option<&mut BoundingBox> {
        self.boxes.iter_mut().find(|b| b.id == id)
    }

    /// Filename stem used for the per-image label file.
    pub fn stem(&self) -> &str {
        self.filename
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(&self.filename)
    }
}
