//! Error and warning types for codec operations.

use thiserror::Error;

/// Hard failures during export or import.
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no project loaded")]
    NoProject,

    #[error("image {0} not found")]
    ImageNotFound(crate::model::ImageId),
}

/// A per-line soft failure during label import. The offending line is
/// skipped; the rest of the batch proceeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportWarning {
    /// 1-based line number in the label file.
    pub line: usize,
    pub message: String,
}

impl ImportWarning {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ImportWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}
