//! Class (label category) definitions.

use serde::{Deserialize, Serialize};

/// A named, colored category assignable to boxes.
///
/// Ids are unique within a project and never reused. Boxes reference classes
/// by id; the box-side `class_name` is only a display cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YoloClass {
    pub id: u32,
    pub name: String,
    /// Display color as a hex string, e.g. "#ff0000".
    pub color: String,
    /// Optional single-key shortcut for quick class selection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shortcut: Option<char>,
}

impl YoloClass {
    pub fn new(id: u32, name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            color: color.into(),
            shortcut: None,
        }
    }

    pub fn with_shortcut(mut self, shortcut: char) -> Self {
        self.shortcut = Some(shortcut);
        self
    }
}

/// Partial update for a class. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct ClassPatch {
    pub name: Option<String>,
    pub color: Option<String>,
    pub shortcut: Option<Option<char>>,
}

impl ClassPatch {
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn apply_to(&self, existing: &YoloClass) -> YoloClass {
        let mut updated = existing.clone();
        if let Some(ref name) = self.name {
            updated.name = name.clone();
        }
        if let Some(ref color) = self.color {
            updated.color = color.clone();
        }
        if let Some(shortcut) = self.shortcut {
            updated.shortcut = shortcut;
        }
        updated
    }
}
