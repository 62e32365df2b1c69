//! Reversible annotation actions.
//!
//! Every mutation of box data is expressed as an [`Action`] that can be both
//! applied and reverted, so undo stays symmetric by construction instead of
//! re-deriving inverses by hand at each call site.

use serde::{Deserialize, Serialize};

use crate::model::{now_millis, BoundingBox, BoxId, ImageId, Project, YoloClass};

/// The reversible payload of one state mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActionKind {
    /// A box was added to an image.
    CreateBox { created: BoundingBox },
    /// A box changed; both snapshots are kept so revert is exact.
    UpdateBox {
        box_id: BoxId,
        previous: BoundingBox,
        updated: BoundingBox,
    },
    /// A box was removed; the snapshot allows re-insertion on undo.
    DeleteBox { deleted: BoundingBox },
    /// An image's whole box list was replaced (bulk import). Both lists are
    /// stored in full so the replacement is totally invertible.
    BatchReplace {
        before: Vec<BoundingBox>,
        after: Vec<BoundingBox>,
    },
    /// A class was deleted, cascading to every box referencing it. Captures
    /// the class and the removed boxes per image so undo restores all of it.
    DeleteClass {
        class: YoloClass,
        /// Position of the class in the project's class list.
        class_index: usize,
        removed: Vec<(ImageId, Vec<BoundingBox>)>,
    },
}

/// One entry of the append-only action log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub kind: ActionKind,
    /// Unix milliseconds when the action was recorded.
    pub timestamp: u64,
    /// Image this action is scoped to; 0 for project-wide class deletion.
    pub image_id: ImageId,
}

impl Action {
    pub fn new(kind: ActionKind, image_id: ImageId) -> Self {
        Self {
            kind,
            timestamp: now_millis(),
            image_id,
        }
    }

    /// Human-readable description for history UIs and logs.
    pub fn description(&self) -> String {
        match &self.kind {
            ActionKind::CreateBox { .. } => "Create box".to_string(),
            ActionKind::UpdateBox { .. } => "Move/resize box".to_string(),
            ActionKind::DeleteBox { .. } => "Delete box".to_string(),
            ActionKind::BatchReplace { after, .. } => {
                format!("Replace {} boxes", after.len())
            }
            ActionKind::DeleteClass { class, .. } => {
                format!("Delete class '{}'", class.name)
            }
        }
    }

    /// Apply the action forward. Total for actions built against the current
    /// state: a missing image or box is ignored rather than corrupting state.
    pub fn apply(&self, project: &mut Project) {
        match &self.kind {
            ActionKind::CreateBox { created } => {
                if let Some(image) = project.find_image_mut(self.image_id) {
                    image.boxes.push(created.clone());
                    image.last_modified = self.timestamp;
                }
            }
            ActionKind::UpdateBox { box_id, updated, .. } => {
                if let Some(image) = project.find_image_mut(self.image_id) {
                    if let Some(existing) = image.find_box_mut(*box_id) {
                        *existing = updated.clone();
                    }
                    image.last_modified = self.timestamp;
                }
            }
            ActionKind::DeleteBox { deleted } => {
                if let Some(image) = project.find_image_mut(self.image_id) {
                    image.boxes.retain(|b| b.id != deleted.id);
                    image.last_modified = self.timestamp;
                }
            }
            ActionKind::BatchReplace { after, .. } => {
                if let Some(image) = project.find_image_mut(self.image_id) {
                    image.boxes = after.clone();
                    image.last_modified = self.timestamp;
                }
            }
            ActionKind::DeleteClass { class, removed, .. } => {
                project.classes.retain(|c| c.id != class.id);
                for (image_id, _) in removed {
                    if let Some(image) = project.find_image_mut(*image_id) {
                        image.boxes.retain(|b| b.class_id != class.id);
                        image.last_modified = self.timestamp;
                    }
                }
            }
        }
        project.touch();
    }

    /// Apply the inverse transform.
    pub fn revert(&self, project: &mut Project) {
        match &self.kind {
            ActionKind::CreateBox { created } => {
                if let Some(image) = project.find_image_mut(self.image_id) {
                    image.boxes.retain(|b| b.id != created.id);
                }
            }
            ActionKind::UpdateBox { box_id, previous, .. } => {
                if let Some(image) = project.find_image_mut(self.image_id) {
                    if let Some(existing) = image.find_box_mut(*box_id) {
                        *existing = previous.clone();
                    }
                }
            }
            ActionKind::DeleteBox { deleted } => {
                if let Some(image) = project.find_image_mut(self.image_id) {
                    image.boxes.push(deleted.clone());
                }
            }
            ActionKind::BatchReplace { before, .. } => {
                if let Some(image) = project.find_image_mut(self.image_id) {
                    image.boxes = before.clone();
                }
            }
            ActionKind::DeleteClass {
                class,
                class_index,
                removed,
            } => {
                let index = (*class_index).min(project.classes.len());
                project.classes.insert(index, class.clone());
                for (image_id, boxes) in removed {
                    if let Some(image) = project.find_image_mut(*image_id) {
                        image.boxes.extend(boxes.iter().cloned());
                    }
                }
            }
        }
        project.touch();
    }
}
