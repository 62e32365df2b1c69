//! Annotation state management.
//!
//! [`AnnotationStore`] is the single source of truth for the active project
//! and the undo/redo history. All box mutation funnels through one
//! `execute_action` path that guarantees atomicity (validate, apply, commit)
//! and history consistency; callers never mutate project state directly.

mod action;
mod history;
mod persist;

pub use action::{Action, ActionKind};
pub use history::{History, MAX_HISTORY};
#[cfg(not(target_arch = "wasm32"))]
pub use persist::FsProjectStore;
pub use persist::{MemoryProjectStore, PersistError, ProjectStore};

use thiserror::Error;

use crate::model::{
    now_millis, BoundingBox, BoxId, BoxPatch, BoxSpec, ClassPatch, ImageAnnotation, ImageId,
    ImageSource, Project, ProjectId, ProjectSpec, YoloClass,
};

/// Errors surfaced by store operations. Precondition failures (no project,
/// unknown box id) are deliberately NOT errors: those paths are silent no-ops
/// per the store's contract, since callers do not check preconditions first.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("invalid project spec: {0}")]
    InvalidSpec(String),

    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Change notification delivered synchronously after each committed mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// Project loaded, created, deleted, or its classes/images changed shape.
    ProjectChanged,
    /// The box list of one image changed.
    BoxesChanged { image_id: ImageId },
    /// Box selection changed.
    SelectionChanged { selected: Option<BoxId> },
    /// The navigation cursor moved.
    NavigationChanged { index: usize },
}

/// Completion progress over the current project's images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProjectProgress {
    pub completed: usize,
    pub total: usize,
    pub percentage: u32,
}

/// An image to append to the current project during bulk intake.
#[derive(Debug, Clone)]
pub struct ImageSpec {
    pub filename: String,
    pub source: ImageSource,
    pub width: u32,
    pub height: u32,
}

type Observer = Box<dyn Fn(&StoreEvent)>;

/// Owner of the current project, selection/navigation cursor, and the
/// undo/redo action log.
pub struct AnnotationStore {
    project: Option<Project>,
    current_index: usize,
    selected_box: Option<BoxId>,
    history: History,
    persistence: Box<dyn ProjectStore>,
    observers: Vec<Observer>,
    loading: bool,
    last_error: Option<String>,
}

impl AnnotationStore {
    pub fn new(persistence: Box<dyn ProjectStore>) -> Self {
        Self {
            project: None,
            current_index: 0,
            selected_box: None,
            history: History::new(),
            persistence,
            observers: Vec::new(),
            loading: false,
            last_error: None,
        }
    }

    /// Store backed by in-memory persistence.
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryProjectStore::new()))
    }

    // ========================================================================
    // Project management
    // ========================================================================

    /// Create a new project from a spec; it becomes current and history is
    /// cleared. Fails only on a structurally invalid spec.
    pub fn create_project(&mut self, spec: ProjectSpec) -> Result<ProjectId, StoreError> {
        if let Some(ratios) = spec.export.split {
            if !ratios.is_valid() {
                return Err(StoreError::InvalidSpec(format!(
                    "split ratios must be non-negative with a positive sum, got {}/{}/{}",
                    ratios.train, ratios.val, ratios.test
                )));
            }
        }
        let mut seen = std::collections::HashSet::new();
        for class in &spec.classes {
            if !seen.insert(class.id) {
                return Err(StoreError::InvalidSpec(format!(
                    "duplicate class id {}",
                    class.id
                )));
            }
        }

        let id = self.generate_project_id();
        let now = now_millis();
        let project = Project {
            id,
            name: spec.name,
            description: spec.description,
            classes: spec.classes,
            images: Vec::new(),
            export: spec.export,
            created_at: now,
            last_modified: now,
            next_box_id: 1,
            next_image_id: 1,
        };

        log::info!("Created project {} '{}'", id, project.name);
        self.project = Some(project);
        self.current_index = 0;
        self.selected_box = None;
        self.history.clear();
        self.persist();
        self.notify(&StoreEvent::ProjectChanged);
        Ok(id)
    }

    /// Load a project from the durable store, replacing the current one.
    /// Returns `Ok(false)` if the id is unknown (no state change).
    pub fn load_project(&mut self, id: ProjectId) -> Result<bool, StoreError> {
        let Some(project) = self.persistence.load(id)? else {
            log::debug!("load_project: unknown id {id}");
            return Ok(false);
        };

        log::info!("Loaded project {} '{}'", id, project.name);
        self.project = Some(project);
        self.current_index = 0;
        self.selected_box = None;
        self.history.clear();
        self.notify(&StoreEvent::ProjectChanged);
        Ok(true)
    }

    /// Remove a project from the durable store; unloads it if current.
    pub fn delete_project(&mut self, id: ProjectId) -> Result<(), StoreError> {
        self.persistence.delete(id)?;
        if self.project.as_ref().is_some_and(|p| p.id == id) {
            self.project = None;
            self.current_index = 0;
            self.selected_box = None;
            self.history.clear();
            self.notify(&StoreEvent::ProjectChanged);
        }
        Ok(())
    }

    /// Ids of all projects in the durable store.
    pub fn stored_projects(&self) -> Result<Vec<ProjectId>, StoreError> {
        Ok(self.persistence.list()?)
    }

    // ========================================================================
    // Image navigation and intake
    // ========================================================================

    /// Move the navigation cursor, clamped into the image list. Clears box
    /// selection. No-op with no project or an empty image list.
    pub fn select_image(&mut self, index: usize) {
        let Some(project) = self.project.as_ref() else {
            return;
        };
        if project.images.is_empty() {
            return;
        }

        let clamped = index.min(project.images.len() - 1);
        self.current_index = clamped;
        self.set_selection(None);
        self.notify(&StoreEvent::NavigationChanged { index: clamped });
    }

    /// Advance to the next image. No wraparound: a no-op at the last image.
    pub fn next_image(&mut self) {
        let Some(project) = self.project.as_ref() else {
            return;
        };
        if self.current_index + 1 < project.images.len() {
            self.select_image(self.current_index + 1);
        }
    }

    /// Go back to the previous image. No wraparound: a no-op at index 0.
    pub fn previous_image(&mut self) {
        if self.current_index > 0 {
            self.select_image(self.current_index - 1);
        }
    }

    /// Append images from bulk file intake. Not recorded in history; images
    /// enter the project outside the box action log.
    pub fn add_images(&mut self, specs: Vec<ImageSpec>) {
        let Some(project) = self.project.as_mut() else {
            return;
        };
        if specs.is_empty() {
            return;
        }

        for spec in specs {
            let id = project.alloc_image_id();
            project.images.push(ImageAnnotation::new(
                id,
                spec.filename,
                spec.source,
                spec.width,
                spec.height,
            ));
        }
        project.touch();
        log::debug!("Project now has {} images", project.images.len());
        self.persist();
        self.notify(&StoreEvent::ProjectChanged);
    }

    /// Mark an image as completed; defaults to the current image.
    pub fn mark_image_completed(&mut self, image_id: Option<ImageId>) {
        let target = match image_id.or_else(|| self.current_image().map(|img| img.id)) {
            Some(id) => id,
            None => return,
        };
        let Some(project) = self.project.as_mut() else {
            return;
        };
        let Some(image) = project.find_image_mut(target) else {
            return;
        };
        image.completed = true;
        image.last_modified = now_millis();
        project.touch();
        self.persist();
        self.notify(&StoreEvent::ProjectChanged);
    }

    // ========================================================================
    // Bounding box operations
    // ========================================================================

    /// Create a box on the current image. Returns the new id, or `None` if
    /// there is no project or no current image.
    pub fn create_bounding_box(&mut self, spec: BoxSpec) -> Option<BoxId> {
        let image_id = self.current_image().map(|img| img.id)?;
        let project = self.project.as_mut()?;

        let id = project.alloc_box_id();
        let class_name = project
            .find_class(spec.class_id)
            .map(|c| c.name.clone())
            .unwrap_or_default();
        let mut created = BoundingBox::new(id, spec.x, spec.y, spec.width, spec.height, spec.class_id)
            .with_class_name(class_name);
        created.confidence = spec.confidence;

        self.execute_action(Action::new(ActionKind::CreateBox { created }, image_id));
        Some(id)
    }

    /// Apply a partial update to a box on the current image. Unknown ids are
    /// a silent no-op (history is left untouched).
    pub fn update_bounding_box(&mut self, box_id: BoxId, patch: BoxPatch) {
        let Some(image) = self.current_image() else {
            return;
        };
        let image_id = image.id;
        let Some(previous) = image.find_box(box_id).cloned() else {
            log::debug!("update_bounding_box: no box {box_id} on image {image_id}");
            return;
        };

        let mut updated = patch.apply_to(&previous);
        // Reassigning the class refreshes the cached name unless the caller
        // supplied one explicitly.
        if patch.class_id.is_some() && patch.class_name.is_none() {
            if let Some(project) = self.project.as_ref() {
                if let Some(class) = project.find_class(updated.class_id) {
                    updated.class_name = class.name.clone();
                }
            }
        }
        if updated == previous {
            return;
        }

        self.execute_action(Action::new(
            ActionKind::UpdateBox {
                box_id,
                previous,
                updated,
            },
            image_id,
        ));
    }

    /// Delete a box on the current image. Clears selection if it was the
    /// selected box. Unknown ids are a silent no-op.
    pub fn delete_bounding_box(&mut self, box_id: BoxId) {
        let Some(image) = self.current_image() else {
            return;
        };
        let image_id = image.id;
        let Some(deleted) = image.find_box(box_id).cloned() else {
            log::debug!("delete_bounding_box: no box {box_id} on image {image_id}");
            return;
        };

        self.execute_action(Action::new(ActionKind::DeleteBox { deleted }, image_id));
    }

    /// Select a box on the current image, or clear selection with `None`.
    pub fn select_bounding_box(&mut self, box_id: Option<BoxId>) {
        let resolved = box_id.filter(|id| {
            self.current_image()
                .is_some_and(|img| img.find_box(*id).is_some())
        });
        self.set_selection(resolved);
    }

    /// Replace an image's entire box list (bulk import). Recorded as one
    /// fully invertible `BatchReplace` action. Incoming boxes get fresh ids.
    pub fn import_annotations(&mut self, image_id: ImageId, boxes: Vec<BoundingBox>) {
        let Some(project) = self.project.as_mut() else {
            return;
        };
        let Some(before) = project.find_image(image_id).map(|img| img.boxes.clone()) else {
            log::debug!("import_annotations: no image {image_id}");
            return;
        };

        let after: Vec<BoundingBox> = boxes
            .into_iter()
            .map(|mut b| {
                b.id = project.alloc_box_id();
                b
            })
            .collect();

        self.execute_action(Action::new(
            ActionKind::BatchReplace { before, after },
            image_id,
        ));
    }

    // ========================================================================
    // Class management
    // ========================================================================

    /// Add a class with the next free id. Returns the id, or `None` with no
    /// current project.
    pub fn add_class(
        &mut self,
        name: impl Into<String>,
        color: impl Into<String>,
        shortcut: Option<char>,
    ) -> Option<u32> {
        let project = self.project.as_mut()?;
        let id = project.classes.iter().map(|c| c.id + 1).max().unwrap_or(0);
        let mut class = YoloClass::new(id, name, color);
        class.shortcut = shortcut;
        project.classes.push(class);
        project.touch();
        self.persist();
        self.notify(&StoreEvent::ProjectChanged);
        Some(id)
    }

    /// Apply a partial update to a class. Renames refresh the cached
    /// `class_name` on every box of that class.
    pub fn update_class(&mut self, class_id: u32, patch: ClassPatch) {
        let Some(project) = self.project.as_mut() else {
            return;
        };
        let Some(pos) = project.classes.iter().position(|c| c.id == class_id) else {
            return;
        };

        let updated = patch.apply_to(&project.classes[pos]);
        let renamed = updated.name != project.classes[pos].name;
        project.classes[pos] = updated.clone();

        if renamed {
            for image in &mut project.images {
                for b in image.boxes.iter_mut().filter(|b| b.class_id == class_id) {
                    b.class_name = updated.name.clone();
                }
            }
        }
        project.touch();
        self.persist();
        self.notify(&StoreEvent::ProjectChanged);
    }

    /// Delete a class, cascading to every box referencing it across all
    /// images. The cascade is one undoable action.
    pub fn delete_class(&mut self, class_id: u32) {
        let Some(project) = self.project.as_ref() else {
            return;
        };
        let Some(class_index) = project.classes.iter().position(|c| c.id == class_id) else {
            return;
        };

        let class = project.classes[class_index].clone();
        let removed: Vec<(ImageId, Vec<BoundingBox>)> = project
            .images
            .iter()
            .filter_map(|img| {
                let boxes: Vec<BoundingBox> = img
                    .boxes
                    .iter()
                    .filter(|b| b.class_id == class_id)
                    .cloned()
                    .collect();
                (!boxes.is_empty()).then(|| (img.id, boxes))
            })
            .collect();

        self.execute_action(Action::new(
            ActionKind::DeleteClass {
                class,
                class_index,
                removed,
            },
            0,
        ));
        self.notify(&StoreEvent::ProjectChanged);
    }

    // ========================================================================
    // Undo / redo
    // ========================================================================

    /// Undo the most recent action. No-op if the undo stack is empty.
    pub fn undo(&mut self) {
        let Some(action) = self.history.pop_undo() else {
            return;
        };
        if let Some(project) = self.project.as_mut() {
            action.revert(project);
        }
        self.commit_after_history(&action);
    }

    /// Redo the most recently undone action. Re-applies it forward through a
    /// path distinct from `execute_action`, so the redo stack survives.
    pub fn redo(&mut self) {
        let Some(action) = self.history.pop_redo() else {
            return;
        };
        if let Some(project) = self.project.as_mut() {
            action.apply(project);
        }
        self.commit_after_history(&action);
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    // ========================================================================
    // Read views
    // ========================================================================

    pub fn current_project(&self) -> Option<&Project> {
        self.project.as_ref()
    }

    pub fn current_image_index(&self) -> usize {
        self.current_index
    }

    pub fn current_image(&self) -> Option<&ImageAnnotation> {
        self.project.as_ref()?.images.get(self.current_index)
    }

    pub fn selected_box(&self) -> Option<&BoundingBox> {
        let id = self.selected_box?;
        self.current_image()?.find_box(id)
    }

    pub fn classes(&self) -> &[YoloClass] {
        match self.project.as_ref() {
            Some(p) => &p.classes,
            None => &[],
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Completed/total image counts with a rounded percentage.
    pub fn progress(&self) -> ProjectProgress {
        let Some(project) = self.project.as_ref() else {
            return ProjectProgress::default();
        };
        let total = project.images.len();
        let completed = project.images.iter().filter(|img| img.completed).count();
        let percentage = if total > 0 {
            ((completed as f64 / total as f64) * 100.0).round() as u32
        } else {
            0
        };
        ProjectProgress {
            completed,
            total,
            percentage,
        }
    }

    /// Register an observer, called synchronously after each committed
    /// mutation. Observers read canonical state through the store; nothing
    /// they receive is mutable.
    pub fn subscribe(&mut self, observer: impl Fn(&StoreEvent) + 'static) {
        self.observers.push(Box::new(observer));
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// The single mutation funnel: apply, record, persist, notify. The
    /// caller has already validated the action against current state, so
    /// `apply` cannot partially fail.
    fn execute_action(&mut self, action: Action) {
        let Some(project) = self.project.as_mut() else {
            return;
        };
        action.apply(project);
        self.history.push(action.clone());
        self.reconcile_selection();
        self.persist();
        self.notify(&StoreEvent::BoxesChanged {
            image_id: action.image_id,
        });
    }

    fn commit_after_history(&mut self, action: &Action) {
        self.reconcile_selection();
        self.persist();
        self.notify(&StoreEvent::BoxesChanged {
            image_id: action.image_id,
        });
    }

    /// Clear the selection if its box no longer exists on the current image.
    fn reconcile_selection(&mut self) {
        if let Some(id) = self.selected_box {
            let alive = self
                .current_image()
                .is_some_and(|img| img.find_box(id).is_some());
            if !alive {
                self.set_selection(None);
            }
        }
    }

    fn set_selection(&mut self, selected: Option<BoxId>) {
        if self.selected_box != selected {
            self.selected_box = selected;
            self.notify(&StoreEvent::SelectionChanged { selected });
        }
    }

    /// Persist the current project snapshot. An IO failure is surfaced via
    /// `last_error` and the log; committed in-memory state is never rolled
    /// back.
    fn persist(&mut self) {
        let Some(project) = self.project.as_ref() else {
            return;
        };
        match self.persistence.save(project) {
            Ok(()) => self.last_error = None,
            Err(e) => {
                log::warn!("Failed to persist project {}: {}", project.id, e);
                self.last_error = Some(format!("Failed to save project: {e}"));
            }
        }
    }

    fn notify(&self, event: &StoreEvent) {
        for observer in &self.observers {
            observer(event);
        }
    }

    fn generate_project_id(&self) -> ProjectId {
        match self.persistence.list() {
            Ok(ids) => ids.into_iter().max().map_or(1, |max| max + 1),
            Err(_) => now_millis(),
        }
    }
}

#[cfg(test)]
mod tests;
