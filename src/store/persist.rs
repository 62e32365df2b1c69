//! Durable project persistence.
//!
//! The store treats persistence as a single mutable slot per project id,
//! overwritten wholesale on every committed mutation. The [`AnnotationStore`]
//! is the only writer.
//!
//! [`AnnotationStore`]: crate::store::AnnotationStore

use std::collections::HashMap;

use thiserror::Error;

use crate::model::{Project, ProjectId};

/// Errors from the durable key-value store.
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no storage directory available")]
    NoStorageDir,
}

/// A key-value slot per project id holding the full serialized project tree.
pub trait ProjectStore {
    /// Overwrite the record for `project.id`.
    fn save(&mut self, project: &Project) -> Result<(), PersistError>;

    /// Load a project by id; `Ok(None)` if no record exists.
    fn load(&self, id: ProjectId) -> Result<Option<Project>, PersistError>;

    /// Remove the record for a project id, if any.
    fn delete(&mut self, id: ProjectId) -> Result<(), PersistError>;

    /// Ids of all stored projects.
    fn list(&self) -> Result<Vec<ProjectId>, PersistError>;
}

/// In-memory store, used in tests and as the default backend on targets
/// without filesystem access.
#[derive(Debug, Default)]
pub struct MemoryProjectStore {
    records: HashMap<ProjectId, String>,
}

impl MemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProjectStore for MemoryProjectStore {
    fn save(&mut self, project: &Project) -> Result<(), PersistError> {
        let json = serde_json::to_string(project)?;
        self.records.insert(project.id, json);
        Ok(())
    }

    fn load(&self, id: ProjectId) -> Result<Option<Project>, PersistError> {
        match self.records.get(&id) {
            Some(json) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }

    fn delete(&mut self, id: ProjectId) -> Result<(), PersistError> {
        self.records.remove(&id);
        Ok(())
    }

    fn list(&self) -> Result<Vec<ProjectId>, PersistError> {
        Ok(self.records.keys().copied().collect())
    }
}

/// Filesystem store: one JSON file per project id in a data directory.
#[cfg(not(target_arch = "wasm32"))]
pub struct FsProjectStore {
    dir: std::path::PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl FsProjectStore {
    /// Open a store rooted at the given directory, creating it if needed.
    pub fn new(dir: impl Into<std::path::PathBuf>) -> Result<Self, PersistError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Open the store at the platform data directory, falling back to the
    /// home directory.
    pub fn default_location() -> Result<Self, PersistError> {
        let base = if let Some(data_dir) = dirs::data_dir() {
            data_dir.join("yat").join("projects")
        } else if let Some(home_dir) = dirs::home_dir() {
            home_dir.join(".yat").join("projects")
        } else {
            return Err(PersistError::NoStorageDir);
        };
        Self::new(base)
    }

    fn record_path(&self, id: ProjectId) -> std::path::PathBuf {
        self.dir.join(format!("{id}.json"))
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl ProjectStore for FsProjectStore {
    fn save(&mut self, project: &Project) -> Result<(), PersistError> {
        let json = serde_json::to_string(project)?;
        log::trace!("Persisting project {} ({} bytes)", project.id, json.len());
        std::fs::write(self.record_path(project.id), json)?;
        Ok(())
    }

    fn load(&self, id: ProjectId) -> Result<Option<Project>, PersistError> {
        let path = self.record_path(id);
        if !path.exists() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&json)?))
    }

    fn delete(&mut self, id: ProjectId) -> Result<(), PersistError> {
        let path = self.record_path(id);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    fn list(&self) -> Result<Vec<ProjectId>, PersistError> {
        let mut ids = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Ok(id) = stem.parse::<ProjectId>() {
                    ids.push(id);
                }
            }
        }
        Ok(ids)
    }
}
