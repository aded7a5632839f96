// Persistence backends for the phase configuration store

use crate::error::StoreError;
use crate::file_manager::{read_json_file_or_default, write_json_file};
use crate::utils::phase_configs_json_path;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

/// Raw persisted entries of one project, keyed `${processId}-${phaseType}`.
/// Values stay undecoded so one malformed entry cannot poison the rest.
pub type RawEntries = BTreeMap<String, Value>;

pub trait ConfigBackend: Send + Sync {
    fn load(&self, project_id: &str) -> Result<RawEntries, StoreError>;
    fn save(&self, project_id: &str, entries: &RawEntries) -> Result<(), StoreError>;
}

/// One JSON document per project under `projects_dir/<project>/phase_configs.json`.
pub struct JsonFileBackend {
    projects_dir: PathBuf,
}

impl JsonFileBackend {
    pub fn new(projects_dir: impl Into<PathBuf>) -> Self {
        Self {
            projects_dir: projects_dir.into(),
        }
    }

    pub fn path_for(&self, project_id: &str) -> PathBuf {
        phase_configs_json_path(&self.projects_dir, project_id)
    }
}

impl ConfigBackend for JsonFileBackend {
    fn load(&self, project_id: &str) -> Result<RawEntries, StoreError> {
        read_json_file_or_default(&self.path_for(project_id))
    }

    fn save(&self, project_id: &str, entries: &RawEntries) -> Result<(), StoreError> {
        write_json_file(&self.path_for(project_id), entries)
    }
}

/// Volatile backend for tests and embedding.
#[derive(Default)]
pub struct MemoryBackend {
    projects: Mutex<HashMap<String, RawEntries>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a project's raw entries, bypassing validation.
    pub fn seed(&self, project_id: &str, entries: RawEntries) {
        self.projects.lock().insert(project_id.to_string(), entries);
    }
}

impl ConfigBackend for MemoryBackend {
    fn load(&self, project_id: &str) -> Result<RawEntries, StoreError> {
        Ok(self
            .projects
            .lock()
            .get(project_id)
            .cloned()
            .unwrap_or_default())
    }

    fn save(&self, project_id: &str, entries: &RawEntries) -> Result<(), StoreError> {
        self.projects
            .lock()
            .insert(project_id.to_string(), entries.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_file_backend_round_trip_per_project() {
        let dir = tempfile::tempdir().unwrap();
        let backend = JsonFileBackend::new(dir.path());
        let mut entries = RawEntries::new();
        entries.insert("p1-modeling".to_string(), json!({ "phaseType": "modeling" }));

        backend.save("alpha", &entries).unwrap();

        assert_eq!(backend.load("alpha").unwrap(), entries);
        assert!(backend.load("beta").unwrap().is_empty());
        assert!(dir.path().join("alpha").join("phase_configs.json").exists());
    }
}
