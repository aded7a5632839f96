// Application context: stores, collaborators and settings shared by every command
use crate::catalog::{AlgorithmRegistry, BuiltinAlgorithms, DatasetCatalog, StaticCatalog};
use crate::error::WorkbenchResult;
use crate::file_manager::{initialize_json_file, read_json_file_or_default};
use crate::jobs::JobEngine;
use crate::models::Settings;
use crate::store::{ConfigBackend, JsonFileBackend, PhaseConfigStore, StoreRegistry};
use crate::utils::{get_projects_dir, get_settings_json_path, initialize_data_directories};
use log::warn;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct Workbench {
    stores: StoreRegistry,
    catalog: Arc<dyn DatasetCatalog>,
    algorithms: Arc<dyn AlgorithmRegistry>,
    settings_path: PathBuf,
}

/// Everything a phase command needs for one project.
#[derive(Clone)]
pub struct Project {
    pub store: Arc<PhaseConfigStore>,
    pub catalog: Arc<dyn DatasetCatalog>,
    pub algorithms: Arc<dyn AlgorithmRegistry>,
    pub jobs: JobEngine,
}

impl Workbench {
    pub fn new(
        backend: Arc<dyn ConfigBackend>,
        settings_path: impl Into<PathBuf>,
        catalog: Arc<dyn DatasetCatalog>,
        algorithms: Arc<dyn AlgorithmRegistry>,
    ) -> Self {
        Self {
            stores: StoreRegistry::new(backend),
            catalog,
            algorithms,
            settings_path: settings_path.into(),
        }
    }

    /// Workbench over the application data directory, creating it on first run.
    pub fn open_default(catalog: Arc<dyn DatasetCatalog>) -> WorkbenchResult<Self> {
        initialize_data_directories()?;
        let settings_path = get_settings_json_path();
        initialize_json_file(&settings_path, &Settings::default())?;

        Ok(Self::new(
            Arc::new(JsonFileBackend::new(get_projects_dir())),
            settings_path,
            catalog,
            Arc::new(BuiltinAlgorithms::new()),
        ))
    }

    /// Empty catalog and built-in algorithms over an explicit directory.
    pub fn open_in(root: &Path) -> Self {
        Self::new(
            Arc::new(JsonFileBackend::new(root.join("projects"))),
            root.join("settings.json"),
            Arc::new(StaticCatalog::default()),
            Arc::new(BuiltinAlgorithms::new()),
        )
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    /// Current settings; an unreadable file falls back to defaults.
    pub fn settings(&self) -> Settings {
        read_json_file_or_default(&self.settings_path).unwrap_or_else(|e| {
            warn!("Failed to read settings, using defaults: {}", e);
            Settings::default()
        })
    }

    pub fn catalog(&self) -> &Arc<dyn DatasetCatalog> {
        &self.catalog
    }

    /// Project handle with a job engine bound to the settings in force right now.
    pub fn project(&self, project_id: &str) -> Project {
        let store = self.stores.store(project_id);
        Project {
            jobs: JobEngine::new(store.clone(), self.settings()),
            store,
            catalog: self.catalog.clone(),
            algorithms: self.algorithms.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_handles_share_one_store() {
        let dir = tempfile::tempdir().unwrap();
        let workbench = Workbench::open_in(dir.path());
        let a = workbench.project("proj");
        let b = workbench.project("proj");
        assert!(Arc::ptr_eq(&a.store, &b.store));
        assert!(!Arc::ptr_eq(&a.store, &workbench.project("other").store));
    }

    #[test]
    fn test_missing_settings_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let workbench = Workbench::open_in(dir.path());
        assert_eq!(workbench.settings(), Settings::default());
        assert_eq!(workbench.project("proj").jobs.settings(), &Settings::default());
    }
}
