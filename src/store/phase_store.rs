//! Phase configuration store.
//!
//! Configuration is keyed `(processId, phaseType)`, but the aggregation accessors
//! deliberately ignore `processId`: any process's data collection output is visible to
//! any process's modeling phase, and so on down the workflow.
//!
//! Every mutation is read-merge-write of the whole project state under the store's
//! write lock, so job completions and user edits on the same project serialise.

use super::backend::{ConfigBackend, RawEntries};
use crate::error::{StoreError, ValidationError, WorkbenchResult};
use crate::models::{
    EvaluationConfig, EvaluationRun, PhaseConfig, PhasePayload, PhaseType, ProductionConfig,
    ProductionVersion, SelectedDatasetConfig, TrainingRun, VersionStatus,
};
use log::{debug, warn};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::sync::Arc;

pub struct PhaseConfigStore {
    project_id: String,
    backend: Arc<dyn ConfigBackend>,
    write_lock: Mutex<()>,
}

impl PhaseConfigStore {
    pub fn new(project_id: impl Into<String>, backend: Arc<dyn ConfigBackend>) -> Self {
        Self {
            project_id: project_id.into(),
            backend,
            write_lock: Mutex::new(()),
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn key(process_id: &str, phase_type: PhaseType) -> String {
        format!("{}-{}", process_id, phase_type.as_str())
    }

    /// Split a key on its phase-type suffix; process ids may themselves contain dashes.
    pub fn parse_key(key: &str) -> Option<(&str, PhaseType)> {
        PhaseType::ALL.iter().find_map(|phase_type| {
            key.strip_suffix(phase_type.as_str())
                .and_then(|rest| rest.strip_suffix('-'))
                .filter(|process_id| !process_id.is_empty())
                .map(|process_id| (process_id, *phase_type))
        })
    }

    /// Malformed persisted state is treated as empty rather than fatal.
    fn load_entries(&self) -> Result<RawEntries, StoreError> {
        match self.backend.load(&self.project_id) {
            Ok(entries) => Ok(entries),
            Err(StoreError::Json { path, source }) => {
                warn!(
                    "Phase configs for project {} are corrupt ({:?}: {}); starting empty",
                    self.project_id, path, source
                );
                Ok(RawEntries::new())
            }
            Err(e) => Err(e),
        }
    }

    fn load_for_read(&self) -> RawEntries {
        self.load_entries().unwrap_or_else(|e| {
            warn!("Failed to load phase configs for project {}: {}", self.project_id, e);
            RawEntries::new()
        })
    }

    fn decode(key: &str, value: &Value) -> Option<(String, PhaseConfig)> {
        let Some((process_id, phase_type)) = Self::parse_key(key) else {
            warn!("Ignoring phase config with unrecognised key {}", key);
            return None;
        };
        match serde_json::from_value::<PhaseConfig>(value.clone()) {
            Ok(config) if config.phase_type() == phase_type => Some((process_id.to_string(), config)),
            Ok(config) => {
                warn!(
                    "Ignoring phase config {}: payload is tagged {}",
                    key,
                    config.phase_type()
                );
                None
            }
            Err(e) => {
                warn!("Ignoring malformed phase config {}: {}", key, e);
                None
            }
        }
    }

    fn current(entries: &RawEntries, process_id: &str, phase_type: PhaseType) -> PhaseConfig {
        let key = Self::key(process_id, phase_type);
        entries
            .get(&key)
            .and_then(|value| Self::decode(&key, value))
            .map(|(_, config)| config)
            .unwrap_or_else(|| PhaseConfig::empty(phase_type))
    }

    pub fn get(&self, process_id: &str, phase_type: PhaseType) -> Option<PhaseConfig> {
        let key = Self::key(process_id, phase_type);
        let entries = self.load_for_read();
        entries
            .get(&key)
            .and_then(|value| Self::decode(&key, value))
            .map(|(_, config)| config)
    }

    /// Typed read; an absent config yields the payload's default.
    pub fn read<T: PhasePayload + Clone + Default>(&self, process_id: &str) -> T {
        self.get(process_id, T::PHASE_TYPE)
            .and_then(|config| T::from_config(&config).cloned())
            .unwrap_or_default()
    }

    /// Every decodable `(processId, config)` pair in key order.
    pub fn entries(&self) -> Vec<(String, PhaseConfig)> {
        self.load_for_read()
            .iter()
            .filter_map(|(key, value)| Self::decode(key, value))
            .collect()
    }

    /// Project-wide aggregation, ignoring which process each config was written under.
    pub fn get_all_of_type(&self, phase_type: PhaseType) -> Vec<PhaseConfig> {
        self.entries()
            .into_iter()
            .filter(|(_, config)| config.phase_type() == phase_type)
            .map(|(_, config)| config)
            .collect()
    }

    pub fn all<T: PhasePayload + Clone>(&self) -> Vec<T> {
        self.get_all_of_type(T::PHASE_TYPE)
            .iter()
            .filter_map(|config| T::from_config(config).cloned())
            .collect()
    }

    /// Shallow merge: each top-level key of `partial` replaces the stored field wholesale.
    pub fn update(
        &self,
        process_id: &str,
        phase_type: PhaseType,
        partial: Map<String, Value>,
    ) -> WorkbenchResult<PhaseConfig> {
        let _guard = self.write_lock.lock();
        let mut entries = self.load_entries()?;

        let current = Self::current(&entries, process_id, phase_type);
        let mut merged = match serde_json::to_value(&current)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        for (field, value) in partial {
            if field == "phaseType" {
                let actual: PhaseType = serde_json::from_value(value).map_err(|e| {
                    ValidationError::InvalidPartial {
                        reason: e.to_string(),
                    }
                })?;
                if actual != phase_type {
                    return Err(ValidationError::PhaseTypeMismatch {
                        expected: phase_type,
                        actual,
                    }
                    .into());
                }
                continue;
            }
            merged.insert(field, value);
        }

        let updated: PhaseConfig = serde_json::from_value(Value::Object(merged.clone()))
            .map_err(|e| ValidationError::InvalidPartial {
                reason: e.to_string(),
            })?;

        entries.insert(Self::key(process_id, phase_type), Value::Object(merged));
        self.backend.save(&self.project_id, &entries)?;

        debug!("Updated {} config for process {}", phase_type, process_id);
        Ok(updated)
    }

    /// Read-modify-write of one config. Nothing is written when `f` returns an error or
    /// leaves the config unchanged. `f` must not call back into this store.
    pub fn update_with<F, R>(&self, process_id: &str, phase_type: PhaseType, f: F) -> WorkbenchResult<R>
    where
        F: FnOnce(&mut PhaseConfig) -> WorkbenchResult<R>,
    {
        let _guard = self.write_lock.lock();
        let mut entries = self.load_entries()?;

        let mut config = Self::current(&entries, process_id, phase_type);
        let before = config.clone();
        let result = f(&mut config)?;
        if config == before {
            return Ok(result);
        }
        if config.phase_type() != phase_type {
            return Err(ValidationError::PhaseTypeMismatch {
                expected: phase_type,
                actual: config.phase_type(),
            }
            .into());
        }

        entries.insert(Self::key(process_id, phase_type), serde_json::to_value(&config)?);
        self.backend.save(&self.project_id, &entries)?;

        debug!("Updated {} config for process {}", phase_type, process_id);
        Ok(result)
    }

    /// Typed counterpart of `update_with`.
    pub fn modify<T, F, R>(&self, process_id: &str, f: F) -> WorkbenchResult<R>
    where
        T: PhasePayload,
        F: FnOnce(&mut T) -> WorkbenchResult<R>,
    {
        self.update_with(process_id, T::PHASE_TYPE, |config| {
            let actual = config.phase_type();
            let payload = T::from_config_mut(config).ok_or(ValidationError::PhaseTypeMismatch {
                expected: T::PHASE_TYPE,
                actual,
            })?;
            f(payload)
        })
    }

    /// Apply `f` to every config of one type project-wide in a single write.
    /// Returns how many configs reported a change.
    pub fn modify_all<T, F>(&self, mut f: F) -> WorkbenchResult<usize>
    where
        T: PhasePayload,
        F: FnMut(&str, &mut T) -> bool,
    {
        let _guard = self.write_lock.lock();
        let mut entries = self.load_entries()?;

        let mut changed = 0;
        let keys: Vec<String> = entries.keys().cloned().collect();
        for key in keys {
            let Some(value) = entries.get(&key) else {
                continue;
            };
            let Some((process_id, mut config)) = Self::decode(&key, value) else {
                continue;
            };
            if let Some(payload) = T::from_config_mut(&mut config) {
                if f(&process_id, payload) {
                    entries.insert(key, serde_json::to_value(&config)?);
                    changed += 1;
                }
            }
        }

        if changed > 0 {
            self.backend.save(&self.project_id, &entries)?;
            debug!("Updated {} {} configs in project {}", changed, T::PHASE_TYPE, self.project_id);
        }
        Ok(changed)
    }

    pub fn remove(&self, process_id: &str, phase_type: PhaseType) -> WorkbenchResult<bool> {
        let _guard = self.write_lock.lock();
        let mut entries = self.load_entries()?;
        let removed = entries.remove(&Self::key(process_id, phase_type)).is_some();
        if removed {
            self.backend.save(&self.project_id, &entries)?;
        }
        Ok(removed)
    }

    /// Every dataset selection made in any data collection phase of the project.
    pub fn all_selected_datasets(&self) -> Vec<SelectedDatasetConfig> {
        self.all::<crate::models::DataCollectionConfig>()
            .into_iter()
            .flat_map(|c| c.selected_datasets)
            .collect()
    }

    /// Every training run from any modeling phase of the project.
    pub fn all_training_runs(&self) -> Vec<TrainingRun> {
        self.all::<crate::models::ModelingConfig>()
            .into_iter()
            .flat_map(|c| c.training_runs)
            .collect()
    }

    pub fn all_evaluation_runs(&self) -> Vec<EvaluationRun> {
        self.all::<EvaluationConfig>()
            .into_iter()
            .flat_map(|c| c.evaluation_runs)
            .collect()
    }

    pub fn all_production_versions(&self) -> Vec<ProductionVersion> {
        self.all::<ProductionConfig>()
            .into_iter()
            .flat_map(|c| c.versions)
            .collect()
    }

    pub fn deployed_versions(&self) -> Vec<ProductionVersion> {
        self.all_production_versions()
            .into_iter()
            .filter(|v| v.status == VersionStatus::Deployed)
            .collect()
    }

    /// First non-empty `productionModelId` across evaluation configs, resolved to its run.
    pub fn find_production_selection(&self) -> Option<EvaluationRun> {
        let selected = self
            .all::<EvaluationConfig>()
            .into_iter()
            .find_map(|config| config.production_model_id.filter(|id| !id.is_empty()))?;
        self.all_evaluation_runs().into_iter().find(|run| run.id == selected)
    }
}
