// Phase-agnostic configuration commands and job housekeeping
use crate::error::{ValidationError, WorkbenchResult};
use crate::models::{PhaseConfig, PhaseType, Process};
use crate::workbench::Project;
use chrono::Utc;
use serde_json::{Map, Value};

pub fn get_phase_config(project: &Project, process_id: &str, phase_type: PhaseType) -> Option<PhaseConfig> {
    project.store.get(process_id, phase_type)
}

/// Shallow merge of `partial` onto the stored config; top-level fields are replaced whole.
pub fn update_phase_config(
    project: &Project,
    process_id: &str,
    phase_type: PhaseType,
    partial: Map<String, Value>,
) -> WorkbenchResult<PhaseConfig> {
    project.store.update(process_id, phase_type, partial)
}

pub fn get_all_of_type(project: &Project, phase_type: PhaseType) -> Vec<PhaseConfig> {
    project.store.get_all_of_type(phase_type)
}

pub fn remove_phase_config(project: &Project, process_id: &str, phase_type: PhaseType) -> WorkbenchResult<bool> {
    project.store.remove(process_id, phase_type)
}

/// A process may hold at most one phase of each type.
pub fn validate_process(process: &Process) -> Result<(), ValidationError> {
    match process.duplicate_phase_type() {
        Some(phase_type) => Err(ValidationError::DuplicatePhaseType { phase_type }),
        None => Ok(()),
    }
}

/// Fail jobs left `running` by a previous session. Intended to run once at startup.
pub fn recover_interrupted_jobs(project: &Project) -> WorkbenchResult<usize> {
    project.jobs.recover_interrupted_jobs(Utc::now())
}
