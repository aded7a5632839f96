//! Error taxonomy for the workbench core

use crate::models::{JobStatus, PhaseType, VersionStatus};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

pub type WorkbenchResult<T> = Result<T, WorkbenchError>;

/// Rejections raised before any state is touched. Serialisable so callers can render guidance.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum ValidationError {
    #[error("Select at least one dataset before training")]
    NoDatasetsSelected,
    #[error("Select an algorithm before training")]
    NoAlgorithmSelected,
    #[error("Select at least one training run to evaluate")]
    NoTrainingRunsSelected,
    #[error("Training run {run_id} has not completed")]
    TrainingRunNotCompleted { run_id: String },
    #[error("Transformation name cannot be empty")]
    EmptyTransformationName,
    #[error("Output column name cannot be empty")]
    EmptyOutputColumn,
    #[error("Output column {column} is already produced by another transformation")]
    DuplicateOutputColumn { column: String },
    #[error("Dataset {dataset_id} is already selected")]
    DatasetAlreadySelected { dataset_id: String },
    #[error("Column {column} does not exist in dataset {dataset_id}")]
    UnknownColumn { dataset_id: String, column: String },
    #[error("Define at least one actionable variable")]
    NoActionableVariables,
    #[error("Define at least one objective function")]
    NoObjectiveFunctions,
    #[error("Invalid range for {variable}: [{min}, {max}] must be finite with min <= max")]
    InvalidRange { variable: String, min: f64, max: f64 },
    #[error("Join keys are required for a {join_type} merge")]
    MissingJoinKeys { join_type: String },
    #[error("A dataset cannot be merged with itself")]
    SameDatasetMerge,
    #[error("Merged dataset name cannot be empty")]
    EmptyMergeName,
    #[error("Cannot move version from {from} to {to}")]
    InvalidVersionTransition { from: VersionStatus, to: VersionStatus },
    #[error("Configuration for {expected} cannot hold a {actual} payload")]
    PhaseTypeMismatch { expected: PhaseType, actual: PhaseType },
    #[error("Process defines more than one {} phase", .phase_type.display_name())]
    DuplicatePhaseType { phase_type: PhaseType },
    #[error("Partial update rejected: {reason}")]
    InvalidPartial { reason: String },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to (de)serialize {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to encode value: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum JobError {
    #[error("Cannot move job {job_id} from {from} to {to}")]
    InvalidTransition {
        job_id: String,
        from: JobStatus,
        to: JobStatus,
    },
}

#[derive(Debug, Error)]
pub enum WorkbenchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Job(#[from] JobError),
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
}

impl From<serde_json::Error> for WorkbenchError {
    fn from(e: serde_json::Error) -> Self {
        WorkbenchError::Store(StoreError::Encode(e))
    }
}

impl WorkbenchError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        WorkbenchError::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// True for rejections the caller should render as guidance rather than a fault.
    pub fn is_validation(&self) -> bool {
        matches!(self, WorkbenchError::Validation(_))
    }
}
