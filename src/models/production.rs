// Production phase data models
use super::evaluation::EvaluationResults;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VersionStatus {
    Draft,
    Deployed,
    Archived,
}

impl VersionStatus {
    /// `draft -> deployed -> archived`
    pub fn can_transition_to(&self, next: VersionStatus) -> bool {
        matches!(
            (self, next),
            (VersionStatus::Draft, VersionStatus::Deployed)
                | (VersionStatus::Deployed, VersionStatus::Archived)
        )
    }
}

impl fmt::Display for VersionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VersionStatus::Draft => "draft",
            VersionStatus::Deployed => "deployed",
            VersionStatus::Archived => "archived",
        };
        f.write_str(name)
    }
}

/// Numbered snapshot of an evaluation run. Only `status` changes after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductionVersion {
    pub id: String,
    pub version_number: u32,
    pub evaluation_run_id: String,
    pub training_run_id: String,
    pub algorithm_type: String,
    pub results: Option<EvaluationResults>,
    pub status: VersionStatus,
    pub created_at: String,
    #[serde(default)]
    pub deployed_at: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProductionConfig {
    #[serde(default)]
    pub versions: Vec<ProductionVersion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_version_id: Option<String>,
}
