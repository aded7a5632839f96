// Evaluation phase data models
use super::job::JobStatus;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConfusionMatrix {
    pub true_positive: u64,
    pub false_positive: u64,
    pub true_negative: u64,
    pub false_negative: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResults {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub auc_roc: f64,
    pub confusion_matrix: ConfusionMatrix,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRun {
    pub id: String,
    pub name: String,
    pub status: JobStatus,
    pub training_run_id: String,
    pub algorithm_type: String,
    pub created_at: String,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub results: Option<EvaluationResults>,
    #[serde(default)]
    pub error: Option<String>,
}

impl EvaluationRun {
    pub fn f1_score(&self) -> Option<f64> {
        self.results.as_ref().map(|r| r.f1_score)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationConfig {
    #[serde(default)]
    pub selected_training_run_ids: Vec<String>,
    #[serde(default)]
    pub evaluation_runs: Vec<EvaluationRun>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub production_model_id: Option<String>,
}
