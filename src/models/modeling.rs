// Modeling phase data models
use super::job::JobStatus;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AlgorithmFamily {
    Classification,
    Regression,
    Clustering,
    TimeSeries,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HyperParameterKind {
    Integer,
    Float,
    Boolean,
    Select,
}

/// Registry description of a tunable parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HyperParameterSpec {
    pub name: String,
    pub kind: HyperParameterKind,
    pub default: Value,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlgorithmConfig {
    #[serde(rename = "type")]
    pub algorithm_type: String,
    pub name: String,
    pub family: AlgorithmFamily,
    pub hyper_parameters: Vec<HyperParameterSpec>,
}

/// Current value of a hyperparameter inside a modeling config.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HyperParameter {
    pub name: String,
    pub kind: HyperParameterKind,
    pub value: Value,
}

impl From<&HyperParameterSpec> for HyperParameter {
    fn from(spec: &HyperParameterSpec) -> Self {
        Self {
            name: spec.name.clone(),
            kind: spec.kind,
            value: spec.default.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrainingMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub training_time_secs: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrainingRun {
    pub id: String,
    pub name: String,
    pub status: JobStatus,
    pub algorithm_family: Option<AlgorithmFamily>,
    pub algorithm_type: String,
    pub dataset_ids: Vec<String>,
    #[serde(default)]
    pub hyper_parameters: BTreeMap<String, HyperParameter>,
    pub created_at: String,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub metrics: Option<TrainingMetrics>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModelingConfig {
    #[serde(default)]
    pub algorithm_family: Option<AlgorithmFamily>,
    #[serde(default)]
    pub algorithm_type: Option<String>,
    #[serde(default)]
    pub hyper_parameters: BTreeMap<String, HyperParameter>,
    #[serde(default)]
    pub selected_dataset_ids: Vec<String>,
    #[serde(default = "default_train_test_split")]
    pub train_test_split: f64,
    #[serde(default = "default_random_state")]
    pub random_state: u64,
    #[serde(default = "default_cross_validation_folds")]
    pub cross_validation_folds: u32,
    #[serde(default)]
    pub training_runs: Vec<TrainingRun>,
}

fn default_train_test_split() -> f64 {
    0.8
}

fn default_random_state() -> u64 {
    42
}

fn default_cross_validation_folds() -> u32 {
    5
}

impl Default for ModelingConfig {
    fn default() -> Self {
        Self {
            algorithm_family: None,
            algorithm_type: None,
            hyper_parameters: BTreeMap::new(),
            selected_dataset_ids: Vec::new(),
            train_test_split: default_train_test_split(),
            random_state: default_random_state(),
            cross_validation_folds: default_cross_validation_folds(),
            training_runs: Vec::new(),
        }
    }
}
