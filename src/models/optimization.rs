// Optimization phase data models
use super::job::JobStatus;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An input the optimizer may move within `[min, max]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActionableVariable {
    pub name: String,
    pub min: f64,
    pub max: f64,
    #[serde(default)]
    pub unit: Option<String>,
}

impl ActionableVariable {
    /// `max - min` when both bounds are finite, ordered, and their difference is representable.
    pub fn span(&self) -> Option<f64> {
        let span = self.max - self.min;
        (self.min.is_finite() && self.max.is_finite() && span.is_finite() && span >= 0.0).then_some(span)
    }
}

/// A model output observed while exploring scenarios.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationVariable {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveDirection {
    Maximize,
    Minimize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ObjectiveFunction {
    pub name: String,
    pub variable: String,
    pub direction: ObjectiveDirection,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintOperator {
    Lte,
    Gte,
    Eq,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Constraint {
    pub variable: String,
    pub operator: ConstraintOperator,
    pub value: f64,
}

impl Constraint {
    pub fn is_satisfied_by(&self, observed: f64) -> bool {
        match self.operator {
            ConstraintOperator::Lte => observed <= self.value,
            ConstraintOperator::Gte => observed >= self.value,
            ConstraintOperator::Eq => (observed - self.value).abs() < 1e-9,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Kpi {
    pub name: String,
    #[serde(default)]
    pub target: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioResults {
    pub objective_values: BTreeMap<String, f64>,
    pub kpi_values: BTreeMap<String, f64>,
    pub score: f64,
    pub feasible: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationScenario {
    pub id: String,
    pub name: String,
    pub status: JobStatus,
    pub variable_values: BTreeMap<String, f64>,
    pub created_at: String,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub results: Option<ScenarioResults>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationConfig {
    #[serde(default)]
    pub actionable_variables: Vec<ActionableVariable>,
    #[serde(default)]
    pub optimization_variables: Vec<OptimizationVariable>,
    #[serde(default)]
    pub objective_functions: Vec<ObjectiveFunction>,
    #[serde(default)]
    pub constraints: Vec<Constraint>,
    #[serde(default)]
    pub kpis: Vec<Kpi>,
    #[serde(default)]
    pub scenarios: Vec<OptimizationScenario>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub production_version_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_scenario_id: Option<String>,
}
