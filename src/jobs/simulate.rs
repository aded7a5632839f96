// Synthetic results attached when a simulated job completes
use super::lifecycle::{Job, JobHost};
use crate::models::{
    ConfusionMatrix, EvaluationConfig, EvaluationResults, EvaluationRun, ModelingConfig,
    ObjectiveDirection, OptimizationConfig, OptimizationScenario, ScenarioResults, TrainingMetrics,
    TrainingRun,
};
use rand::Rng;
use std::collections::BTreeMap;

/// Evaluation confusion matrices are drawn over a balanced hold-out set of this size.
const EVALUATION_SAMPLES: u64 = 1000;

/// A job whose completion step fabricates its results instead of computing them.
///
/// This is the seam a real trainer would replace.
pub trait SimulatedJob: Job {
    type Host: JobHost<Job = Self>;

    fn attach_results<R: Rng + ?Sized>(&mut self, host: &Self::Host, rng: &mut R);
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

fn harmonic_mean(a: f64, b: f64) -> f64 {
    if a + b == 0.0 {
        0.0
    } else {
        2.0 * a * b / (a + b)
    }
}

pub fn training_metrics<R: Rng + ?Sized>(rng: &mut R) -> TrainingMetrics {
    let accuracy = round4(rng.gen_range(0.85..=0.95));
    let precision = round4(rng.gen_range(0.82..=0.95));
    let recall = round4(rng.gen_range(0.80..=0.93));
    TrainingMetrics {
        accuracy,
        precision,
        recall,
        f1_score: round4(harmonic_mean(precision, recall)),
        training_time_secs: (rng.gen_range(10.0..=300.0_f64) * 10.0).round() / 10.0,
    }
}

pub fn evaluation_results<R: Rng + ?Sized>(rng: &mut R) -> EvaluationResults {
    let accuracy = round4(rng.gen_range(0.82..=0.97));
    let precision = round4(rng.gen_range(0.80..=0.95));
    let recall = round4(rng.gen_range(0.78..=0.94));

    let positives = EVALUATION_SAMPLES / 2;
    let negatives = EVALUATION_SAMPLES - positives;
    let true_positive = ((recall * positives as f64).round() as u64).min(positives);
    let correct = (accuracy * EVALUATION_SAMPLES as f64).round() as u64;
    let true_negative = correct.saturating_sub(true_positive).min(negatives);

    EvaluationResults {
        accuracy,
        precision,
        recall,
        f1_score: round4(harmonic_mean(precision, recall)),
        auc_roc: round4(rng.gen_range(0.85..=0.98)),
        confusion_matrix: ConfusionMatrix {
            true_positive,
            false_positive: negatives - true_negative,
            true_negative,
            false_negative: positives - true_positive,
        },
    }
}

/// Uniform draw inside each actionable variable's range.
pub fn sample_variables<R: Rng + ?Sized>(config: &OptimizationConfig, rng: &mut R) -> BTreeMap<String, f64> {
    config
        .actionable_variables
        .iter()
        .map(|variable| {
            let value = match variable.span() {
                Some(span) if span > 0.0 => rng.gen_range(variable.min..=variable.max),
                Some(_) => variable.min,
                // Unsampleable bounds collapse to the midpoint, or zero when that is not finite.
                None => Some(variable.min / 2.0 + variable.max / 2.0)
                    .filter(|mid| mid.is_finite())
                    .unwrap_or(0.0),
            };
            (variable.name.clone(), round4(value))
        })
        .collect()
}

/// Objectives and KPIs land on a 0-100 scale; the score is the weighted mean of
/// objective values oriented so that higher is always better.
pub fn scenario_results<R: Rng + ?Sized>(
    config: &OptimizationConfig,
    variable_values: &BTreeMap<String, f64>,
    rng: &mut R,
) -> ScenarioResults {
    let mut objective_values = BTreeMap::new();
    let mut weighted = 0.0;
    let mut total_weight = 0.0;
    for objective in &config.objective_functions {
        let value = round4(rng.gen_range(0.0..=100.0));
        let oriented = match objective.direction {
            ObjectiveDirection::Maximize => value,
            ObjectiveDirection::Minimize => 100.0 - value,
        };
        weighted += objective.weight * oriented;
        total_weight += objective.weight;
        objective_values.insert(objective.name.clone(), value);
    }

    let kpi_values: BTreeMap<String, f64> = config
        .kpis
        .iter()
        .map(|kpi| {
            let value = match kpi.target {
                Some(target) => target * rng.gen_range(0.8..=1.2_f64),
                None => rng.gen_range(0.0..=100.0),
            };
            (kpi.name.clone(), round4(value))
        })
        .collect();

    // Constraints may reference an actionable variable, an objective's variable or a KPI.
    let observed = |name: &str| -> Option<f64> {
        variable_values
            .get(name)
            .copied()
            .or_else(|| {
                config
                    .objective_functions
                    .iter()
                    .find(|o| o.variable == name || o.name == name)
                    .and_then(|o| objective_values.get(&o.name).copied())
            })
            .or_else(|| kpi_values.get(name).copied())
    };
    let feasible = config.constraints.iter().all(|constraint| {
        observed(&constraint.variable)
            .map(|value| constraint.is_satisfied_by(value))
            .unwrap_or(true)
    });

    let score = if total_weight > 0.0 {
        round4(weighted / total_weight)
    } else {
        0.0
    };

    ScenarioResults {
        objective_values,
        kpi_values,
        score,
        feasible,
    }
}

impl SimulatedJob for TrainingRun {
    type Host = ModelingConfig;

    fn attach_results<R: Rng + ?Sized>(&mut self, _host: &ModelingConfig, rng: &mut R) {
        self.metrics = Some(training_metrics(rng));
    }
}

impl SimulatedJob for EvaluationRun {
    type Host = EvaluationConfig;

    fn attach_results<R: Rng + ?Sized>(&mut self, _host: &EvaluationConfig, rng: &mut R) {
        self.results = Some(evaluation_results(rng));
    }
}

impl SimulatedJob for OptimizationScenario {
    type Host = OptimizationConfig;

    fn attach_results<R: Rng + ?Sized>(&mut self, host: &OptimizationConfig, rng: &mut R) {
        self.results = Some(scenario_results(host, &self.variable_values, rng));
    }
}
