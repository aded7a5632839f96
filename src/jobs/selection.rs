// Best-of selection over evaluation runs
use crate::models::{EvaluationRun, JobStatus};

/// The completed run with the highest F1 score. Ties go to the earliest run in list order.
pub fn best_model(runs: &[EvaluationRun]) -> Option<&EvaluationRun> {
    let mut best: Option<(&EvaluationRun, f64)> = None;
    for run in runs.iter().filter(|run| run.status == JobStatus::Completed) {
        let Some(f1) = run.f1_score() else {
            continue;
        };
        if best.map_or(true, |(_, best_f1)| f1 > best_f1) {
            best = Some((run, f1));
        }
    }
    best.map(|(run, _)| run)
}
