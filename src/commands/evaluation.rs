// Evaluation command handlers: evaluation runs, best model and production marking
use crate::error::{ValidationError, WorkbenchError, WorkbenchResult};
use crate::jobs::{self, Submission};
use crate::models::{EvaluationConfig, EvaluationRun, JobStatus, TrainingRun};
use crate::workbench::Project;
use chrono::Utc;
use log::debug;

pub fn get_evaluation(project: &Project, process_id: &str) -> EvaluationConfig {
    project.store.read::<EvaluationConfig>(process_id)
}

/// Completed training runs from every modeling phase of the project.
pub fn available_training_runs(project: &Project) -> Vec<TrainingRun> {
    project
        .store
        .all_training_runs()
        .into_iter()
        .filter(|r| r.status == JobStatus::Completed)
        .collect()
}

fn resolve_completed(all_runs: &[TrainingRun], run_id: &str) -> WorkbenchResult<TrainingRun> {
    let run = all_runs
        .iter()
        .find(|r| r.id == run_id)
        .ok_or_else(|| WorkbenchError::not_found("training run", run_id))?;
    if run.status != JobStatus::Completed {
        return Err(ValidationError::TrainingRunNotCompleted {
            run_id: run_id.to_string(),
        }
        .into());
    }
    Ok(run.clone())
}

pub fn select_training_runs(project: &Project, process_id: &str, run_ids: Vec<String>) -> WorkbenchResult<()> {
    let all_runs = project.store.all_training_runs();
    for run_id in &run_ids {
        resolve_completed(&all_runs, run_id)?;
    }

    project.store.modify::<EvaluationConfig, _, _>(process_id, |config| {
        config.selected_training_run_ids = run_ids;
        Ok(())
    })
}

/// One evaluation run per selected training run, stored as `running` before this returns.
/// Async only because completion tasks are spawned on the ambient Tokio runtime.
pub async fn submit_evaluation(project: &Project, process_id: &str) -> WorkbenchResult<Submission<EvaluationRun>> {
    let config = get_evaluation(project, process_id);
    if config.selected_training_run_ids.is_empty() {
        return Err(ValidationError::NoTrainingRunsSelected.into());
    }

    let all_runs = project.store.all_training_runs();
    let training_runs = config
        .selected_training_run_ids
        .iter()
        .map(|run_id| resolve_completed(&all_runs, run_id))
        .collect::<WorkbenchResult<Vec<_>>>()?;

    let created_at = Utc::now().to_rfc3339();
    let runs = training_runs
        .into_iter()
        .map(|training| EvaluationRun {
            id: uuid::Uuid::new_v4().to_string(),
            name: format!("Evaluation of {}", training.name),
            status: JobStatus::Running,
            training_run_id: training.id,
            algorithm_type: training.algorithm_type,
            created_at: created_at.clone(),
            completed_at: None,
            results: None,
            error: None,
        })
        .collect();

    project.jobs.submit(process_id, runs)
}

/// Highest-F1 completed run of this evaluation phase; computed on every call.
pub fn best_model(project: &Project, process_id: &str) -> Option<EvaluationRun> {
    let config = get_evaluation(project, process_id);
    jobs::best_model(&config.evaluation_runs).cloned()
}

/// Point the phase's production pointer at a run. Independent of which run is best.
pub fn mark_for_production(project: &Project, process_id: &str, run_id: &str) -> WorkbenchResult<()> {
    project.store.modify::<EvaluationConfig, _, _>(process_id, |config| {
        if !config.evaluation_runs.iter().any(|r| r.id == run_id) {
            return Err(WorkbenchError::not_found("evaluation run", run_id));
        }
        config.production_model_id = Some(run_id.to_string());
        Ok(())
    })?;
    debug!("Marked evaluation run {} for production in process {}", run_id, process_id);
    Ok(())
}

pub fn clear_production_mark(project: &Project, process_id: &str) -> WorkbenchResult<()> {
    project.store.modify::<EvaluationConfig, _, _>(process_id, |config| {
        config.production_model_id = None;
        Ok(())
    })
}

/// Remove a run and clear any production pointer that referenced it.
pub fn delete_evaluation_run(project: &Project, process_id: &str, run_id: &str) -> WorkbenchResult<bool> {
    let removed = project.store.modify::<EvaluationConfig, _, _>(process_id, |config| {
        let before = config.evaluation_runs.len();
        config.evaluation_runs.retain(|r| r.id != run_id);
        Ok(config.evaluation_runs.len() != before)
    })?;
    if !removed {
        return Ok(false);
    }

    project.store.modify_all::<EvaluationConfig, _>(|_, config| {
        if config.production_model_id.as_deref() == Some(run_id) {
            config.production_model_id = None;
            true
        } else {
            false
        }
    })?;

    debug!("Deleted evaluation run {} from process {}", run_id, process_id);
    Ok(true)
}
