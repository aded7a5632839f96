// Modeling command handlers: algorithm selection and training run submission
use crate::error::{ValidationError, WorkbenchError, WorkbenchResult};
use crate::jobs::Submission;
use crate::models::{
    AlgorithmConfig, AlgorithmFamily, EvaluationConfig, HyperParameter, JobStatus, ModelingConfig,
    SelectedDatasetConfig, TrainingRun,
};
use crate::workbench::Project;
use chrono::Utc;
use log::debug;
use serde_json::Value;
use std::collections::BTreeMap;

pub fn get_modeling(project: &Project, process_id: &str) -> ModelingConfig {
    project.store.read::<ModelingConfig>(process_id)
}

/// Dataset selections from every data collection phase of the project.
pub fn available_datasets(project: &Project) -> Vec<SelectedDatasetConfig> {
    project.store.all_selected_datasets()
}

pub fn list_algorithms(project: &Project, family: AlgorithmFamily) -> Vec<AlgorithmConfig> {
    project.algorithms.get_by_family(family)
}

/// Choose an algorithm and reset the hyperparameters to its registry defaults.
pub fn select_algorithm(project: &Project, process_id: &str, algorithm_type: &str) -> WorkbenchResult<ModelingConfig> {
    let algorithm = project
        .algorithms
        .get_config(algorithm_type)
        .ok_or_else(|| WorkbenchError::not_found("algorithm", algorithm_type))?;
    let defaults: BTreeMap<String, HyperParameter> = algorithm
        .hyper_parameters
        .iter()
        .map(|spec| (spec.name.clone(), HyperParameter::from(spec)))
        .collect();

    project.store.modify::<ModelingConfig, _, _>(process_id, |config| {
        config.algorithm_family = Some(algorithm.family);
        config.algorithm_type = Some(algorithm.algorithm_type.clone());
        config.hyper_parameters = defaults;
        debug!("Selected algorithm {} for process {}", algorithm.algorithm_type, process_id);
        Ok(config.clone())
    })
}

/// Change one hyperparameter. The stored map is replaced as a whole.
pub fn set_hyper_parameter(
    project: &Project,
    process_id: &str,
    name: &str,
    value: Value,
) -> WorkbenchResult<BTreeMap<String, HyperParameter>> {
    project.store.modify::<ModelingConfig, _, _>(process_id, |config| {
        let mut hyper_parameters = config.hyper_parameters.clone();
        let parameter = hyper_parameters
            .get_mut(name)
            .ok_or_else(|| WorkbenchError::not_found("hyperparameter", name))?;
        parameter.value = value;
        config.hyper_parameters = hyper_parameters.clone();
        Ok(hyper_parameters)
    })
}

/// Datasets must be selected in some data collection phase of the project.
pub fn set_selected_datasets(project: &Project, process_id: &str, dataset_ids: Vec<String>) -> WorkbenchResult<()> {
    let available = available_datasets(project);
    if let Some(missing) = dataset_ids
        .iter()
        .find(|id| !available.iter().any(|d| &d.dataset_id == *id))
    {
        return Err(WorkbenchError::not_found("dataset selection", missing.as_str()));
    }

    project.store.modify::<ModelingConfig, _, _>(process_id, |config| {
        config.selected_dataset_ids = dataset_ids;
        Ok(())
    })
}

/// Every training run of the project, whichever process owns it.
pub fn list_training_runs(project: &Project) -> Vec<TrainingRun> {
    project.store.all_training_runs()
}

/// Start one training run with the current algorithm, hyperparameters and datasets.
/// The run is stored as `running` before this returns and completes in the background.
/// Async only because completion tasks are spawned on the ambient Tokio runtime.
pub async fn submit_training(
    project: &Project,
    process_id: &str,
    name: Option<String>,
) -> WorkbenchResult<Submission<TrainingRun>> {
    let config = get_modeling(project, process_id);
    if config.selected_dataset_ids.is_empty() {
        return Err(ValidationError::NoDatasetsSelected.into());
    }
    let Some(algorithm_type) = config.algorithm_type.clone().filter(|t| !t.is_empty()) else {
        return Err(ValidationError::NoAlgorithmSelected.into());
    };

    let display_name = project
        .algorithms
        .get_config(&algorithm_type)
        .map(|a| a.name)
        .unwrap_or_else(|| algorithm_type.clone());
    let run = TrainingRun {
        id: uuid::Uuid::new_v4().to_string(),
        name: name.unwrap_or_else(|| format!("{} #{}", display_name, config.training_runs.len() + 1)),
        status: JobStatus::Running,
        algorithm_family: config.algorithm_family,
        algorithm_type,
        dataset_ids: config.selected_dataset_ids.clone(),
        hyper_parameters: config.hyper_parameters.clone(),
        created_at: Utc::now().to_rfc3339(),
        completed_at: None,
        metrics: None,
        error: None,
    };

    project.jobs.submit(process_id, vec![run])
}

/// Remove a run and drop it from every evaluation phase's selection.
pub fn delete_training_run(project: &Project, process_id: &str, run_id: &str) -> WorkbenchResult<bool> {
    let removed = project.store.modify::<ModelingConfig, _, _>(process_id, |config| {
        let before = config.training_runs.len();
        config.training_runs.retain(|r| r.id != run_id);
        Ok(config.training_runs.len() != before)
    })?;
    if !removed {
        return Ok(false);
    }

    let cleared = project.store.modify_all::<EvaluationConfig, _>(|_, evaluation| {
        let before = evaluation.selected_training_run_ids.len();
        evaluation.selected_training_run_ids.retain(|id| id != run_id);
        evaluation.selected_training_run_ids.len() != before
    })?;

    debug!(
        "Deleted training run {} from process {} ({} evaluation selection(s) cleared)",
        run_id, process_id, cleared
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::data_collection::{add_dataset, add_transformation, preview_dataset};
    use crate::commands::test_support::fast_project;
    use crate::models::{FunctionType, Transformation};
    use serde_json::{json, Map};

    #[test]
    fn test_select_algorithm_seeds_registry_defaults() {
        let (_dir, project) = fast_project();
        let config = select_algorithm(&project, "p1", "random_forest").unwrap();
        assert_eq!(config.algorithm_family, Some(AlgorithmFamily::Classification));
        assert_eq!(config.hyper_parameters["n_estimators"].value, json!(100));

        let updated = set_hyper_parameter(&project, "p1", "n_estimators", json!(250)).unwrap();
        assert_eq!(updated["n_estimators"].value, json!(250));
        assert_eq!(updated["max_depth"].value, json!(10));
        assert!(set_hyper_parameter(&project, "p1", "nope", json!(1)).is_err());

        assert!(select_algorithm(&project, "p1", "quantum_forest").is_err());
    }

    #[tokio::test]
    async fn test_submit_training_validates_before_writing() {
        let (_dir, project) = fast_project();
        let err = submit_training(&project, "p1", None).await.unwrap_err();
        assert!(matches!(err, WorkbenchError::Validation(ValidationError::NoDatasetsSelected)));

        add_dataset(&project, "dc", "d1").unwrap();
        set_selected_datasets(&project, "p1", vec!["d1".to_string()]).unwrap();
        let err = submit_training(&project, "p1", None).await.unwrap_err();
        assert!(matches!(err, WorkbenchError::Validation(ValidationError::NoAlgorithmSelected)));
        assert!(get_modeling(&project, "p1").training_runs.is_empty());
    }

    #[tokio::test]
    async fn test_edit_during_training_survives_completion() {
        let (_dir, project) = fast_project();
        add_dataset(&project, "dc", "d1").unwrap();
        set_selected_datasets(&project, "p1", vec!["d1".to_string()]).unwrap();
        select_algorithm(&project, "p1", "random_forest").unwrap();

        let submission = submit_training(&project, "p1", None).await.unwrap();
        set_hyper_parameter(&project, "p1", "n_estimators", json!(400)).unwrap();
        submission.wait().await;

        let config = get_modeling(&project, "p1");
        assert_eq!(config.hyper_parameters["n_estimators"].value, json!(400));
        assert_eq!(config.training_runs.len(), 1);
        assert_eq!(config.training_runs[0].status, JobStatus::Completed);
        assert_eq!(config.training_runs[0].hyper_parameters["n_estimators"].value, json!(100));
    }

    #[test]
    fn test_selected_datasets_must_exist_project_wide() {
        let (_dir, project) = fast_project();
        assert!(set_selected_datasets(&project, "p1", vec!["d1".to_string()]).is_err());
        add_dataset(&project, "another-process", "d1").unwrap();
        set_selected_datasets(&project, "p1", vec!["d1".to_string()]).unwrap();
        assert_eq!(get_modeling(&project, "p1").selected_dataset_ids, vec!["d1".to_string()]);
    }

    #[tokio::test]
    async fn test_dataset_to_completed_training_run() {
        let (_dir, project) = fast_project();

        add_dataset(&project, "dc", "d1").unwrap();
        let mut parameters = Map::new();
        parameters.insert("decimals".to_string(), json!(1));
        add_transformation(
            &project,
            "dc",
            "d1",
            Transformation::new(
                "Round amount",
                "amount_rounded",
                FunctionType::Round,
                vec!["amount".to_string()],
                parameters,
            ),
        )
        .unwrap();
        let preview = preview_dataset(&project, "dc", "d1").unwrap();
        assert_eq!(preview.rows[0]["amount_rounded"], json!(12.3));

        set_selected_datasets(&project, "p1", vec!["d1".to_string()]).unwrap();
        select_algorithm(&project, "p1", "random_forest").unwrap();
        let submission = submit_training(&project, "p1", None).await.unwrap();

        let runs = list_training_runs(&project);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].status, JobStatus::Running);
        assert_eq!(runs[0].name, "Random Forest #1");

        submission.wait().await;

        let runs = list_training_runs(&project);
        assert_eq!(runs[0].status, JobStatus::Completed);
        let accuracy = runs[0].metrics.as_ref().unwrap().accuracy;
        assert!((0.85..=0.95).contains(&accuracy));
    }

    #[tokio::test]
    async fn test_delete_training_run_clears_evaluation_selection() {
        let (_dir, project) = fast_project();
        add_dataset(&project, "dc", "d1").unwrap();
        set_selected_datasets(&project, "p1", vec!["d1".to_string()]).unwrap();
        select_algorithm(&project, "p1", "logistic_regression").unwrap();
        let submission = submit_training(&project, "p1", Some("baseline".to_string())).await.unwrap();
        let run_id = submission.jobs[0].id.clone();
        submission.wait().await;

        project
            .store
            .modify::<EvaluationConfig, _, _>("p2", |c| {
                c.selected_training_run_ids = vec![run_id.clone(), "other".to_string()];
                Ok(())
            })
            .unwrap();

        assert!(delete_training_run(&project, "p1", &run_id).unwrap());
        let evaluation = project.store.read::<EvaluationConfig>("p2");
        assert_eq!(evaluation.selected_training_run_ids, vec!["other".to_string()]);
        assert!(list_training_runs(&project).is_empty());
    }
}
