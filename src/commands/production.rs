// Production command handlers: promotion gate and version lifecycle
use crate::error::{ValidationError, WorkbenchError, WorkbenchResult};
use crate::models::{EvaluationRun, OptimizationConfig, ProductionConfig, ProductionVersion, VersionStatus};
use crate::workbench::Project;
use chrono::Utc;
use log::{debug, info};

pub fn get_production(project: &Project, process_id: &str) -> ProductionConfig {
    project.store.read::<ProductionConfig>(process_id)
}

/// The evaluation run marked for production anywhere in the project.
/// `None` means there is no model to deploy yet, which is not an error.
pub fn resolve_production_input(project: &Project) -> Option<EvaluationRun> {
    project.store.find_production_selection()
}

fn check_transition(version: &ProductionVersion, to: VersionStatus) -> Result<(), ValidationError> {
    if version.status.can_transition_to(to) {
        Ok(())
    } else {
        Err(ValidationError::InvalidVersionTransition {
            from: version.status,
            to,
        })
    }
}

/// Snapshot the current production input as a new draft version.
/// Returns `None` when no evaluation run is marked for production.
pub fn create_version(
    project: &Project,
    process_id: &str,
    notes: Option<String>,
) -> WorkbenchResult<Option<ProductionVersion>> {
    let Some(run) = resolve_production_input(project) else {
        debug!("No production model available for process {}", process_id);
        return Ok(None);
    };

    let version = project.store.modify::<ProductionConfig, _, _>(process_id, |config| {
        let version_number = config.versions.iter().map(|v| v.version_number).max().unwrap_or(0) + 1;
        let version = ProductionVersion {
            id: uuid::Uuid::new_v4().to_string(),
            version_number,
            evaluation_run_id: run.id.clone(),
            training_run_id: run.training_run_id.clone(),
            algorithm_type: run.algorithm_type.clone(),
            results: run.results.clone(),
            status: VersionStatus::Draft,
            created_at: Utc::now().to_rfc3339(),
            deployed_at: None,
            notes,
        };
        config.versions.push(version.clone());
        Ok(version)
    })?;

    info!("Created production version v{} for process {}", version.version_number, process_id);
    Ok(Some(version))
}

/// Deploy a draft version. Whatever was deployed before in this phase is archived, so at
/// most one version is deployed and it is always the active one.
pub fn deploy_version(project: &Project, process_id: &str, version_id: &str) -> WorkbenchResult<ProductionVersion> {
    let deployed = project.store.modify::<ProductionConfig, _, _>(process_id, |config| {
        let index = config
            .versions
            .iter()
            .position(|v| v.id == version_id)
            .ok_or_else(|| WorkbenchError::not_found("production version", version_id))?;
        check_transition(&config.versions[index], VersionStatus::Deployed)?;

        for other in config.versions.iter_mut() {
            if other.status == VersionStatus::Deployed {
                other.status = VersionStatus::Archived;
            }
        }
        let version = &mut config.versions[index];
        version.status = VersionStatus::Deployed;
        version.deployed_at = Some(Utc::now().to_rfc3339());
        let version = version.clone();
        config.active_version_id = Some(version.id.clone());
        Ok(version)
    })?;

    info!("Deployed production version v{} in process {}", deployed.version_number, process_id);
    Ok(deployed)
}

pub fn archive_version(project: &Project, process_id: &str, version_id: &str) -> WorkbenchResult<ProductionVersion> {
    project.store.modify::<ProductionConfig, _, _>(process_id, |config| {
        let version = config
            .versions
            .iter_mut()
            .find(|v| v.id == version_id)
            .ok_or_else(|| WorkbenchError::not_found("production version", version_id))?;
        check_transition(version, VersionStatus::Archived)?;
        version.status = VersionStatus::Archived;
        let version = version.clone();
        if config.active_version_id.as_deref() == Some(version_id) {
            config.active_version_id = None;
        }
        Ok(version)
    })
}

/// Remove a version, clearing the active pointer and every optimization phase that targets it.
pub fn delete_version(project: &Project, process_id: &str, version_id: &str) -> WorkbenchResult<bool> {
    let removed = project.store.modify::<ProductionConfig, _, _>(process_id, |config| {
        let before = config.versions.len();
        config.versions.retain(|v| v.id != version_id);
        if config.active_version_id.as_deref() == Some(version_id) {
            config.active_version_id = None;
        }
        Ok(config.versions.len() != before)
    })?;
    if !removed {
        return Ok(false);
    }

    project.store.modify_all::<OptimizationConfig, _>(|_, optimization| {
        if optimization.production_version_id.as_deref() == Some(version_id) {
            optimization.production_version_id = None;
            true
        } else {
            false
        }
    })?;

    debug!("Deleted production version {} from process {}", version_id, process_id);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::fast_project;
    use crate::models::{EvaluationConfig, JobStatus};

    fn seed_marked_run(project: &Project) {
        project
            .store
            .modify::<EvaluationConfig, _, _>("e1", |config| {
                config.evaluation_runs.push(EvaluationRun {
                    id: "r1".to_string(),
                    name: "Evaluation of baseline".to_string(),
                    status: JobStatus::Completed,
                    training_run_id: "t1".to_string(),
                    algorithm_type: "random_forest".to_string(),
                    created_at: "2024-01-01T00:00:00Z".to_string(),
                    completed_at: Some("2024-01-01T00:00:02Z".to_string()),
                    results: None,
                    error: None,
                });
                config.production_model_id = Some("r1".to_string());
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_no_marked_model_means_nothing_to_deploy() {
        let (_dir, project) = fast_project();
        assert!(resolve_production_input(&project).is_none());
        assert!(create_version(&project, "prod", None).unwrap().is_none());
        assert!(get_production(&project, "prod").versions.is_empty());
    }

    #[test]
    fn test_deploying_archives_previous_version() {
        let (_dir, project) = fast_project();
        seed_marked_run(&project);
        let v1 = create_version(&project, "prod", None).unwrap().unwrap();
        let v2 = create_version(&project, "prod", Some("retrained".to_string())).unwrap().unwrap();
        assert_eq!((v1.version_number, v2.version_number), (1, 2));
        assert_eq!(v1.evaluation_run_id, "r1");

        deploy_version(&project, "prod", &v1.id).unwrap();
        deploy_version(&project, "prod", &v2.id).unwrap();

        let config = get_production(&project, "prod");
        let deployed: Vec<_> = config
            .versions
            .iter()
            .filter(|v| v.status == VersionStatus::Deployed)
            .collect();
        assert_eq!(deployed.len(), 1);
        assert_eq!(deployed[0].id, v2.id);
        assert_eq!(config.versions[0].status, VersionStatus::Archived);
        assert_eq!(config.active_version_id.as_deref(), Some(v2.id.as_str()));
    }

    #[test]
    fn test_version_transitions_are_one_way() {
        let (_dir, project) = fast_project();
        seed_marked_run(&project);
        let v1 = create_version(&project, "prod", None).unwrap().unwrap();

        let err = archive_version(&project, "prod", &v1.id).unwrap_err();
        assert!(err.is_validation());

        deploy_version(&project, "prod", &v1.id).unwrap();
        archive_version(&project, "prod", &v1.id).unwrap();
        assert!(get_production(&project, "prod").active_version_id.is_none());
        assert!(deploy_version(&project, "prod", &v1.id).is_err());
    }

    #[test]
    fn test_delete_version_clears_dangling_pointers() {
        let (_dir, project) = fast_project();
        seed_marked_run(&project);
        let v1 = create_version(&project, "prod", None).unwrap().unwrap();
        deploy_version(&project, "prod", &v1.id).unwrap();
        project
            .store
            .modify::<OptimizationConfig, _, _>("opt", |config| {
                config.production_version_id = Some(v1.id.clone());
                Ok(())
            })
            .unwrap();

        assert!(delete_version(&project, "prod", &v1.id).unwrap());

        assert!(get_production(&project, "prod").active_version_id.is_none());
        let optimization = project.store.read::<OptimizationConfig>("opt");
        assert!(optimization.production_version_id.is_none());
        assert!(!delete_version(&project, "prod", &v1.id).unwrap());
    }
}
