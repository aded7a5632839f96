// Optimization command handlers: problem definition and scenario exploration
use crate::error::{ValidationError, WorkbenchError, WorkbenchResult};
use crate::jobs::{sample_variables, Submission};
use crate::models::{
    ActionableVariable, JobStatus, ObjectiveFunction, OptimizationConfig, OptimizationScenario,
    ProductionVersion,
};
use crate::workbench::Project;
use chrono::Utc;
use log::debug;

pub fn get_optimization(project: &Project, process_id: &str) -> OptimizationConfig {
    project.store.read::<OptimizationConfig>(process_id)
}

/// Versions deployed in any production phase of the project.
pub fn deployed_versions(project: &Project) -> Vec<ProductionVersion> {
    project.store.deployed_versions()
}

pub fn set_production_version(project: &Project, process_id: &str, version_id: &str) -> WorkbenchResult<()> {
    if !deployed_versions(project).iter().any(|v| v.id == version_id) {
        return Err(WorkbenchError::not_found("deployed version", version_id));
    }
    project.store.modify::<OptimizationConfig, _, _>(process_id, |config| {
        config.production_version_id = Some(version_id.to_string());
        Ok(())
    })
}

fn validate_ranges(variables: &[ActionableVariable]) -> Result<(), ValidationError> {
    match variables.iter().find(|v| v.span().is_none()) {
        Some(v) => Err(ValidationError::InvalidRange {
            variable: v.name.clone(),
            min: v.min,
            max: v.max,
        }),
        None => Ok(()),
    }
}

pub fn set_actionable_variables(
    project: &Project,
    process_id: &str,
    variables: Vec<ActionableVariable>,
) -> WorkbenchResult<()> {
    validate_ranges(&variables)?;
    project.store.modify::<OptimizationConfig, _, _>(process_id, |config| {
        config.actionable_variables = variables;
        Ok(())
    })
}

pub fn set_objective_functions(
    project: &Project,
    process_id: &str,
    objectives: Vec<ObjectiveFunction>,
) -> WorkbenchResult<()> {
    project.store.modify::<OptimizationConfig, _, _>(process_id, |config| {
        config.objective_functions = objectives;
        Ok(())
    })
}

/// Explore `count` scenarios (at least one), each sampling every actionable variable
/// uniformly inside its range. Scenarios are stored as `running` before this returns.
/// Async only because completion tasks are spawned on the ambient Tokio runtime.
pub async fn submit_scenarios(
    project: &Project,
    process_id: &str,
    count: usize,
) -> WorkbenchResult<Submission<OptimizationScenario>> {
    let config = get_optimization(project, process_id);
    if config.actionable_variables.is_empty() {
        return Err(ValidationError::NoActionableVariables.into());
    }
    if config.objective_functions.is_empty() {
        return Err(ValidationError::NoObjectiveFunctions.into());
    }
    validate_ranges(&config.actionable_variables)?;

    let created_at = Utc::now().to_rfc3339();
    let offset = config.scenarios.len();
    let scenarios: Vec<OptimizationScenario> = {
        let mut rng = rand::thread_rng();
        (0..count.max(1))
            .map(|i| OptimizationScenario {
                id: uuid::Uuid::new_v4().to_string(),
                name: format!("Scenario {}", offset + i + 1),
                status: JobStatus::Running,
                variable_values: sample_variables(&config, &mut rng),
                created_at: created_at.clone(),
                completed_at: None,
                results: None,
                error: None,
            })
            .collect()
    };

    project.jobs.submit(process_id, scenarios)
}

pub fn select_scenario(project: &Project, process_id: &str, scenario_id: &str) -> WorkbenchResult<()> {
    project.store.modify::<OptimizationConfig, _, _>(process_id, |config| {
        if !config.scenarios.iter().any(|s| s.id == scenario_id) {
            return Err(WorkbenchError::not_found("scenario", scenario_id));
        }
        config.selected_scenario_id = Some(scenario_id.to_string());
        Ok(())
    })
}

/// Remove a scenario and clear the selection if it pointed at it.
pub fn delete_scenario(project: &Project, process_id: &str, scenario_id: &str) -> WorkbenchResult<bool> {
    let removed = project.store.modify::<OptimizationConfig, _, _>(process_id, |config| {
        let before = config.scenarios.len();
        config.scenarios.retain(|s| s.id != scenario_id);
        if config.selected_scenario_id.as_deref() == Some(scenario_id) {
            config.selected_scenario_id = None;
        }
        Ok(config.scenarios.len() != before)
    })?;
    if removed {
        debug!("Deleted scenario {} from process {}", scenario_id, process_id);
    }
    Ok(removed)
}
