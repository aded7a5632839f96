// Settings command handlers backed by settings.json
use crate::error::WorkbenchResult;
use crate::file_manager::update_json_file;
use crate::models::Settings;
use crate::workbench::Workbench;
use log::debug;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct UpdateSettingsParams {
    pub training_delay_ms: Option<u64>,
    pub evaluation_delay_ms: Option<u64>,
    pub optimization_delay_ms: Option<u64>,
    pub stale_job_grace_ms: Option<u64>,
    pub log_retention_days: Option<u64>,
}

pub fn get_settings(workbench: &Workbench) -> Settings {
    workbench.settings()
}

/// Update settings with partial update support
pub fn update_settings(workbench: &Workbench, params: UpdateSettingsParams) -> WorkbenchResult<Settings> {
    let updated = update_json_file(workbench.settings_path(), |current: &mut Settings| {
        if let Some(training_delay_ms) = params.training_delay_ms {
            current.training_delay_ms = training_delay_ms;
        }
        if let Some(evaluation_delay_ms) = params.evaluation_delay_ms {
            current.evaluation_delay_ms = evaluation_delay_ms;
        }
        if let Some(optimization_delay_ms) = params.optimization_delay_ms {
            current.optimization_delay_ms = optimization_delay_ms;
        }
        if let Some(stale_job_grace_ms) = params.stale_job_grace_ms {
            current.stale_job_grace_ms = stale_job_grace_ms;
        }
        if let Some(log_retention_days) = params.log_retention_days {
            current.log_retention_days = log_retention_days;
        }
    })?;

    debug!("Settings updated: {:?}", updated);
    Ok(updated)
}
