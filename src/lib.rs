pub mod catalog;
pub mod commands;
pub mod error;
pub mod file_manager;
pub mod jobs;
pub mod logging;
pub mod models;
pub mod store;
pub mod transform;
pub mod utils;
pub mod workbench;

pub use error::{StoreError, ValidationError, WorkbenchError, WorkbenchResult};
pub use workbench::{Project, Workbench};

use catalog::DatasetCatalog;
use log::{info, warn};
use std::sync::Arc;

/// Start-up sequence for an embedding application: logging, data directories, log
/// retention, then a workbench over the application data directory.
pub fn initialize_app_data(catalog: Arc<dyn DatasetCatalog>) -> WorkbenchResult<Workbench> {
    logging::init();

    let workbench = Workbench::open_default(catalog)?;
    let settings = workbench.settings();
    logging::cleanup_old_logs(settings.log_retention_days);

    info!("App data initialized at {:?}", utils::get_app_data_dir());
    Ok(workbench)
}

/// Fail jobs a previous session left `running` in the given projects.
pub fn recover_projects<'a>(workbench: &Workbench, project_ids: impl IntoIterator<Item = &'a str>) -> usize {
    project_ids
        .into_iter()
        .map(|project_id| {
            let project = workbench.project(project_id);
            commands::phases::recover_interrupted_jobs(&project).unwrap_or_else(|e| {
                warn!("Failed to recover jobs for project {}: {}", project_id, e);
                0
            })
        })
        .sum()
}
