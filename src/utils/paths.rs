use crate::error::StoreError;
use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

static APP_DATA_DIR: OnceLock<PathBuf> = OnceLock::new();

pub const HOME_ENV_VAR: &str = "ML_WORKBENCH_HOME";

pub fn get_app_data_dir() -> PathBuf {
    APP_DATA_DIR
        .get_or_init(|| {
            if let Some(home) = std::env::var_os(HOME_ENV_VAR) {
                return PathBuf::from(home);
            }
            let base_dir = dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."));
            base_dir.join("MLWorkbench")
        })
        .clone()
}

pub fn get_data_dir() -> PathBuf {
    get_app_data_dir().join("data")
}

pub fn get_logs_dir() -> PathBuf {
    get_app_data_dir().join("logs")
}

pub fn get_projects_dir() -> PathBuf {
    get_data_dir().join("projects")
}

pub fn get_settings_json_path() -> PathBuf {
    get_data_dir().join("settings.json")
}

/// File holding every `${processId}-${phaseType}` entry of one project.
pub fn phase_configs_json_path(projects_dir: &std::path::Path, project_id: &str) -> PathBuf {
    projects_dir.join(project_id).join("phase_configs.json")
}

pub fn initialize_data_directories() -> Result<(), StoreError> {
    let directories = [get_data_dir(), get_logs_dir(), get_projects_dir()];

    for dir in &directories {
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|source| StoreError::Io {
                path: dir.clone(),
                source,
            })?;
            log::debug!("Created directory: {:?}", dir);
        }
    }

    log::info!("Data directories initialized at: {:?}", get_app_data_dir());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_phase_configs_path_is_per_project() {
        let path = phase_configs_json_path(Path::new("/tmp/projects"), "proj-1");
        assert_eq!(path, PathBuf::from("/tmp/projects/proj-1/phase_configs.json"));
    }
}
