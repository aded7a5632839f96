// Settings data models
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::job::JobKind;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default = "default_training_delay_ms")]
    pub training_delay_ms: u64,
    #[serde(default = "default_evaluation_delay_ms")]
    pub evaluation_delay_ms: u64,
    #[serde(default = "default_optimization_delay_ms")]
    pub optimization_delay_ms: u64,
    #[serde(default = "default_stale_job_grace_ms")]
    pub stale_job_grace_ms: u64,
    #[serde(default = "default_log_retention_days")]
    pub log_retention_days: u64,
}

fn default_training_delay_ms() -> u64 {
    3000
}

fn default_evaluation_delay_ms() -> u64 {
    2000
}

fn default_optimization_delay_ms() -> u64 {
    2500
}

fn default_stale_job_grace_ms() -> u64 {
    60_000
}

fn default_log_retention_days() -> u64 {
    7
}

impl Settings {
    /// Simulated latency between submission and completion of a job.
    pub fn completion_delay(&self, kind: JobKind) -> Duration {
        let ms = match kind {
            JobKind::Training => self.training_delay_ms,
            JobKind::Evaluation => self.evaluation_delay_ms,
            JobKind::Optimization => self.optimization_delay_ms,
        };
        Duration::from_millis(ms)
    }

    /// Age after which a job still `running` is considered interrupted.
    pub fn stale_after(&self, kind: JobKind) -> Duration {
        self.completion_delay(kind) + Duration::from_millis(self.stale_job_grace_ms)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            training_delay_ms: default_training_delay_ms(),
            evaluation_delay_ms: default_evaluation_delay_ms(),
            optimization_delay_ms: default_optimization_delay_ms(),
            stale_job_grace_ms: default_stale_job_grace_ms(),
            log_retention_days: default_log_retention_days(),
        }
    }
}
