// Shared status machine for training runs, evaluation runs and optimization scenarios
use crate::error::JobError;
use crate::models::{
    EvaluationConfig, EvaluationRun, JobKind, JobStatus, ModelingConfig, OptimizationConfig,
    OptimizationScenario, PhasePayload, TrainingRun,
};
use chrono::{DateTime, Utc};

/// A record with the `pending -> running -> {completed, error}` lifecycle.
pub trait Job: Clone + Send + 'static {
    const KIND: JobKind;

    fn id(&self) -> &str;
    fn status(&self) -> JobStatus;
    fn created_at(&self) -> &str;

    fn set_status(&mut self, status: JobStatus);
    fn set_completed_at(&mut self, completed_at: Option<String>);
    fn set_error(&mut self, error: Option<String>);
}

/// The phase config that owns a job list.
pub trait JobHost: PhasePayload + Send + 'static {
    type Job: Job;

    fn jobs(&self) -> &[Self::Job];
    fn jobs_mut(&mut self) -> &mut Vec<Self::Job>;

    fn find_job(&self, job_id: &str) -> Option<&Self::Job> {
        self.jobs().iter().find(|job| job.id() == job_id)
    }
}

/// Move a job to `next`, refusing anything the status machine does not allow.
pub fn transition<J: Job>(job: &mut J, next: JobStatus) -> Result<(), JobError> {
    let from = job.status();
    if !from.can_transition_to(next) {
        return Err(JobError::InvalidTransition {
            job_id: job.id().to_string(),
            from,
            to: next,
        });
    }
    job.set_status(next);
    Ok(())
}

/// Terminal failure with a message; `completedAt` stays unset.
pub fn fail<J: Job>(job: &mut J, message: impl Into<String>) -> Result<(), JobError> {
    transition(job, JobStatus::Error)?;
    job.set_error(Some(message.into()));
    Ok(())
}

pub fn created_at<J: Job>(job: &J) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(job.created_at())
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

macro_rules! impl_job {
    ($ty:ty, $kind:expr) => {
        impl Job for $ty {
            const KIND: JobKind = $kind;

            fn id(&self) -> &str {
                &self.id
            }

            fn status(&self) -> JobStatus {
                self.status
            }

            fn created_at(&self) -> &str {
                &self.created_at
            }

            fn set_status(&mut self, status: JobStatus) {
                self.status = status;
            }

            fn set_completed_at(&mut self, completed_at: Option<String>) {
                self.completed_at = completed_at;
            }

            fn set_error(&mut self, error: Option<String>) {
                self.error = error;
            }
        }
    };
}

impl_job!(TrainingRun, JobKind::Training);
impl_job!(EvaluationRun, JobKind::Evaluation);
impl_job!(OptimizationScenario, JobKind::Optimization);

macro_rules! impl_job_host {
    ($host:ty, $job:ty, $field:ident) => {
        impl JobHost for $host {
            type Job = $job;

            fn jobs(&self) -> &[$job] {
                &self.$field
            }

            fn jobs_mut(&mut self) -> &mut Vec<$job> {
                &mut self.$field
            }
        }
    };
}

impl_job_host!(ModelingConfig, TrainingRun, training_runs);
impl_job_host!(EvaluationConfig, EvaluationRun, evaluation_runs);
impl_job_host!(OptimizationConfig, OptimizationScenario, scenarios);
