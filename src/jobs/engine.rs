// Deferred completion of submitted jobs and recovery of interrupted ones
use super::lifecycle::{self, Job, JobHost};
use super::simulate::SimulatedJob;
use crate::error::WorkbenchResult;
use crate::models::{EvaluationConfig, JobStatus, ModelingConfig, OptimizationConfig, Settings};
use crate::store::PhaseConfigStore;
use chrono::{DateTime, Utc};
use log::{debug, error, info};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Marker left on jobs that never received their completion write.
pub const INTERRUPTED_MESSAGE: &str = "interrupted";

/// Jobs accepted by a submit call, plus the tasks that will complete them.
///
/// Dropping the submission detaches the tasks; they still run to completion.
#[derive(Debug)]
pub struct Submission<J> {
    pub jobs: Vec<J>,
    handles: Vec<JoinHandle<()>>,
}

impl<J> Submission<J> {
    /// Wait for every completion task of this submission.
    pub async fn wait(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Job completion task failed: {}", e);
            }
        }
    }
}

/// Runs simulated jobs for one project store.
#[derive(Clone)]
pub struct JobEngine {
    store: Arc<PhaseConfigStore>,
    settings: Settings,
}

impl JobEngine {
    pub fn new(store: Arc<PhaseConfigStore>, settings: Settings) -> Self {
        Self { store, settings }
    }

    pub fn store(&self) -> &Arc<PhaseConfigStore> {
        &self.store
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Append `jobs` (already `running`) to the owning config in one write, then spawn
    /// one completion task per job. Must be called from within a Tokio runtime.
    pub fn submit<J: SimulatedJob>(&self, process_id: &str, jobs: Vec<J>) -> WorkbenchResult<Submission<J>> {
        let accepted = jobs.clone();
        self.store.modify::<J::Host, _, _>(process_id, move |host| {
            host.jobs_mut().extend(jobs);
            Ok(())
        })?;

        let handles = accepted
            .iter()
            .map(|job| self.spawn_completion::<J>(process_id, job.id()))
            .collect();

        info!(
            "Submitted {} {}(s) for process {} in project {}",
            accepted.len(),
            J::KIND,
            process_id,
            self.store.project_id()
        );

        Ok(Submission {
            jobs: accepted,
            handles,
        })
    }

    fn spawn_completion<J: SimulatedJob>(&self, process_id: &str, job_id: &str) -> JoinHandle<()> {
        let store = self.store.clone();
        let delay = self.settings.completion_delay(J::KIND);
        let process_id = process_id.to_string();
        let job_id = job_id.to_string();

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match complete_job::<J>(&store, &process_id, &job_id) {
                Ok(true) => info!("Completed {} {}", J::KIND, job_id),
                Ok(false) => debug!("Skipped completion of {} {}: no longer running", J::KIND, job_id),
                Err(e) => error!("Failed to record completion of {} {}: {}", J::KIND, job_id, e),
            }
        })
    }

    /// Mark every `running` job older than its completion delay plus the grace period
    /// as failed. Returns how many jobs were changed.
    pub fn recover_interrupted_jobs(&self, now: DateTime<Utc>) -> WorkbenchResult<usize> {
        let recovered = self.recover::<ModelingConfig>(now)?
            + self.recover::<EvaluationConfig>(now)?
            + self.recover::<OptimizationConfig>(now)?;
        if recovered > 0 {
            info!(
                "Marked {} interrupted job(s) as failed in project {}",
                recovered,
                self.store.project_id()
            );
        }
        Ok(recovered)
    }

    fn recover<H: JobHost>(&self, now: DateTime<Utc>) -> WorkbenchResult<usize> {
        let Ok(stale_after) = chrono::Duration::from_std(self.settings.stale_after(<H::Job as Job>::KIND))
        else {
            return Ok(0);
        };
        let mut recovered = 0;

        self.store.modify_all::<H, _>(|process_id, host| {
            let mut changed = false;
            for job in host.jobs_mut().iter_mut() {
                if job.status() != JobStatus::Running {
                    continue;
                }
                // An unparseable timestamp cannot age out; leave it alone.
                let Some(deadline) = lifecycle::created_at(&*job)
                    .and_then(|created| created.checked_add_signed(stale_after))
                else {
                    continue;
                };
                if deadline > now {
                    continue;
                }
                if lifecycle::fail(job, INTERRUPTED_MESSAGE).is_ok() {
                    debug!("Recovered interrupted job {} in process {}", job.id(), process_id);
                    recovered += 1;
                    changed = true;
                }
            }
            changed
        })?;

        Ok(recovered)
    }
}

/// The completion step: `running -> completed` with synthetic results, written through
/// the store's serialised update path. A job that is gone or already terminal is left
/// untouched and `Ok(false)` is returned.
pub fn complete_job<J: SimulatedJob>(
    store: &PhaseConfigStore,
    process_id: &str,
    job_id: &str,
) -> WorkbenchResult<bool> {
    store.modify::<J::Host, _, _>(process_id, |host| {
        let Some(index) = host.jobs().iter().position(|job| job.id() == job_id) else {
            return Ok(false);
        };
        let mut job = host.jobs()[index].clone();
        if job.status() != JobStatus::Running {
            return Ok(false);
        }

        let mut rng = rand::thread_rng();
        job.attach_results(host, &mut rng);
        lifecycle::transition(&mut job, JobStatus::Completed)?;
        job.set_completed_at(Some(Utc::now().to_rfc3339()));

        host.jobs_mut()[index] = job;
        Ok(true)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{JobKind, PhaseType, TrainingRun};
    use crate::store::MemoryBackend;
    use std::collections::BTreeMap;

    fn fast_settings() -> Settings {
        Settings {
            training_delay_ms: 5,
            evaluation_delay_ms: 5,
            optimization_delay_ms: 5,
            stale_job_grace_ms: 1_000,
            log_retention_days: 7,
        }
    }

    fn engine() -> JobEngine {
        let store = Arc::new(PhaseConfigStore::new("proj", Arc::new(MemoryBackend::new())));
        JobEngine::new(store, fast_settings())
    }

    fn running_run(id: &str, created_at: &str) -> TrainingRun {
        TrainingRun {
            id: id.to_string(),
            name: id.to_string(),
            status: JobStatus::Running,
            algorithm_family: None,
            algorithm_type: "random_forest".to_string(),
            dataset_ids: vec!["d1".to_string()],
            hyper_parameters: BTreeMap::new(),
            created_at: created_at.to_string(),
            completed_at: None,
            metrics: None,
            error: None,
        }
    }

    #[tokio::test]
    async fn test_submitted_job_completes_after_delay() {
        let engine = engine();
        let now = Utc::now().to_rfc3339();
        let submission = engine.submit("p1", vec![running_run("t1", &now)]).unwrap();

        let stored = engine.store().read::<ModelingConfig>("p1");
        assert_eq!(stored.training_runs[0].status, JobStatus::Running);

        submission.wait().await;

        let stored = engine.store().read::<ModelingConfig>("p1");
        let run = &stored.training_runs[0];
        assert_eq!(run.status, JobStatus::Completed);
        assert!(run.completed_at.is_some());
        let accuracy = run.metrics.as_ref().unwrap().accuracy;
        assert!((0.85..=0.95).contains(&accuracy));
    }

    #[test]
    fn test_completion_of_terminal_or_missing_job_is_noop() {
        let engine = engine();
        let mut done = running_run("t1", "2024-01-01T00:00:00Z");
        done.status = JobStatus::Error;
        engine
            .store()
            .modify::<ModelingConfig, _, _>("p1", |c| {
                c.training_runs.push(done.clone());
                Ok(())
            })
            .unwrap();

        assert!(!complete_job::<TrainingRun>(engine.store(), "p1", "t1").unwrap());
        assert!(!complete_job::<TrainingRun>(engine.store(), "p1", "missing").unwrap());
        let stored = engine.store().read::<ModelingConfig>("p1");
        assert_eq!(stored.training_runs[0], done);
    }

    #[test]
    fn test_completion_does_not_resurrect_removed_config() {
        let engine = engine();
        assert!(!complete_job::<TrainingRun>(engine.store(), "p1", "t1").unwrap());
        assert!(engine.store().get("p1", PhaseType::Modeling).is_none());
    }

    #[test]
    fn test_recover_marks_only_stale_running_jobs() {
        let engine = engine();
        let now = Utc::now();
        let stale = (now - chrono::Duration::seconds(30)).to_rfc3339();
        let fresh = now.to_rfc3339();
        engine
            .store()
            .modify::<ModelingConfig, _, _>("p1", |c| {
                c.training_runs.push(running_run("old", &stale));
                c.training_runs.push(running_run("new", &fresh));
                Ok(())
            })
            .unwrap();

        assert_eq!(engine.recover_interrupted_jobs(now).unwrap(), 1);

        let runs = engine.store().read::<ModelingConfig>("p1").training_runs;
        assert_eq!(runs[0].status, JobStatus::Error);
        assert_eq!(runs[0].error.as_deref(), Some(INTERRUPTED_MESSAGE));
        assert_eq!(runs[1].status, JobStatus::Running);

        // Terminal jobs are never revisited.
        assert_eq!(engine.recover_interrupted_jobs(now).unwrap(), 0);
        assert_eq!(engine.settings().stale_after(JobKind::Training).as_millis(), 1_005);
    }
}
