//! Running planned jobs on a bounded pool of workers.

use super::job::{BuildJob, JobResult, JobStatus};
use super::planner::{Plan, PlanningFailure};
use super::runner::{CancelToken, JobFailure, JobRunner, ProcessRunner};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Outcome of one orchestrated run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    jobs: Vec<JobResult>,
    planning_failures: Vec<PlanningFailure>,
}

impl RunReport {
    /// Unique identifier of the run.
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// When the run started.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// When the last job finished.
    pub fn finished_at(&self) -> DateTime<Utc> {
        self.finished_at
    }

    /// Job results ordered by keycap name, then file suffix.
    pub fn jobs(&self) -> &[JobResult] {
        &self.jobs
    }

    /// Keycaps that never produced jobs.
    pub fn planning_failures(&self) -> &[PlanningFailure] {
        &self.planning_failures
    }

    /// Number of jobs that ended in `status`.
    pub fn count(&self, status: JobStatus) -> usize {
        self.jobs.iter().filter(|job| job.status == status).count()
    }

    /// Returns true when every job succeeded or was skipped and planning
    /// reported nothing.
    pub fn is_success(&self) -> bool {
        self.planning_failures.is_empty() && !self.jobs.iter().any(|job| job.status.is_failure())
    }

    /// One-line summary of the run.
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "{} jobs: {} succeeded, {} skipped, {} failed, {} timed out, {} cancelled",
            self.jobs.len(),
            self.count(JobStatus::Succeeded),
            self.count(JobStatus::Skipped),
            self.count(JobStatus::Failed),
            self.count(JobStatus::TimedOut),
            self.count(JobStatus::Cancelled),
        );
        if !self.planning_failures.is_empty() {
            summary.push_str(&format!(
                "; {} keycaps could not be planned",
                self.planning_failures.len()
            ));
        }
        summary
    }
}

/// Runs build jobs with at most `limit` compiler processes at a time.
pub struct Orchestrator {
    runner: Arc<dyn JobRunner>,
    timeout: Duration,
    cancel: CancelToken,
}

impl Orchestrator {
    /// Creates an orchestrator spawning real compiler processes.
    pub fn new(timeout: Duration) -> Self {
        Self::with_runner(Arc::new(ProcessRunner::new()), timeout)
    }

    /// Creates an orchestrator using a custom runner.
    pub fn with_runner(runner: Arc<dyn JobRunner>, timeout: Duration) -> Self {
        Self {
            runner,
            timeout,
            cancel: CancelToken::new(),
        }
    }

    /// Uses an externally owned cancellation token.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that cancels this orchestrator's runs.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Runs a plan and folds its planning failures into the report.
    pub fn run_plan(&self, plan: Plan, limit: usize) -> RunReport {
        let mut report = self.run(plan.jobs, limit);
        report.planning_failures = plan.failures;
        report
    }

    /// Runs `jobs`, never more than `limit` at once.
    ///
    /// Skipped jobs are reported without running. A limit of zero is treated
    /// as one. Once the cancel token fires, running jobs are killed and jobs
    /// still queued are reported as cancelled.
    pub fn run(&self, jobs: Vec<BuildJob>, limit: usize) -> RunReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();

        let mut results = Vec::with_capacity(jobs.len());
        let mut queue = VecDeque::with_capacity(jobs.len());
        for job in jobs {
            if job.status() == JobStatus::Skipped {
                results.push(JobResult::from_job(&job, JobStatus::Skipped));
            } else {
                queue.push_back(job);
            }
        }

        let workers = limit.max(1).min(queue.len());
        info!(
            "Run {}: {} jobs to render on {} workers, {} up to date",
            run_id,
            queue.len(),
            workers,
            results.len()
        );

        let queue = Mutex::new(queue);
        let results = Mutex::new(results);
        thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| self.work(&queue, &results));
            }
        });

        let mut jobs = results.into_inner().unwrap_or_else(PoisonError::into_inner);
        jobs.sort_by(|a, b| {
            a.keycap
                .cmp(&b.keycap)
                .then_with(|| a.suffix().cmp(b.suffix()))
        });

        RunReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            jobs,
            planning_failures: Vec::new(),
        }
    }

    fn work(&self, queue: &Mutex<VecDeque<BuildJob>>, results: &Mutex<Vec<JobResult>>) {
        loop {
            let Some(job) = lock(queue).pop_front() else {
                break;
            };
            let result = if self.cancel.is_cancelled() {
                debug!("Cancelled before start: {}", job.output().display());
                JobResult::from_job(&job, JobStatus::Cancelled)
            } else {
                self.execute(job)
            };
            lock(results).push(result);
        }
    }

    fn execute(&self, mut job: BuildJob) -> JobResult {
        job.set_status(JobStatus::Running);
        info!("Rendering {}...", job.output().display());
        debug!("{}", job.invocation().command_line());

        let started = Instant::now();
        let outcome = match self.runner.run(job.invocation(), self.timeout, &self.cancel) {
            Ok(_) if !job.output().exists() => Err(JobFailure::MissingOutput),
            other => other,
        };
        let elapsed = started.elapsed();

        let status = match &outcome {
            Ok(_) => JobStatus::Succeeded,
            Err(JobFailure::Timeout { .. }) => JobStatus::TimedOut,
            Err(JobFailure::Cancelled) => JobStatus::Cancelled,
            Err(_) => JobStatus::Failed,
        };
        if matches!(status, JobStatus::TimedOut | JobStatus::Cancelled) {
            remove_partial(job.output());
        }
        job.set_status(status);

        let mut result = JobResult::from_job(&job, status);
        result.elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        match outcome {
            Ok(_) => info!(
                "Rendered {} in {:.1}s",
                job.output().display(),
                elapsed.as_secs_f64()
            ),
            Err(failure) => {
                match status {
                    JobStatus::Cancelled => warn!("{}: {}", job.output().display(), failure),
                    _ => error!("{}: {}", job.output().display(), failure),
                }
                result.exit_code = failure.exit_code();
                result.diagnostic = Some(failure.diagnostic());
            }
        }
        result
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Removes a possibly half-written output file.
fn remove_partial(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!("Removed partial output {}", path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!("Could not remove partial output {}: {}", path.display(), e),
    }
}
