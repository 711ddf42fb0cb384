//! Build jobs and their lifecycle states.

use super::command::InvocationDescriptor;
use crate::models::{KeycapSpec, RenderTarget};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// State of a build job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobStatus {
    /// Planned, waiting for a worker
    Pending,
    /// Compiler process running
    Running,
    /// Output already existed and the build was not forced
    Skipped,
    /// Compiler exited 0 and wrote the output file
    Succeeded,
    /// Compiler could not start, exited non-zero or wrote nothing
    Failed,
    /// Compiler ran past the per-job timeout and was killed
    TimedOut,
    /// Run was cancelled before or while this job ran
    Cancelled,
}

impl JobStatus {
    /// Returns true for states a job never leaves.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending | Self::Running)
    }

    /// Returns true for states that make a run unsuccessful.
    pub fn is_failure(self) -> bool {
        matches!(self, Self::Failed | Self::TimedOut | Self::Cancelled)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Skipped => write!(f, "skipped"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
            Self::TimedOut => write!(f, "timed-out"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// One planned compiler invocation producing one output file.
#[derive(Debug, Clone)]
pub struct BuildJob {
    spec: KeycapSpec,
    target: RenderTarget,
    invocation: InvocationDescriptor,
    status: JobStatus,
}

impl BuildJob {
    /// Creates a pending job.
    pub fn new(spec: KeycapSpec, target: RenderTarget, invocation: InvocationDescriptor) -> Self {
        Self {
            spec,
            target,
            invocation,
            status: JobStatus::Pending,
        }
    }

    /// Marks the job as skipped because its output exists.
    pub fn skipped(mut self) -> Self {
        self.status = JobStatus::Skipped;
        self
    }

    /// Keycap spec the job renders.
    pub fn spec(&self) -> &KeycapSpec {
        &self.spec
    }

    /// Keycap name.
    pub fn keycap(&self) -> &str {
        self.spec.name()
    }

    /// Render target.
    pub fn target(&self) -> RenderTarget {
        self.target
    }

    /// Output file.
    pub fn output(&self) -> &Path {
        self.invocation.output()
    }

    /// Invocation that produces the output.
    pub fn invocation(&self) -> &InvocationDescriptor {
        &self.invocation
    }

    /// Current status.
    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub(crate) fn set_status(&mut self, status: JobStatus) {
        self.status = status;
    }
}

/// Final record of one job in a run report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobResult {
    /// Keycap name
    pub keycap: String,
    /// Render target
    pub target: RenderTarget,
    /// Output file
    pub output: PathBuf,
    /// Terminal status
    pub status: JobStatus,
    /// Shell-quoted command line
    pub command: String,
    /// Compiler exit code, when it exited on its own
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    /// Compiler diagnostics or the reason the job did not succeed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
    /// Wall-clock time spent running, in milliseconds
    pub elapsed_ms: u64,
}

impl JobResult {
    pub(crate) fn from_job(job: &BuildJob, status: JobStatus) -> Self {
        Self {
            keycap: job.keycap().to_string(),
            target: job.target(),
            output: job.output().to_path_buf(),
            status,
            command: job.invocation().command_line(),
            exit_code: None,
            diagnostic: None,
            elapsed_ms: 0,
        }
    }

    /// File name suffix of the target, used to order results.
    pub fn suffix(&self) -> &'static str {
        self.target.suffix()
    }
}
