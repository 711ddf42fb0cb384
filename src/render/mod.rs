//! Rendering keycaps: building compiler invocations, planning jobs and
//! running them concurrently.

pub mod command;
pub mod job;
pub mod orchestrator;
pub mod planner;
pub mod runner;

pub use command::{CommandBuilder, InvocationDescriptor, Toolchain};
pub use job::{BuildJob, JobResult, JobStatus};
pub use orchestrator::{Orchestrator, RunReport};
pub use planner::{prepare_output_dir, FileType, JobPlanner, Plan, PlanOptions, PlanningFailure};
pub use runner::{CancelToken, JobFailure, JobRunner, ProcessOutput, ProcessRunner};
