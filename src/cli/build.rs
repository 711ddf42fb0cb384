//! `keyplay build`: render keycaps.

use crate::catalog::Catalog;
use crate::cli::common::{load_config, print_json, CliError, CliResult};
use crate::render::{
    prepare_output_dir, CancelToken, CommandBuilder, FileType, JobPlanner, JobStatus,
    Orchestrator, Plan, PlanOptions, RunReport, Toolchain,
};
use clap::Args;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

/// Render keycaps to STL or 3MF files
#[derive(Debug, Clone, Args)]
pub struct BuildArgs {
    /// Keycap names to render (case-insensitive; all keycaps when omitted)
    #[arg(value_name = "NAME")]
    pub names: Vec<String>,

    /// Output directory
    #[arg(short, long, value_name = "DIR")]
    pub out: Option<PathBuf>,

    /// Re-render even when the output file already exists
    #[arg(short, long)]
    pub force: bool,

    /// Also render legends as separate files
    #[arg(short, long)]
    pub legends: bool,

    /// Render stems as separate files
    #[arg(long)]
    pub stems: bool,

    /// Output file type for keycap bodies (stl or 3mf)
    #[arg(short = 't', long = "file-type", value_name = "TYPE")]
    pub file_type: Option<FileType>,

    /// Maximum number of OpenSCAD processes at once
    #[arg(short = 'j', long = "max-processes", value_name = "N")]
    pub max_processes: Option<usize>,

    /// Per-render timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Print the commands without running them
    #[arg(long)]
    pub dry_run: bool,

    /// Output the run report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct DryRunJob<'a> {
    keycap: &'a str,
    target: String,
    output: &'a Path,
    status: JobStatus,
    command: String,
}

impl BuildArgs {
    /// Execute the build command
    pub fn execute(&self, config_path: Option<&Path>) -> CliResult<()> {
        let config = load_config(config_path)?;
        let catalog = Catalog::with_config(&config)
            .map_err(|e| CliError::validation(format!("Invalid catalog: {e}")))?;

        let limit = self.max_processes.unwrap_or(config.build.max_processes);
        if limit == 0 {
            return Err(CliError::validation("--max-processes must be at least 1"));
        }
        let timeout = self.timeout.unwrap_or(config.build.timeout_secs);
        if timeout == 0 {
            return Err(CliError::validation("--timeout must be at least 1 second"));
        }

        let options = PlanOptions {
            out_dir: self.out.clone().unwrap_or_else(|| config.build.output_dir.clone()),
            force: self.force,
            legends: self.legends,
            stems: self.stems,
            file_type: self.file_type.unwrap_or(config.build.file_type),
        };

        let builder = CommandBuilder::new(Toolchain::from_paths(&config.paths));
        let planner = JobPlanner::new(catalog, builder);
        let plan = planner.plan(&self.names, &options);

        if self.dry_run {
            return self.print_dry_run(&plan);
        }

        prepare_output_dir(&options.out_dir).map_err(|e| CliError::io(format!("{e:#}")))?;

        let orchestrator = Orchestrator::new(Duration::from_secs(timeout));
        watch_ctrl_c(orchestrator.cancel_token());
        let report = orchestrator.run_plan(plan, limit);
        info!("{}", report.summary());

        if self.json {
            print_json(&report)?;
        } else {
            print_report(&report);
        }

        if report.is_success() {
            Ok(())
        } else {
            Err(CliError::validation(report.summary()))
        }
    }

    fn print_dry_run(&self, plan: &Plan) -> CliResult<()> {
        if self.json {
            let jobs: Vec<DryRunJob<'_>> = plan
                .jobs
                .iter()
                .map(|job| DryRunJob {
                    keycap: job.keycap(),
                    target: job.target().to_string(),
                    output: job.output(),
                    status: job.status(),
                    command: job.invocation().command_line(),
                })
                .collect();
            print_json(&jobs)?;
        } else {
            for job in &plan.jobs {
                if job.status() == JobStatus::Skipped {
                    println!("# {} exists; skipping", job.output().display());
                } else {
                    println!("{}", job.invocation().command_line());
                }
            }
        }

        for failure in &plan.failures {
            eprintln!("{}: {}", failure.keycap, failure.error);
        }
        if plan.failures.is_empty() {
            Ok(())
        } else {
            Err(CliError::validation(format!(
                "{} keycaps could not be planned",
                plan.failures.len()
            )))
        }
    }
}

/// Cancels `token` on the first Ctrl-C.
fn watch_ctrl_c(token: CancelToken) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!("Ctrl-C handling unavailable: {}", e);
                return;
            }
        };
        if runtime.block_on(tokio::signal::ctrl_c()).is_ok() {
            warn!("Interrupted; cancelling remaining renders");
            token.cancel();
        }
    });
}

fn print_report(report: &RunReport) {
    for job in report.jobs() {
        println!("{:<10} {}", job.status.to_string(), job.output.display());
        if let Some(diagnostic) = &job.diagnostic {
            if job.status != JobStatus::Skipped {
                for line in diagnostic.lines() {
                    println!("           {line}");
                }
            }
        }
    }
    for failure in report.planning_failures() {
        println!("{:<10} {}: {}", "error", failure.keycap, failure.error);
    }
    println!("{}", report.summary());
}
