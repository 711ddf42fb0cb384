//! Expanding requested keycap names into build jobs.

use super::command::CommandBuilder;
use super::job::{BuildJob, JobStatus};
use crate::catalog::{Catalog, KeycapEntry};
use crate::models::{RenderPart, RenderTarget};
use crate::resolver::{ConfigurationError, OverrideLayer};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Output geometry format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FileType {
    /// Single-body STL
    #[default]
    #[serde(rename = "stl")]
    Stl,
    /// 3MF, multi-material when ColorSCAD is available
    #[serde(rename = "3mf")]
    ThreeMf,
}

impl FileType {
    /// File extension without the dot.
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Stl => "stl",
            Self::ThreeMf => "3mf",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for FileType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stl" => Ok(Self::Stl),
            "3mf" => Ok(Self::ThreeMf),
            other => Err(format!("unsupported file type '{other}' (expected stl or 3mf)")),
        }
    }
}

/// Options that shape a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanOptions {
    /// Directory output files are written to
    pub out_dir: PathBuf,
    /// Rebuild even when the output file exists
    pub force: bool,
    /// Also render legends as a separate artifact
    pub legends: bool,
    /// Render stems as a separate artifact instead of with the body
    pub stems: bool,
    /// Format of body and stem outputs
    pub file_type: FileType,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("."),
            force: false,
            legends: false,
            stems: false,
            file_type: FileType::Stl,
        }
    }
}

/// A keycap that could not be planned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanningFailure {
    /// Name as requested
    pub keycap: String,
    /// Why planning failed
    pub error: String,
}

/// Jobs to run and keycaps that could not be planned.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    /// Jobs in planning order, including skipped ones
    pub jobs: Vec<BuildJob>,
    /// Per-keycap planning errors
    pub failures: Vec<PlanningFailure>,
}

/// Expands keycap names into build jobs.
#[derive(Debug, Clone)]
pub struct JobPlanner {
    catalog: Catalog,
    builder: CommandBuilder,
}

impl JobPlanner {
    /// Creates a planner over a catalog and command builder.
    pub fn new(catalog: Catalog, builder: CommandBuilder) -> Self {
        Self { catalog, builder }
    }

    /// The catalog names are looked up in.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Plans jobs for `names`, or for every catalog keycap when empty.
    ///
    /// A name that fails to resolve or build is recorded in
    /// [`Plan::failures`] and contributes no jobs; the others are planned
    /// normally. Jobs whose output exists are marked skipped unless
    /// `options.force` is set.
    pub fn plan(&self, names: &[String], options: &PlanOptions) -> Plan {
        let mut plan = Plan::default();
        let mut seen = HashSet::new();

        let requested: Vec<String> = if names.is_empty() {
            self.catalog.names()
        } else {
            names.to_vec()
        };

        for name in requested {
            let Some(entry) = self.catalog.find(&name) else {
                warn!("Unknown keycap '{}', skipping", name);
                plan.failures.push(PlanningFailure {
                    keycap: name.clone(),
                    error: ConfigurationError::UnknownKeycap(name).to_string(),
                });
                continue;
            };

            let shown = self.catalog.display_name(entry);
            if !seen.insert(shown.clone()) {
                debug!("Keycap '{}' requested more than once", shown);
                continue;
            }

            match self.plan_keycap(entry, options) {
                Ok(jobs) => plan.jobs.extend(jobs),
                Err(e) => {
                    warn!("Could not plan '{}': {}", shown, e);
                    plan.failures.push(PlanningFailure {
                        keycap: shown,
                        error: e.to_string(),
                    });
                }
            }
        }

        let skipped = plan
            .jobs
            .iter()
            .filter(|j| j.status() == JobStatus::Skipped)
            .count();
        info!(
            "Planned {} jobs ({} up to date, {} planning failures)",
            plan.jobs.len(),
            skipped,
            plan.failures.len()
        );
        plan
    }

    fn plan_keycap(
        &self,
        entry: &KeycapEntry,
        options: &PlanOptions,
    ) -> Result<Vec<BuildJob>, ConfigurationError> {
        let spec = self.catalog.resolve_entry(entry, None)?;
        let multimaterial =
            options.file_type == FileType::ThreeMf && self.builder.toolchain().supports_multimaterial();
        let body_target = if multimaterial {
            RenderTarget::Multimaterial
        } else {
            RenderTarget::Keycap
        };
        let ext = options.file_type.extension();

        let mut targets = Vec::new();
        if options.stems && spec.render().contains(&RenderPart::Stem) {
            let parts: Vec<&str> = spec
                .render()
                .iter()
                .filter(|part| **part != RenderPart::Stem)
                .map(|part| part.as_str())
                .collect();
            if !parts.is_empty() {
                let split = OverrideLayer::new("planner").with("render", parts);
                let body = self.catalog.resolve_entry(entry, Some(&split))?;
                targets.push((body, body_target, ext));
            }
            targets.push((spec.clone(), RenderTarget::Stem, ext));
        } else {
            targets.push((spec.clone(), body_target, ext));
        }

        // A multi-material body already carries the legends as their own object.
        if (options.legends || spec.separate_legends()) && spec.has_legend() && !multimaterial {
            targets.push((spec.clone(), RenderTarget::Legends, FileType::Stl.extension()));
        }

        let mut jobs = Vec::with_capacity(targets.len());
        for (job_spec, target, ext) in targets {
            let output = options
                .out_dir
                .join(format!("{}{}.{}", job_spec.name(), target.suffix(), ext));
            let invocation = self.builder.build(&job_spec, target, &output)?;
            let job = BuildJob::new(job_spec, target, invocation);

            if !options.force && output.exists() {
                info!("{} exists; skipping...", output.display());
                jobs.push(job.skipped());
            } else {
                debug!("Planned {}: {}", output.display(), job.invocation().command_line());
                jobs.push(job);
            }
        }
        Ok(jobs)
    }
}

/// Creates the output directory and checks it is writable.
pub fn prepare_output_dir(out_dir: &Path) -> Result<()> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory: {}", out_dir.display()))?;

    let marker = out_dir.join(".keyplay-write-test");
    fs::write(&marker, b"")
        .with_context(|| format!("Output directory is not writable: {}", out_dir.display()))?;
    fs::remove_file(&marker)
        .with_context(|| format!("Failed to clean up {}", marker.display()))?;
    Ok(())
}
