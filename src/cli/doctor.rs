//! Doctor command for dependency checking.

use crate::cli::common::{load_config, CliError, CliResult};
use crate::doctor::{DependencyChecker, DoctorFormatter, OutputFormat, ToolStatus};
use clap::Args;
use std::path::Path;

/// Check that OpenSCAD and the keycap source are available
#[derive(Debug, Clone, Args)]
pub struct DoctorArgs {
    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

impl DoctorArgs {
    /// Execute the doctor command
    pub fn execute(&self, config_path: Option<&Path>) -> CliResult<()> {
        let config = load_config(config_path).unwrap_or_default();

        let statuses = DependencyChecker::new().check_all(&config.paths);

        let format = if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Terminal
        };
        println!("{}", DoctorFormatter::with_format(format).format_results(&statuses));

        if statuses.iter().any(|s| s.status == ToolStatus::Missing) {
            Err(CliError::validation("Some dependencies are missing"))
        } else {
            Ok(())
        }
    }
}
