//! `keyplay inspect`: show the resolved parameters of one keycap.

use crate::catalog::Catalog;
use crate::cli::common::{load_config, print_json, CliError, CliResult};
use crate::models::RenderTarget;
use clap::Args;
use std::path::Path;

/// Show the fully resolved parameters for a keycap
#[derive(Debug, Clone, Args)]
pub struct InspectArgs {
    /// Keycap name (case-insensitive)
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Output the resolved spec as JSON
    #[arg(long)]
    pub json: bool,
}

impl InspectArgs {
    /// Execute the inspect command
    pub fn execute(&self, config_path: Option<&Path>) -> CliResult<()> {
        let config = load_config(config_path)?;
        let catalog = Catalog::with_config(&config)
            .map_err(|e| CliError::validation(format!("Invalid catalog: {e}")))?;
        let spec = catalog
            .resolve(&self.name)
            .map_err(|e| CliError::validation(e.to_string()))?;

        if self.json {
            return print_json(&spec);
        }

        println!("{} (profile {})", spec.name(), spec.profile());
        for (name, value) in spec.scad_definitions(RenderTarget::Keycap) {
            println!("  {name} = {value}");
        }
        Ok(())
    }
}
