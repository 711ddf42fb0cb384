//! `keyplay list`: show renderable keycaps.

use crate::catalog::Catalog;
use crate::cli::common::{load_config, print_json, CliError, CliResult};
use clap::Args;
use serde::Serialize;
use std::path::Path;

/// List every keycap that can be rendered
#[derive(Debug, Clone, Args)]
pub struct ListArgs {
    /// Only show keycaps using this profile
    #[arg(short, long, value_name = "PROFILE")]
    pub profile: Option<String>,

    /// List profile templates instead of keycaps
    #[arg(long)]
    pub profiles: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct KeycapRow {
    name: String,
    profile: String,
}

#[derive(Serialize)]
struct ProfileRow<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    prefix: Option<&'a str>,
    passthrough: Vec<&'a str>,
}

impl ListArgs {
    /// Execute the list command
    pub fn execute(&self, config_path: Option<&Path>) -> CliResult<()> {
        let config = load_config(config_path)?;
        let catalog = Catalog::with_config(&config)
            .map_err(|e| CliError::validation(format!("Invalid catalog: {e}")))?;

        if self.profiles {
            return self.list_profiles(&catalog);
        }

        if let Some(profile) = &self.profile {
            catalog
                .profile(profile)
                .map_err(|e| CliError::validation(e.to_string()))?;
        }

        let rows: Vec<KeycapRow> = catalog
            .keycaps()
            .iter()
            .filter(|entry| self.profile.as_deref().map_or(true, |p| entry.profile() == p))
            .map(|entry| KeycapRow {
                name: catalog.display_name(entry),
                profile: entry.profile().to_string(),
            })
            .collect();

        if self.json {
            print_json(&rows)
        } else {
            for row in &rows {
                println!("{}", row.name);
            }
            Ok(())
        }
    }

    fn list_profiles(&self, catalog: &Catalog) -> CliResult<()> {
        let rows: Vec<ProfileRow<'_>> = catalog
            .profiles()
            .map(|profile| ProfileRow {
                name: profile.name(),
                prefix: profile.name_prefix(),
                passthrough: profile.passthrough().keys().map(String::as_str).collect(),
            })
            .collect();

        if self.json {
            print_json(&rows)
        } else {
            for row in &rows {
                match row.prefix {
                    Some(prefix) => println!("{} (prefix {prefix})", row.name),
                    None => println!("{}", row.name),
                }
            }
            Ok(())
        }
    }
}
