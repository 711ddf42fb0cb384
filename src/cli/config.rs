//! Configuration management CLI commands.

use crate::cli::common::{load_config, print_json, CliError, CliResult};
use crate::config::Config;
use crate::render::FileType;
use clap::{Args, Subcommand};
use std::path::{Path, PathBuf};

/// Configuration management commands
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand, Debug, Clone)]
enum ConfigCommand {
    /// Display the effective configuration
    Show(ConfigShowArgs),
    /// Print the configuration file path
    Path,
    /// Set configuration values
    Set(ConfigSetArgs),
}

/// Display the effective configuration
#[derive(Args, Debug, Clone)]
pub struct ConfigShowArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Set configuration values
#[derive(Args, Debug, Clone)]
pub struct ConfigSetArgs {
    /// OpenSCAD executable
    #[arg(long, value_name = "PATH")]
    openscad: Option<PathBuf>,

    /// ColorSCAD script for multi-material output
    #[arg(long, value_name = "PATH")]
    colorscad: Option<PathBuf>,

    /// Keycap playground .scad file
    #[arg(long, value_name = "FILE")]
    source: Option<PathBuf>,

    /// Default output directory
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Default file type (stl or 3mf)
    #[arg(long, value_name = "TYPE")]
    file_type: Option<FileType>,

    /// Default number of parallel OpenSCAD processes
    #[arg(long, value_name = "N")]
    max_processes: Option<usize>,

    /// Default per-render timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,
}

impl ConfigArgs {
    /// Execute config subcommand
    pub fn execute(&self, config_path: Option<&Path>) -> CliResult<()> {
        match &self.command {
            ConfigCommand::Show(args) => args.execute(config_path),
            ConfigCommand::Path => {
                let path = resolve_path(config_path)?;
                println!("{}", path.display());
                Ok(())
            }
            ConfigCommand::Set(args) => args.execute(config_path),
        }
    }
}

fn resolve_path(config_path: Option<&Path>) -> CliResult<PathBuf> {
    match config_path {
        Some(path) => Ok(path.to_path_buf()),
        None => Config::config_file_path()
            .map_err(|e| CliError::io(format!("Failed to locate configuration: {e}"))),
    }
}

impl ConfigShowArgs {
    /// Execute show command
    pub fn execute(&self, config_path: Option<&Path>) -> CliResult<()> {
        let config = load_config(config_path)?;

        if self.json {
            return print_json(&config);
        }

        let toml = toml::to_string_pretty(&config)
            .map_err(|e| CliError::io(format!("Failed to serialize configuration: {e}")))?;
        print!("{toml}");
        Ok(())
    }
}

impl ConfigSetArgs {
    fn is_empty(&self) -> bool {
        self.openscad.is_none()
            && self.colorscad.is_none()
            && self.source.is_none()
            && self.output_dir.is_none()
            && self.file_type.is_none()
            && self.max_processes.is_none()
            && self.timeout.is_none()
    }

    /// Execute set command
    pub fn execute(&self, config_path: Option<&Path>) -> CliResult<()> {
        if self.is_empty() {
            return Err(CliError::validation(
                "At least one configuration option must be specified",
            ));
        }

        let mut config = load_config(config_path)?;

        if let Some(openscad) = &self.openscad {
            config.paths.openscad.clone_from(openscad);
        }
        if let Some(colorscad) = &self.colorscad {
            if !colorscad.is_file() {
                return Err(CliError::validation(format!(
                    "ColorSCAD script does not exist: {}",
                    colorscad.display()
                )));
            }
            config.paths.colorscad = Some(colorscad.clone());
        }
        if let Some(source) = &self.source {
            if !source.is_file() {
                return Err(CliError::validation(format!(
                    "Source file does not exist: {}",
                    source.display()
                )));
            }
            config.paths.source.clone_from(source);
        }
        if let Some(output_dir) = &self.output_dir {
            config.build.output_dir.clone_from(output_dir);
        }
        if let Some(file_type) = self.file_type {
            config.build.file_type = file_type;
        }
        if let Some(max_processes) = self.max_processes {
            config.build.max_processes = max_processes;
        }
        if let Some(timeout) = self.timeout {
            config.build.timeout_secs = timeout;
        }

        config
            .validate()
            .map_err(|e| CliError::validation(format!("{e:#}")))?;

        let path = resolve_path(config_path)?;
        config
            .save_to(&path)
            .map_err(|e| CliError::io(format!("Failed to save configuration: {e:#}")))?;

        println!("Configuration updated: {}", path.display());
        Ok(())
    }
}
