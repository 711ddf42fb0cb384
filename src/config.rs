//! Configuration management for the application.
//!
//! This module handles loading, validating, and saving application configuration
//! in TOML format with platform-specific directory resolution. The `[defaults]`
//! table becomes the lowest-precedence override layer for every keycap.

use crate::catalog::{builtin, Catalog};
use crate::constants::{
    CONFIG_DIR_NAME, DEFAULT_MAX_PROCESSES, DEFAULT_SOURCE_FILE, DEFAULT_TIMEOUT_SECS,
};
use crate::models::{field, ParamValue};
use crate::render::FileType;
use crate::resolver::OverrideLayer;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Locations of the external tools and the geometry source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    /// OpenSCAD executable (name on `PATH` or absolute path)
    pub openscad: PathBuf,
    /// ColorSCAD wrapper script, needed for multi-material 3MF output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colorscad: Option<PathBuf>,
    /// The keycap playground `.scad` file
    pub source: PathBuf,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            openscad: PathBuf::from("openscad"),
            colorscad: None,
            source: PathBuf::from(DEFAULT_SOURCE_FILE),
        }
    }
}

/// Render run settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Where rendered files go
    pub output_dir: PathBuf,
    /// Model file type for keycap bodies
    pub file_type: FileType,
    /// Maximum number of OpenSCAD processes running at once
    pub max_processes: usize,
    /// Per-render timeout in seconds
    pub timeout_secs: u64,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            file_type: FileType::Stl,
            max_processes: DEFAULT_MAX_PROCESSES,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// A profile template declared in the configuration file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProfileConfig {
    /// Profile to start from (built-in or configured)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    /// Prefix added to names of keycaps using this profile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    /// Extra OpenSCAD variables this profile accepts
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub passthrough: Vec<String>,
    /// Field values
    #[serde(flatten)]
    pub values: BTreeMap<String, ParamValue>,
}

/// A keycap declared in the configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeycapConfig {
    /// Keycap name
    pub name: String,
    /// Profile template
    #[serde(default = "default_profile")]
    pub profile: String,
    /// Instance overrides
    #[serde(default)]
    pub overrides: BTreeMap<String, ParamValue>,
}

fn default_profile() -> String {
    "riskeycap".to_string()
}

/// Application configuration.
///
/// # File Location
///
/// - Linux: `~/.config/keyplay/config.toml`
/// - macOS: `~/Library/Application Support/keyplay/config.toml`
/// - Windows: `%APPDATA%\keyplay\config.toml`
///
/// # Validation
///
/// - `max_processes` and `timeout_secs` must be at least 1
/// - `[defaults]` may only name common keycap fields
/// - every configured profile and keycap must resolve
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    /// External tool and source locations
    #[serde(default)]
    pub paths: PathConfig,
    /// Render run settings
    #[serde(default)]
    pub build: BuildConfig,
    /// Global defaults layer
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub defaults: BTreeMap<String, ParamValue>,
    /// Extra profile templates
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub profiles: BTreeMap<String, ProfileConfig>,
    /// Extra keycaps
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keycaps: Vec<KeycapConfig>,
}

impl Config {
    /// Creates a new Config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the platform-specific config directory path.
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to determine config directory")?
            .join(CONFIG_DIR_NAME);

        Ok(config_dir)
    }

    /// Gets the full path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Checks if the config file exists on disk.
    #[must_use]
    pub fn exists() -> bool {
        Self::config_file_path()
            .map(|path| path.exists())
            .unwrap_or(false)
    }

    /// Loads configuration from the default config file.
    ///
    /// If the file doesn't exist, returns default configuration.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_file_path()?;
        Self::load_from(&config_path)
    }

    /// Loads configuration from `path`, falling back to defaults when it is missing.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Saves configuration to the default config file using atomic write.
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_file_path()?;
        self.save_to(&config_path)
    }

    /// Saves configuration to `path` using temp file + rename.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        let temp_path = path.with_extension("toml.tmp");
        fs::write(&temp_path, content).with_context(|| {
            format!("Failed to write temp config file: {}", temp_path.display())
        })?;

        fs::rename(&temp_path, path).with_context(|| {
            format!("Failed to rename temp config file to: {}", path.display())
        })?;

        Ok(())
    }

    /// Validates configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.build.max_processes == 0 {
            anyhow::bail!("build.max_processes must be at least 1");
        }
        if self.build.timeout_secs == 0 {
            anyhow::bail!("build.timeout_secs must be at least 1");
        }

        for key in self.defaults.keys() {
            if !field::is_common_field(key) {
                anyhow::bail!("Unknown field '{key}' in [defaults]");
            }
        }

        let catalog = Catalog::with_config(self).context("Invalid profile configuration")?;

        for (name, profile) in &self.profiles {
            let template = catalog.profile(name)?;
            for key in profile.values.keys() {
                if template.recognizes(key).is_none() {
                    anyhow::bail!("Unknown field '{key}' in profile '{name}'");
                }
            }
        }

        for keycap in &self.keycaps {
            let entry = catalog
                .keycaps()
                .iter()
                .find(|e| e.name() == keycap.name && e.profile() == keycap.profile)
                .with_context(|| format!("Keycap '{}' missing from catalog", keycap.name))?;
            catalog
                .resolve_entry(entry, None)
                .with_context(|| format!("Invalid keycap '{}'", keycap.name))?;
        }

        Ok(())
    }

    /// Built-in global defaults with the `[defaults]` table applied on top.
    pub fn global_defaults(&self) -> OverrideLayer {
        let mut layer = builtin::global_defaults();
        layer.extend_from(&OverrideLayer::from_entries("config", self.defaults.clone()));
        layer
    }
}
