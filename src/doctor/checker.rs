//! Checks for the external tools a keycap build needs.
//!
//! # Example
//!
//! ```rust
//! use keyplay::config::PathConfig;
//! use keyplay::doctor::{DependencyChecker, ToolStatus};
//!
//! let checker = DependencyChecker::new();
//! for status in checker.check_all(&PathConfig::default()) {
//!     if status.status == ToolStatus::Missing {
//!         println!("✗ {}: {}", status.name, status.message);
//!     }
//! }
//! ```
//!
//! Every check returns a structured status; nothing here panics or fails
//! on a broken environment.

use crate::config::PathConfig;
use anyhow::{Context, Result};
use std::io::ErrorKind;
use std::path::Path;
use std::process::Command;

/// Status of a single dependency check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolStatus {
    /// Dependency is present and working
    Available,
    /// Dependency is not found or not working
    Missing,
    /// Optional dependency that is not configured
    NotConfigured,
    /// Could not determine status
    Unknown,
}

/// Result of checking a single dependency.
#[derive(Debug, Clone)]
pub struct DependencyStatus {
    /// Name of the dependency (e.g., "OpenSCAD")
    pub name: String,
    /// Status of the dependency
    pub status: ToolStatus,
    /// Version string if detected (e.g., "2021.01")
    pub version: Option<String>,
    /// Human-readable message about the status
    pub message: String,
}

impl DependencyStatus {
    /// Creates a new dependency status.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        status: ToolStatus,
        version: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            status,
            version,
            message: message.into(),
        }
    }

    /// Creates a status for an available dependency with a known version.
    #[must_use]
    pub fn available(name: impl Into<String>, version: impl Into<String>) -> Self {
        let version = version.into();
        let message = format!("Found version {version}");
        Self::new(name, ToolStatus::Available, Some(version), message)
    }

    /// Creates a status for an available dependency without a version.
    #[must_use]
    pub fn found(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, ToolStatus::Available, None, message)
    }

    /// Creates a status for a missing dependency.
    #[must_use]
    pub fn missing(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, ToolStatus::Missing, None, message)
    }

    /// Creates a status for an optional dependency left unconfigured.
    #[must_use]
    pub fn not_configured(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, ToolStatus::NotConfigured, None, message)
    }

    /// Creates a status for an unknown dependency state.
    #[must_use]
    pub fn unknown(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, ToolStatus::Unknown, None, message)
    }
}

/// Name reported for the OpenSCAD check.
pub const OPENSCAD: &str = "OpenSCAD";
/// Name reported for the ColorSCAD check.
pub const COLORSCAD: &str = "ColorSCAD";
/// Name reported for the geometry source check.
pub const SOURCE: &str = "Keycap source";

/// Checker for the OpenSCAD toolchain.
#[derive(Debug, Clone, Default)]
pub struct DependencyChecker;

impl DependencyChecker {
    /// Creates a new dependency checker.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Checks every dependency named in `paths`.
    pub fn check_all(&self, paths: &PathConfig) -> Vec<DependencyStatus> {
        vec![
            self.check_openscad(&paths.openscad),
            self.check_colorscad(paths.colorscad.as_deref()),
            self.check_source(&paths.source),
        ]
    }

    /// Runs `openscad --version` and parses the version it prints.
    pub fn check_openscad(&self, program: &Path) -> DependencyStatus {
        match Self::run_version_command(program, &["--version"]) {
            // OpenSCAD prints "OpenSCAD version 2021.01" on stderr
            Ok(output) => match Self::parse_version(&output) {
                Some(version) => DependencyStatus::available(OPENSCAD, version),
                None => DependencyStatus::unknown(
                    OPENSCAD,
                    format!(
                        "Found but could not parse version: {}",
                        output.lines().next().unwrap_or("")
                    ),
                ),
            },
            Err(e) if Self::is_command_not_found(&e) => DependencyStatus::missing(
                OPENSCAD,
                format!("'{}' not found in PATH", program.display()),
            ),
            Err(e) => DependencyStatus::unknown(OPENSCAD, format!("Error checking: {e:#}")),
        }
    }

    /// Checks that the configured ColorSCAD script exists.
    pub fn check_colorscad(&self, script: Option<&Path>) -> DependencyStatus {
        let Some(script) = script else {
            return DependencyStatus::not_configured(
                COLORSCAD,
                "Not configured; 3mf output will be single-material",
            );
        };
        if script.is_file() {
            DependencyStatus::found(COLORSCAD, format!("Found at {}", script.display()))
        } else {
            DependencyStatus::missing(
                COLORSCAD,
                format!("Script does not exist: {}", script.display()),
            )
        }
    }

    /// Checks that the geometry source is a readable `.scad` file.
    pub fn check_source(&self, source: &Path) -> DependencyStatus {
        if !source.exists() {
            return DependencyStatus::missing(
                SOURCE,
                format!("File does not exist: {}", source.display()),
            );
        }
        if !source.is_file() {
            return DependencyStatus::missing(
                SOURCE,
                format!("Path is not a file: {}", source.display()),
            );
        }
        if source.extension().and_then(|ext| ext.to_str()) != Some("scad") {
            return DependencyStatus::unknown(
                SOURCE,
                format!("Not a .scad file: {}", source.display()),
            );
        }
        DependencyStatus::found(SOURCE, format!("Using {}", source.display()))
    }

    /// Runs a command and returns whichever of stdout and stderr has text.
    fn run_version_command(program: &Path, args: &[&str]) -> Result<String> {
        let output = Command::new(program)
            .args(args)
            .output()
            .with_context(|| format!("Failed to execute '{}'", program.display()))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let text = if stdout.trim().is_empty() {
            stderr
        } else {
            stdout
        };
        Ok(text.into_owned())
    }

    /// Finds the first `X.Y[.Z]` word.
    ///
    /// - "OpenSCAD version 2021.01" -> Some("2021.01")
    /// - "OpenSCAD version 2024.12.06.ai22199" -> Some("2024.12.06")
    fn parse_version(output: &str) -> Option<String> {
        output.split_whitespace().find_map(|word| {
            let numeric: Vec<&str> = word
                .split('.')
                .take_while(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
                .collect();
            (numeric.len() >= 2).then(|| numeric.join("."))
        })
    }

    fn is_command_not_found(error: &anyhow::Error) -> bool {
        error
            .chain()
            .filter_map(|cause| cause.downcast_ref::<std::io::Error>())
            .any(|io| io.kind() == ErrorKind::NotFound)
    }
}
