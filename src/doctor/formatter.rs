//! Output formatting for dependency check results.
//!
//! Terminal output uses ✓/✗/○/⚠ markers with install hints for missing
//! tools; JSON output carries the same information for scripts.

use crate::doctor::{DependencyStatus, ToolStatus, COLORSCAD, OPENSCAD, SOURCE};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Output format for doctor results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable terminal output
    Terminal,
    /// Machine-readable JSON output
    Json,
}

/// Platform used to pick installation instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// macOS
    MacOs,
    /// Linux
    Linux,
    /// Windows
    Windows,
    /// Unknown platform
    Unknown,
}

impl Platform {
    /// Detects the current platform from OS configuration.
    #[must_use]
    pub fn detect() -> Self {
        if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(target_os = "linux") {
            Self::Linux
        } else if cfg!(target_os = "windows") {
            Self::Windows
        } else {
            Self::Unknown
        }
    }

    /// Returns the platform name as a string.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::MacOs => "macOS",
            Self::Linux => "Linux",
            Self::Windows => "Windows",
            Self::Unknown => "Unknown",
        }
    }
}

/// JSON output structure for doctor results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonOutput {
    /// Overall health status
    pub status: String,
    /// Number of successful checks
    pub passed: usize,
    /// Number of failed checks
    pub failed: usize,
    /// Number of unknown checks
    pub unknown: usize,
    /// Individual dependency results
    pub dependencies: Vec<JsonDependency>,
    /// Platform information
    pub platform: String,
}

/// JSON representation of a single dependency check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonDependency {
    /// Dependency name
    pub name: String,
    /// Status (available, missing, not_configured, unknown)
    pub status: String,
    /// Version string if detected
    pub version: Option<String>,
    /// Status message
    pub message: String,
    /// Installation instructions if missing
    pub installation_hint: Option<String>,
}

struct Counts {
    passed: usize,
    failed: usize,
    unknown: usize,
}

impl Counts {
    fn of(statuses: &[DependencyStatus]) -> Self {
        let count = |wanted: ToolStatus| statuses.iter().filter(|s| s.status == wanted).count();
        Self {
            passed: count(ToolStatus::Available),
            failed: count(ToolStatus::Missing),
            unknown: count(ToolStatus::Unknown),
        }
    }
}

/// Formatter for dependency check results.
pub struct DoctorFormatter {
    format: OutputFormat,
    platform: Platform,
}

impl DoctorFormatter {
    /// Creates a new formatter with terminal output and auto-detected platform.
    #[must_use]
    pub fn new() -> Self {
        Self::with_format(OutputFormat::Terminal)
    }

    /// Creates a new formatter with specified output format.
    #[must_use]
    pub fn with_format(format: OutputFormat) -> Self {
        Self {
            format,
            platform: Platform::detect(),
        }
    }

    /// Creates a new formatter with specified platform (for testing).
    #[must_use]
    pub fn with_platform(platform: Platform) -> Self {
        Self {
            format: OutputFormat::Terminal,
            platform,
        }
    }

    /// Formats dependency check results as terminal text or JSON.
    pub fn format_results(&self, statuses: &[DependencyStatus]) -> String {
        match self.format {
            OutputFormat::Terminal => self.format_terminal(statuses),
            OutputFormat::Json => self.format_json(statuses),
        }
    }

    fn format_terminal(&self, statuses: &[DependencyStatus]) -> String {
        let mut output = String::new();
        output.push_str("Keycap Build Environment Status\n");
        output.push_str("═══════════════════════════════\n\n");

        let counts = Counts::of(statuses);

        for status in statuses {
            let (symbol, status_text) = match status.status {
                ToolStatus::Available => ("✓", "OK"),
                ToolStatus::Missing => ("✗", "MISSING"),
                ToolStatus::NotConfigured => ("○", "NOT CONFIGURED"),
                ToolStatus::Unknown => ("⚠", "UNKNOWN"),
            };

            // ✓ OpenSCAD ............ OK (v2021.01)
            let name_width: usize = 20;
            let dots = ".".repeat(name_width.saturating_sub(status.name.len()));
            write!(output, "{symbol} {}{dots} {status_text}", status.name)
                .expect("Writing to String should not fail");
            if let Some(version) = &status.version {
                write!(output, " (v{version})")
                    .expect("Writing to String should not fail");
            }
            output.push('\n');

            if status.status == ToolStatus::Missing {
                if let Some(instructions) = self.installation_instructions(&status.name) {
                    writeln!(output, "    Install: {instructions}")
                        .expect("Writing to String should not fail");
                }
            }

            if status.status == ToolStatus::Available {
                output.push('\n');
            } else {
                for line in status.message.lines() {
                    writeln!(output, "    {line}")
                        .expect("Writing to String should not fail");
                }
                output.push('\n');
            }
        }

        output.push_str("───────────────────────────────\n");
        write!(output, "Summary: {} passed", counts.passed)
            .expect("Writing to String should not fail");
        if counts.failed > 0 {
            write!(output, ", {} failed", counts.failed)
                .expect("Writing to String should not fail");
        }
        if counts.unknown > 0 {
            write!(output, ", {} unknown", counts.unknown)
                .expect("Writing to String should not fail");
        }
        output.push('\n');

        if counts.failed == 0 && counts.unknown == 0 {
            output.push_str("\n✓ Ready to render keycaps.\n");
        } else if counts.failed > 0 {
            output.push_str("\n✗ Missing required dependencies\n");
            output.push_str("  Fix the entries above and run 'keyplay doctor' again.\n");
        } else {
            output.push_str("\n⚠ Some checks could not be completed\n");
            output.push_str("  Review warnings above and verify your setup.\n");
        }

        output
    }

    fn format_json(&self, statuses: &[DependencyStatus]) -> String {
        let counts = Counts::of(statuses);
        let overall_status = if counts.failed == 0 && counts.unknown == 0 {
            "ready"
        } else if counts.failed > 0 {
            "missing_dependencies"
        } else {
            "warnings"
        };

        let dependencies = statuses
            .iter()
            .map(|s| JsonDependency {
                name: s.name.clone(),
                status: match s.status {
                    ToolStatus::Available => "available",
                    ToolStatus::Missing => "missing",
                    ToolStatus::NotConfigured => "not_configured",
                    ToolStatus::Unknown => "unknown",
                }
                .to_string(),
                version: s.version.clone(),
                message: s.message.clone(),
                installation_hint: if s.status == ToolStatus::Missing {
                    self.installation_instructions(&s.name)
                } else {
                    None
                },
            })
            .collect();

        let json_output = JsonOutput {
            status: overall_status.to_string(),
            passed: counts.passed,
            failed: counts.failed,
            unknown: counts.unknown,
            dependencies,
            platform: self.platform.name().to_string(),
        };

        serde_json::to_string_pretty(&json_output).unwrap_or_else(|_| {
            r#"{"status":"error","message":"Failed to serialize JSON output"}"#.to_string()
        })
    }

    fn installation_instructions(&self, name: &str) -> Option<String> {
        let hint = match name {
            OPENSCAD => match self.platform {
                Platform::MacOs => "brew install --cask openscad",
                Platform::Linux => {
                    "sudo apt-get install openscad  (Debian/Ubuntu)\n         or: sudo pacman -S openscad  (Arch)"
                }
                Platform::Windows => "winget install OpenSCAD.OpenSCAD",
                Platform::Unknown => "Download from https://openscad.org/downloads.html",
            },
            COLORSCAD => {
                "git clone https://github.com/jschobben/colorscad.git\n         Then set paths.colorscad in the keyplay config"
            }
            SOURCE => "Set paths.source to the keycap_playground.scad checkout",
            _ => return None,
        };
        Some(hint.to_string())
    }
}

impl Default for DoctorFormatter {
    fn default() -> Self {
        Self::new()
    }
}
