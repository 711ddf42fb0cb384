//! Integration tests for the doctor module.
//!
//! These tests verify that the DependencyChecker reports OpenSCAD, ColorSCAD
//! and the keycap source the way `keyplay doctor` prints them.

use keyplay::config::PathConfig;
use keyplay::doctor::{DependencyChecker, DoctorFormatter, OutputFormat, ToolStatus};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_check_all_returns_expected_dependencies() {
    let checker = DependencyChecker::new();
    let statuses = checker.check_all(&PathConfig::default());

    let names: Vec<&str> = statuses.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["OpenSCAD", "ColorSCAD", "Keycap source"]);

    for status in &statuses {
        assert!(
            !status.message.is_empty(),
            "Status for {} has empty message",
            status.name
        );
    }
}

#[test]
fn test_configured_paths_are_checked() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("keycap_playground.scad");
    fs::write(&source, "// keycaps\n").unwrap();
    let colorscad = dir.path().join("colorscad.sh");
    fs::write(&colorscad, "#!/bin/sh\n").unwrap();

    let paths = PathConfig {
        openscad: PathBuf::from("/this/path/does/not/exist/openscad"),
        colorscad: Some(colorscad),
        source,
    };
    let statuses = DependencyChecker::new().check_all(&paths);

    assert_eq!(statuses[0].status, ToolStatus::Missing);
    assert_eq!(statuses[1].status, ToolStatus::Available);
    assert_eq!(statuses[2].status, ToolStatus::Available);
}

#[test]
fn test_json_output_is_parseable() {
    let dir = TempDir::new().unwrap();
    let paths = PathConfig {
        openscad: PathBuf::from("/this/path/does/not/exist/openscad"),
        colorscad: None,
        source: dir.path().join("missing.scad"),
    };
    let statuses = DependencyChecker::new().check_all(&paths);
    let output = DoctorFormatter::with_format(OutputFormat::Json).format_results(&statuses);

    let json: serde_json::Value = serde_json::from_str(&output).expect("valid JSON");
    assert_eq!(json["failed"], 2);
    assert_eq!(json["status"], "missing_dependencies");
    assert_eq!(json["dependencies"][1]["status"], "not_configured");
}
