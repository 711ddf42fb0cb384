//! Environment checks for the OpenSCAD toolchain.

pub mod checker;
pub mod formatter;

pub use checker::{DependencyChecker, DependencyStatus, ToolStatus, COLORSCAD, OPENSCAD, SOURCE};
pub use formatter::{DoctorFormatter, OutputFormat, Platform};
