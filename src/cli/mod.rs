//! CLI command handlers for keyplay.
//!
//! Each command is a clap `Args` struct with an `execute` method returning
//! [`CliResult`]; `main` maps errors to exit codes.

pub mod build;
pub mod common;
pub mod config;
pub mod doctor;
pub mod inspect;
pub mod list;

pub use build::BuildArgs;
pub use common::{CliError, CliResult, ExitCode};
pub use config::ConfigArgs;
pub use doctor::DoctorArgs;
pub use inspect::InspectArgs;
pub use list::ListArgs;
