//! keyplay - render parametric keycaps with OpenSCAD
//!
//! Resolves keycap parameters from layered profiles, turns them into
//! OpenSCAD invocations and runs them on a bounded worker pool.

use clap::{Parser, Subcommand};
use keyplay::cli::{BuildArgs, ConfigArgs, DoctorArgs, ExitCode, InspectArgs, ListArgs};
use keyplay::constants::APP_NAME;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// keyplay - render whole sets of keycaps with OpenSCAD
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this configuration file instead of the default one
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render keycaps
    Build(BuildArgs),
    /// List renderable keycaps
    List(ListArgs),
    /// Show the resolved parameters of a keycap
    Inspect(InspectArgs),
    /// Check that OpenSCAD and the keycap source are available
    Doctor(DoctorArgs),
    /// Show or change configuration
    Config(ConfigArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = cli.config.as_deref();
    let result = match &cli.command {
        Command::Build(args) => args.execute(config),
        Command::List(args) => args.execute(config),
        Command::Inspect(args) => args.execute(config),
        Command::Doctor(args) => args.execute(config),
        Command::Config(args) => args.execute(config),
    };

    match result {
        Ok(()) => ExitCode::Success.into(),
        Err(e) => {
            eprintln!("{APP_NAME}: {e}");
            e.code.into()
        }
    }
}
