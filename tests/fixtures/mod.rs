//! Shared test fixtures: fake compilers, configs and plans.
#![allow(dead_code)] // Not every test binary uses every fixture

use keyplay::catalog::Catalog;
use keyplay::render::{CommandBuilder, JobPlanner, Plan, PlanOptions, Toolchain};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Path of the compiled `keyplay` binary.
pub fn keyplay_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_keyplay"))
}

/// Compiler that writes its `-o` file and appends its arguments to `calls.log`.
pub const WRITES_OUTPUT: &str = r#"
printf '%s\n' "$*" >> "$(dirname "$0")/calls.log"
printf 'solid keycap\nendsolid keycap\n' > "$2"
"#;

/// Compiler that fails on any output file named `B*`, writing the rest.
pub const FAILS_ON_B: &str = r#"
printf '%s\n' "$*" >> "$(dirname "$0")/calls.log"
case "$(basename "$2")" in
  B*) echo "ERROR: Parser error in file keycap_playground.scad, line 42" >&2; exit 1 ;;
esac
printf 'solid keycap\n' > "$2"
"#;

/// Compiler that writes part of its output and then hangs.
pub const HANGS: &str = r#"
printf '%s\n' "$*" >> "$(dirname "$0")/calls.log"
printf 'solid partial' > "$2"
exec sleep 30
"#;

/// Compiler that hangs on any output file named `A*`, writing the rest.
pub const HANGS_ON_A: &str = r#"
printf '%s\n' "$*" >> "$(dirname "$0")/calls.log"
case "$(basename "$2")" in
  A*) exec sleep 30 ;;
esac
printf 'solid keycap\n' > "$2"
"#;

/// Wrapper that hands the render to a background helper and waits for it.
pub const BACKGROUND_WRITER: &str = r#"
printf '%s\n' "$*" >> "$(dirname "$0")/calls.log"
( sleep 2; printf 'solid late\n' > "$2" ) &
wait
"#;

/// Compiler that writes part of its output, then dies as if interrupted.
pub const INTERRUPTED: &str = r#"
printf '%s\n' "$*" >> "$(dirname "$0")/calls.log"
printf 'solid partial' > "$2"
sleep 0.3
exit 130
"#;

/// Compiler that exits 0 without writing anything.
pub const WRITES_NOTHING: &str = r#"
printf '%s\n' "$*" >> "$(dirname "$0")/calls.log"
exit 0
"#;

/// Workspace holding a fake compiler, a source file and an output directory.
pub struct Workspace {
    /// Keeps the directory alive for the test
    pub dir: TempDir,
    /// Fake compiler script
    pub compiler: PathBuf,
    /// Fake `.scad` source
    pub source: PathBuf,
    /// Output directory (not created)
    pub out_dir: PathBuf,
}

impl Workspace {
    /// Creates a workspace whose compiler runs `body` under `/bin/sh`.
    #[cfg(unix)]
    pub fn new(body: &str) -> Self {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().expect("Failed to create temp dir");
        let compiler = dir.path().join("fake-openscad");
        fs::write(&compiler, format!("#!/bin/sh\n{body}")).expect("Failed to write compiler");
        fs::set_permissions(&compiler, fs::Permissions::from_mode(0o755))
            .expect("Failed to chmod compiler");

        let source = dir.path().join("keycap_playground.scad");
        fs::write(&source, "// keycap playground\n").expect("Failed to write source");

        let out_dir = dir.path().join("out");
        Self {
            dir,
            compiler,
            source,
            out_dir,
        }
    }

    /// Toolchain pointing at the fake compiler.
    pub fn toolchain(&self) -> Toolchain {
        Toolchain {
            openscad: self.compiler.clone(),
            colorscad: None,
            source: self.source.clone(),
            working_dir: self.dir.path().to_path_buf(),
        }
    }

    /// Plan options writing into the workspace's output directory.
    pub fn options(&self) -> PlanOptions {
        PlanOptions {
            out_dir: self.out_dir.clone(),
            ..PlanOptions::default()
        }
    }

    /// Plans `names` against the built-in catalog.
    pub fn plan(&self, names: &[&str], options: &PlanOptions) -> Plan {
        let names: Vec<String> = names.iter().map(ToString::to_string).collect();
        JobPlanner::new(Catalog::builtin(), CommandBuilder::new(self.toolchain()))
            .plan(&names, options)
    }

    /// Number of times the fake compiler has been run.
    pub fn invocations(&self) -> usize {
        fs::read_to_string(self.dir.path().join("calls.log"))
            .map(|log| log.lines().count())
            .unwrap_or(0)
    }

    /// Writes a config file using the fake compiler and returns its path.
    pub fn write_config(&self) -> PathBuf {
        let path = self.dir.path().join("config.toml");
        let config = format!(
            "[paths]\nopenscad = {:?}\nsource = {:?}\n\n[build]\noutput_dir = {:?}\nmax_processes = 2\ntimeout_secs = 30\n",
            self.compiler.display().to_string(),
            self.source.display().to_string(),
            self.out_dir.display().to_string(),
        );
        fs::write(&path, config).expect("Failed to write config");
        path
    }

    /// Path of an output file.
    pub fn output(&self, file: &str) -> PathBuf {
        self.out_dir.join(file)
    }
}

/// Writes a config file with the given body into `dir`.
pub fn write_config_file(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("config.toml");
    fs::write(&path, body).expect("Failed to write config");
    path
}
