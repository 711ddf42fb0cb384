//! Translation of a keycap spec into an OpenSCAD (or ColorSCAD) invocation.

use crate::config::PathConfig;
use crate::models::{KeycapSpec, RenderTarget};
use crate::resolver::ConfigurationError;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::Command;

/// External programs and the geometry source they compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    /// OpenSCAD executable
    pub openscad: PathBuf,
    /// ColorSCAD wrapper, when multi-material output is available
    pub colorscad: Option<PathBuf>,
    /// `.scad` file handed to the compiler
    pub source: PathBuf,
    /// Directory the compiler runs in
    pub working_dir: PathBuf,
}

impl Toolchain {
    /// Toolchain from configured paths, running in the current directory.
    pub fn from_paths(paths: &PathConfig) -> Self {
        Self {
            openscad: paths.openscad.clone(),
            colorscad: paths.colorscad.clone(),
            source: paths.source.clone(),
            working_dir: PathBuf::from("."),
        }
    }

    /// Returns true if multi-material output can be produced.
    pub fn supports_multimaterial(&self) -> bool {
        self.colorscad.is_some()
    }
}

impl Default for Toolchain {
    fn default() -> Self {
        Self::from_paths(&PathConfig::default())
    }
}

/// Everything needed to start one external process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvocationDescriptor {
    program: PathBuf,
    args: Vec<String>,
    working_dir: PathBuf,
    output: PathBuf,
}

impl InvocationDescriptor {
    /// Executable to run.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments in order.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Working directory.
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// File the process is expected to write.
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// A `std::process::Command` ready to spawn.
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).current_dir(&self.working_dir);
        cmd
    }

    /// Shell-quoted command line, for logs and dry runs.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.to_string_lossy().into_owned())
            .chain(self.args.iter().cloned())
            .map(|arg| shell_quote(&arg))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn shell_quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,+@%".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

/// Builds invocations for a fixed toolchain.
#[derive(Debug, Clone, Default)]
pub struct CommandBuilder {
    toolchain: Toolchain,
}

impl CommandBuilder {
    /// Creates a builder for `toolchain`.
    pub fn new(toolchain: Toolchain) -> Self {
        Self { toolchain }
    }

    /// The toolchain invocations are built for.
    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    /// Maps a spec and render target to an invocation writing `output`.
    ///
    /// The argument list depends only on the inputs: `-o`, one `-D` per
    /// definition in [`KeycapSpec::scad_definitions`] order, then the source.
    /// Multi-material targets wrap the same definitions in a ColorSCAD call.
    pub fn build(
        &self,
        spec: &KeycapSpec,
        target: RenderTarget,
        output: &Path,
    ) -> Result<InvocationDescriptor, ConfigurationError> {
        spec.require_target(target)?;

        let defines = spec
            .scad_definitions(target)
            .into_iter()
            .flat_map(|(name, value)| ["-D".to_string(), format!("{name}={}", value.to_scad())]);
        let output_arg = output.to_string_lossy().into_owned();
        let source_arg = self.toolchain.source.to_string_lossy().into_owned();

        let (program, args) = if target == RenderTarget::Multimaterial {
            let Some(colorscad) = &self.toolchain.colorscad else {
                return Err(ConfigurationError::UnsupportedTarget {
                    keycap: spec.name().to_string(),
                    target,
                    reason: "no ColorSCAD wrapper configured".to_string(),
                });
            };
            let mut args = vec![
                "-i".to_string(),
                source_arg,
                "-o".to_string(),
                output_arg,
                "-f".to_string(),
                "--".to_string(),
            ];
            args.extend(defines);
            (colorscad.clone(), args)
        } else {
            let mut args = vec!["-o".to_string(), output_arg];
            args.extend(defines);
            args.push(source_arg);
            (self.toolchain.openscad.clone(), args)
        };

        Ok(InvocationDescriptor {
            program,
            args,
            working_dir: self.toolchain.working_dir.clone(),
            output: output.to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn builder() -> CommandBuilder {
        CommandBuilder::new(Toolchain {
            openscad: PathBuf::from("openscad"),
            colorscad: Some(PathBuf::from("/opt/colorscad/colorscad.sh")),
            source: PathBuf::from("keycap_playground.scad"),
            working_dir: PathBuf::from("."),
        })
    }

    #[test]
    fn test_openscad_invocation_shape() {
        let spec = Catalog::builtin().resolve("A").unwrap();
        let inv = builder()
            .build(&spec, RenderTarget::Keycap, Path::new("out/A.stl"))
            .unwrap();

        assert_eq!(inv.program(), Path::new("openscad"));
        assert_eq!(inv.output(), Path::new("out/A.stl"));
        let args = inv.args();
        assert_eq!(&args[..2], ["-o", "out/A.stl"]);
        assert_eq!(args[2], "-D");
        assert_eq!(args[3], "RENDER=[\"keycap\", \"stem\"]");
        assert_eq!(args[5], "KEY_PROFILE=\"riskeycap\"");
        assert_eq!(args.last().unwrap(), "keycap_playground.scad");
        assert!(args.contains(&"LEGENDS=[\"A\"]".to_string()));
        assert!(args.contains(&"KEY_ROTATION=[0, 110.1, -90]".to_string()));
        assert!(args.contains(&"WALL_THICKNESS=1.0125".to_string()));
        assert!(args.contains(&"UNIFORM_WALL_THICKNESS=true".to_string()));
        assert!(args.contains(&"DISH_CORNER_FN=40".to_string()));
        assert!(args.contains(&"STEM_TYPE=\"box_cherry\"".to_string()));
    }

    #[test]
    fn test_build_is_deterministic() {
        let catalog = Catalog::builtin();
        let first = builder()
            .build(&catalog.resolve("F").unwrap(), RenderTarget::Keycap, Path::new("F.stl"))
            .unwrap();
        let second = builder()
            .build(&catalog.resolve("F").unwrap(), RenderTarget::Keycap, Path::new("F.stl"))
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(first.command_line(), second.command_line());
    }

    #[test]
    fn test_legends_target() {
        let spec = Catalog::builtin().resolve("Q").unwrap();
        let inv = builder()
            .build(&spec, RenderTarget::Legends, Path::new("Q_legends.stl"))
            .unwrap();
        assert!(inv.args().contains(&"RENDER=[\"legends\"]".to_string()));
        assert!(inv.args().contains(&"VISUALIZE_LEGENDS=false".to_string()));

        let blank = Catalog::builtin().resolve("1U_blank").unwrap();
        assert!(builder()
            .build(&blank, RenderTarget::Legends, Path::new("x.stl"))
            .is_err());
    }

    #[test]
    fn test_multimaterial_wraps_colorscad() {
        let spec = Catalog::builtin().resolve("A").unwrap();
        let inv = builder()
            .build(&spec, RenderTarget::Multimaterial, Path::new("A.3mf"))
            .unwrap();
        assert_eq!(inv.program(), Path::new("/opt/colorscad/colorscad.sh"));
        assert_eq!(
            &inv.args()[..6],
            ["-i", "keycap_playground.scad", "-o", "A.3mf", "-f", "--"]
        );
        assert!(inv
            .args()
            .contains(&"RENDER=[\"keycap\", \"stem\", \"legends\"]".to_string()));
    }

    #[test]
    fn test_multimaterial_without_colorscad_fails() {
        let spec = Catalog::builtin().resolve("A").unwrap();
        let result =
            CommandBuilder::default().build(&spec, RenderTarget::Multimaterial, Path::new("A.3mf"));
        assert!(matches!(
            result,
            Err(ConfigurationError::UnsupportedTarget { .. })
        ));
    }

    #[test]
    fn test_command_line_quoting() {
        let spec = Catalog::builtin().resolve("Quote").unwrap();
        let line = builder()
            .build(&spec, RenderTarget::Keycap, Path::new("Quote.stl"))
            .unwrap()
            .command_line();
        assert!(line.starts_with("openscad -o Quote.stl -D "));
        assert!(line.contains(r#"'LEGENDS=["'\''", "\""]'"#));
        assert!(line.ends_with(" keycap_playground.scad"));
    }
}
