use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::config::{AnalysisConfig, AnalysisMode, ConfigBuilder};
use crate::error::AnalyzerError;
use crate::reports::ReportFormat;

#[derive(Parser, Debug)]
#[command(
    name = "bazel-deps-analyzer",
    about = "Detect dependency cycles and unused dependencies in Bazel C/C++ workspaces",
    long_about = "bazel-deps-analyzer drives `bazel query` to materialize every C/C++ target in \
                  a workspace, builds the dependency graph, and reports dependency cycles or \
                  declared-but-unused dependencies with suggested fixes and confidence levels. \
                  Cycle detection runs by default when no analysis flag is given.",
    version
)]
pub struct Cli {
    /// Bazel workspace root (must contain WORKSPACE, WORKSPACE.bazel, or
    /// MODULE.bazel)
    #[arg(short, long, value_name = "PATH", env = "BAZEL_DEPS_WORKSPACE")]
    pub workspace: PathBuf,

    /// Path to the Bazel executable
    #[arg(
        short,
        long = "bazel_path",
        value_name = "PATH",
        default_value = "bazel",
        env = "BAZEL_DEPS_BAZEL_PATH"
    )]
    pub bazel_path: PathBuf,

    /// Run unused-dependency analysis instead of cycle detection
    #[arg(short, long)]
    pub unused: bool,

    /// Run build-time profile analysis instead of cycle detection
    #[arg(short = 't', long = "time")]
    pub time: bool,

    /// Report output file (stdout if not specified)
    #[arg(short, long, value_name = "FILE", env = "BAZEL_DEPS_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Output format: console, markdown (md), json, html
    #[arg(
        short,
        long,
        value_name = "FORMAT",
        default_value = crate::constants::output::DEFAULT_FORMAT,
        env = "BAZEL_DEPS_FORMAT"
    )]
    pub format: String,

    /// Increase log verbosity (repeatable)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Retain *_test targets in the analysis
    #[arg(long, env = "BAZEL_DEPS_INCLUDE_TESTS")]
    pub include_tests: bool,
}

impl Cli {
    /// Resolve the parsed flags into a validated run configuration.
    pub fn into_config(self) -> Result<AnalysisConfig, AnalyzerError> {
        let mode = match (self.unused, self.time) {
            (true, true) => {
                return Err(AnalyzerError::ConfigurationError {
                    message: "--unused and --time are mutually exclusive; pick one analysis"
                        .to_string(),
                })
            }
            (true, false) => AnalysisMode::Unused,
            (false, true) => AnalysisMode::BuildTime,
            (false, false) => AnalysisMode::Cycles,
        };

        AnalysisConfig::builder()
            .with_workspace(self.workspace)
            .with_bazel_path(self.bazel_path)
            .with_mode(mode)
            .with_format(ReportFormat::parse_or_warn(&self.format))
            .with_output(self.output)
            .with_include_tests(self.include_tests)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use clap::CommandFactory;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    fn workspace_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("WORKSPACE"), "").unwrap();
        dir
    }

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_default_mode_is_cycles() {
        let dir = workspace_dir();
        let cli = parse(&[
            "bazel-deps-analyzer",
            "-w",
            dir.path().to_str().unwrap(),
        ]);
        let config = cli.into_config().unwrap();
        assert_eq!(config.mode, AnalysisMode::Cycles);
        assert_eq!(config.format, ReportFormat::Console);
    }

    #[test]
    fn test_unused_flag_selects_unused_mode() {
        let dir = workspace_dir();
        let cli = parse(&[
            "bazel-deps-analyzer",
            "--workspace",
            dir.path().to_str().unwrap(),
            "--unused",
            "-f",
            "json",
        ]);
        let config = cli.into_config().unwrap();
        assert_eq!(config.mode, AnalysisMode::Unused);
        assert_eq!(config.format, ReportFormat::Json);
    }

    #[test]
    fn test_time_flag_selects_buildtime_mode() {
        let dir = workspace_dir();
        let cli = parse(&[
            "bazel-deps-analyzer",
            "-w",
            dir.path().to_str().unwrap(),
            "-t",
        ]);
        let config = cli.into_config().unwrap();
        assert_eq!(config.mode, AnalysisMode::BuildTime);
    }

    #[test]
    fn test_conflicting_modes_rejected() {
        let dir = workspace_dir();
        let cli = parse(&[
            "bazel-deps-analyzer",
            "-w",
            dir.path().to_str().unwrap(),
            "-u",
            "-t",
        ]);
        assert!(cli.into_config().is_err());
    }

    #[test]
    fn test_unknown_format_degrades_to_console() {
        let dir = workspace_dir();
        let cli = parse(&[
            "bazel-deps-analyzer",
            "-w",
            dir.path().to_str().unwrap(),
            "-f",
            "yaml",
        ]);
        let config = cli.into_config().unwrap();
        assert_eq!(config.format, ReportFormat::Console);
    }

    #[test]
    fn test_workspace_is_required() {
        assert!(Cli::try_parse_from(["bazel-deps-analyzer"]).is_err());
    }
}
