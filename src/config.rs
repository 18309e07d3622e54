//! Run configuration
//!
//! One [`AnalysisConfig`] is built from the CLI at program entry,
//! validated once, and passed by reference to the executor for the run.

use std::path::PathBuf;
use std::time::Duration;

use crate::constants::bazel;
use crate::error::AnalyzerError;
use crate::reports::ReportFormat;

/// Which analysis this run performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalysisMode {
    /// Cycle detection; the default when no mode flag is given.
    #[default]
    Cycles,
    Unused,
    BuildTime,
}

/// Generic builder trait for configuration objects
pub trait ConfigBuilder: Sized {
    type Config;

    /// Build the configuration, returning an error if validation fails
    fn build(self) -> Result<Self::Config, AnalyzerError>;
}

#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub workspace: PathBuf,
    pub bazel_path: PathBuf,
    pub mode: AnalysisMode,
    pub format: ReportFormat,
    pub output: Option<PathBuf>,
    pub include_tests: bool,
    pub query_timeout: Duration,
}

impl AnalysisConfig {
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::default()
    }
}

#[derive(Default)]
pub struct AnalysisConfigBuilder {
    workspace: Option<PathBuf>,
    bazel_path: Option<PathBuf>,
    mode: AnalysisMode,
    format: ReportFormat,
    output: Option<PathBuf>,
    include_tests: bool,
    query_timeout: Option<Duration>,
}

impl AnalysisConfigBuilder {
    pub fn with_workspace(mut self, workspace: impl Into<PathBuf>) -> Self {
        self.workspace = Some(workspace.into());
        self
    }

    pub fn with_bazel_path(mut self, bazel_path: impl Into<PathBuf>) -> Self {
        self.bazel_path = Some(bazel_path.into());
        self
    }

    pub fn with_mode(mut self, mode: AnalysisMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_format(mut self, format: ReportFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_output(mut self, output: Option<PathBuf>) -> Self {
        self.output = output;
        self
    }

    pub fn with_include_tests(mut self, include_tests: bool) -> Self {
        self.include_tests = include_tests;
        self
    }

    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = Some(timeout);
        self
    }
}

impl ConfigBuilder for AnalysisConfigBuilder {
    type Config = AnalysisConfig;

    /// Validate that the workspace exists and carries a Bazel marker
    /// file, then freeze the configuration.
    fn build(self) -> Result<AnalysisConfig, AnalyzerError> {
        let workspace = self.workspace.ok_or_else(|| AnalyzerError::ConfigurationError {
            message: "Missing required field: workspace".to_string(),
        })?;

        if !workspace.is_dir() {
            return Err(AnalyzerError::InvalidWorkspace { path: workspace });
        }
        let has_marker = bazel::WORKSPACE_MARKERS
            .iter()
            .any(|marker| workspace.join(marker).is_file());
        if !has_marker {
            return Err(AnalyzerError::InvalidWorkspace { path: workspace });
        }

        Ok(AnalysisConfig {
            workspace,
            bazel_path: self
                .bazel_path
                .unwrap_or_else(|| PathBuf::from(bazel::DEFAULT_BINARY)),
            mode: self.mode,
            format: self.format,
            output: self.output,
            include_tests: self.include_tests,
            query_timeout: self.query_timeout.unwrap_or(bazel::QUERY_TIMEOUT),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn bazel_workspace(marker: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(marker), "").unwrap();
        dir
    }

    #[test]
    fn test_build_with_workspace_marker() {
        for marker in bazel::WORKSPACE_MARKERS {
            let dir = bazel_workspace(marker);
            let config = AnalysisConfig::builder()
                .with_workspace(dir.path())
                .build()
                .unwrap();

            assert_eq!(config.workspace, dir.path());
            assert_eq!(config.bazel_path, PathBuf::from("bazel"));
            assert_eq!(config.mode, AnalysisMode::Cycles);
        }
    }

    #[test]
    fn test_missing_workspace_is_configuration_error() {
        let result = AnalysisConfig::builder().build();
        assert!(matches!(
            result,
            Err(AnalyzerError::ConfigurationError { .. })
        ));
    }

    #[test]
    fn test_directory_without_marker_is_invalid() {
        let dir = TempDir::new().unwrap();
        let result = AnalysisConfig::builder().with_workspace(dir.path()).build();
        assert!(matches!(result, Err(AnalyzerError::InvalidWorkspace { .. })));
    }

    #[test]
    fn test_nonexistent_workspace_is_invalid() {
        let result = AnalysisConfig::builder()
            .with_workspace("/nonexistent/workspace")
            .build();
        assert!(matches!(result, Err(AnalyzerError::InvalidWorkspace { .. })));
    }
}
