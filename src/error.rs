use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum AnalyzerError {
    #[error("'{path}' is not a valid Bazel workspace")]
    #[diagnostic(
        code(bazel_deps_analyzer::invalid_workspace),
        help("The workspace root must contain WORKSPACE, WORKSPACE.bazel, or MODULE.bazel")
    )]
    InvalidWorkspace { path: PathBuf },

    #[error("Configuration error: {message}")]
    #[diagnostic(
        code(bazel_deps_analyzer::config_error),
        help("Check your command arguments")
    )]
    ConfigurationError { message: String },

    #[error("Bazel environment validation failed: {message}")]
    #[diagnostic(
        code(bazel_deps_analyzer::bazel_unavailable),
        help("Check that the Bazel binary exists and `bazel info workspace` succeeds")
    )]
    BazelUnavailable { message: String },

    #[error("Command `{command}` failed with exit code {code}")]
    #[diagnostic(code(bazel_deps_analyzer::command_failed))]
    CommandFailed {
        command: String,
        code: i32,
        output: String,
    },

    #[error("Command `{command}` timed out after {seconds}s")]
    #[diagnostic(
        code(bazel_deps_analyzer::command_timeout),
        help("Large workspaces may need a longer per-query timeout")
    )]
    CommandTimeout { command: String, seconds: u64 },

    #[error("Workspace extraction failed: {message}")]
    #[diagnostic(
        code(bazel_deps_analyzer::extraction_failed),
        help("All query strategies were exhausted; run with -v for the underlying failures")
    )]
    ExtractionFailed { message: String },

    #[error("Invalid build profile '{path}': {message}")]
    #[diagnostic(
        code(bazel_deps_analyzer::invalid_profile),
        help("The profile must be the trace JSON written by `bazel build --profile`")
    )]
    InvalidProfile { path: PathBuf, message: String },

    #[error("IO error")]
    #[diagnostic(
        code(bazel_deps_analyzer::io_error),
        help("Check file permissions and disk space")
    )]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error")]
    #[diagnostic(
        code(bazel_deps_analyzer::json_error),
        help("This is likely an internal error - please report it")
    )]
    Json(#[from] serde_json::Error),

    #[error("String formatting error")]
    #[diagnostic(
        code(bazel_deps_analyzer::fmt_error),
        help("This is likely an internal error - please report it")
    )]
    Fmt(#[from] std::fmt::Error),
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[test]
    fn test_invalid_workspace_display() {
        let error = AnalyzerError::InvalidWorkspace {
            path: PathBuf::from("/tmp/not-a-workspace"),
        };

        assert_eq!(
            error.to_string(),
            "'/tmp/not-a-workspace' is not a valid Bazel workspace"
        );
    }

    #[test]
    fn test_command_failed_display() {
        let error = AnalyzerError::CommandFailed {
            command: "bazel query //...".to_string(),
            code: 7,
            output: "ERROR: no such package".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "Command `bazel query //...` failed with exit code 7"
        );
    }

    #[test]
    fn test_command_timeout_display() {
        let error = AnalyzerError::CommandTimeout {
            command: "bazel query //...".to_string(),
            seconds: 30,
        };

        assert_eq!(
            error.to_string(),
            "Command `bazel query //...` timed out after 30s"
        );
    }

    #[test]
    fn test_error_codes() {
        use miette::Diagnostic;

        let error = AnalyzerError::InvalidWorkspace {
            path: PathBuf::from("x"),
        };
        assert!(error.code().is_some());
        assert!(error.help().is_some());
    }

    #[test]
    fn test_error_conversion_from_io() {
        let io_err = io::Error::other("some io error");
        let err: AnalyzerError = io_err.into();

        match err {
            AnalyzerError::Io(_) => {}
            _ => panic!("Expected Io variant"),
        }
    }

    #[test]
    fn test_error_conversion_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err: AnalyzerError = json_err.into();

        match err {
            AnalyzerError::Json(_) => {}
            _ => panic!("Expected Json variant"),
        }
    }
}
