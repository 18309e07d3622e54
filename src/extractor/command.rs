//! External Bazel command execution
//!
//! [`BazelRunner`] is the one component that talks to the outside world.
//! Every invocation runs with the child's working directory set to the
//! workspace root (the process-wide directory is never touched), merges
//! stderr into stdout, and is bounded by a wall-clock timeout. On timeout
//! the child is killed and abandoned.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::constants::bazel;
use crate::error::AnalyzerError;

pub struct BazelRunner {
    bazel: PathBuf,
    workspace: PathBuf,
    timeout: Duration,
}

impl BazelRunner {
    pub fn new(bazel: impl Into<PathBuf>, workspace: impl Into<PathBuf>) -> Self {
        Self {
            bazel: bazel.into(),
            workspace: workspace.into(),
            timeout: bazel::QUERY_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    /// Check that the Bazel binary answers `--version` and recognizes the
    /// workspace.
    pub fn validate_environment(&self) -> Result<(), AnalyzerError> {
        let version = self
            .run(&["--version"])
            .map_err(|e| AnalyzerError::BazelUnavailable {
                message: e.to_string(),
            })?;
        debug!(version = version.trim(), "bazel version");

        let info = self
            .run(&["info", "workspace"])
            .map_err(|e| AnalyzerError::BazelUnavailable {
                message: e.to_string(),
            })?;
        debug!(workspace = info.trim(), "bazel workspace");

        Ok(())
    }

    /// Run `bazel query <expr> --output=<output>` with the standard query
    /// flags appended.
    pub fn query(&self, expr: &str, output: &str) -> Result<String, AnalyzerError> {
        let output_flag = format!("--output={output}");
        let mut args = vec!["query", expr, output_flag.as_str()];
        args.extend_from_slice(bazel::STANDARD_QUERY_FLAGS);
        self.run(&args)
    }

    /// Run an arbitrary Bazel invocation, returning stdout with stderr
    /// appended.
    pub fn run(&self, args: &[&str]) -> Result<String, AnalyzerError> {
        let command_line = format!("{} {}", self.bazel.display(), args.join(" "));
        debug!(command = %command_line, "executing bazel command");

        let mut child = Command::new(&self.bazel)
            .args(args)
            .current_dir(&self.workspace)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| AnalyzerError::BazelUnavailable {
                message: format!("failed to launch `{command_line}`: {e}"),
            })?;

        // Drain the pipes on threads so a chatty child can never fill a
        // pipe buffer and deadlock against our wait loop.
        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();
        let stdout_reader = std::thread::spawn(move || drain(stdout_pipe));
        let stderr_reader = std::thread::spawn(move || drain(stderr_pipe));

        let started = Instant::now();
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {}
                Err(e) => return Err(AnalyzerError::Io(e)),
            }
            if started.elapsed() >= self.timeout {
                warn!(command = %command_line, "command timed out, killing child");
                let _ = child.kill();
                let _ = child.wait();
                return Err(AnalyzerError::CommandTimeout {
                    command: command_line,
                    seconds: self.timeout.as_secs(),
                });
            }
            std::thread::sleep(bazel::POLL_INTERVAL);
        };

        // stderr is merged after stdout; the parsing layer filters
        // Loading:/INFO: noise from either stream.
        let mut combined = stdout_reader.join().unwrap_or_default();
        combined.push_str(&stderr_reader.join().unwrap_or_default());

        if status.success() {
            Ok(combined)
        } else {
            Err(AnalyzerError::CommandFailed {
                command: command_line,
                code: status.code().unwrap_or(-1),
                output: combined,
            })
        }
    }
}

fn drain(pipe: Option<impl Read>) -> String {
    let mut buf = String::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_string(&mut buf);
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_captures_merged_output() {
        // Use /bin/sh as a stand-in binary; the runner does not care what
        // it launches.
        let runner = BazelRunner::new("/bin/sh", std::env::temp_dir());
        let output = runner
            .run(&["-c", "echo to-stdout; echo to-stderr 1>&2"])
            .unwrap();

        assert!(output.contains("to-stdout"));
        assert!(output.contains("to-stderr"));
    }

    #[test]
    fn test_run_reports_exit_code() {
        let runner = BazelRunner::new("/bin/sh", std::env::temp_dir());
        let err = runner.run(&["-c", "echo boom; exit 3"]).unwrap_err();

        match err {
            AnalyzerError::CommandFailed { code, output, .. } => {
                assert_eq!(code, 3);
                assert!(output.contains("boom"));
            }
            other => panic!("expected CommandFailed, got {other}"),
        }
    }

    #[test]
    fn test_run_times_out() {
        let runner =
            BazelRunner::new("/bin/sh", std::env::temp_dir()).with_timeout(Duration::from_millis(200));
        let err = runner.run(&["-c", "sleep 5"]).unwrap_err();

        match err {
            AnalyzerError::CommandTimeout { .. } => {}
            other => panic!("expected CommandTimeout, got {other}"),
        }
    }

    #[test]
    fn test_missing_binary_is_unavailable() {
        let runner = BazelRunner::new("/nonexistent/bazel", std::env::temp_dir());
        let err = runner.run(&["--version"]).unwrap_err();

        match err {
            AnalyzerError::BazelUnavailable { .. } => {}
            other => panic!("expected BazelUnavailable, got {other}"),
        }
    }
}
