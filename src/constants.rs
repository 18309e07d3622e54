//! Configuration constants for the analyzer
//!
//! This module contains all configurable constants used throughout the
//! application.

use std::time::Duration;

/// Bazel invocation configuration
pub mod bazel {
    use super::*;

    /// Default Bazel executable when `--bazel_path` is not given
    pub const DEFAULT_BINARY: &str = "bazel";

    /// Wall-clock timeout applied to every external Bazel invocation
    pub const QUERY_TIMEOUT: Duration = Duration::from_secs(30);

    /// Interval used when polling a running child process for completion
    pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

    /// Flags appended to every `bazel query` invocation
    pub const STANDARD_QUERY_FLAGS: &[&str] =
        &["--keep_going", "--incompatible_disallow_empty_glob=false"];

    /// Files that mark a directory as a Bazel workspace root
    pub const WORKSPACE_MARKERS: &[&str] = &["WORKSPACE", "WORKSPACE.bazel", "MODULE.bazel"];

    /// Retain `@`-prefixed external labels in dependency lists
    pub const KEEP_EXTERNAL_DEPS: bool = false;
}

/// Source analysis configuration
pub mod analysis {
    /// Extensions classifying a file as a C/C++/Objective-C source file
    pub const SOURCE_EXTENSIONS: &[&str] = &["c", "cc", "cpp", "cxx", "c++", "m", "mm"];

    /// Extensions classifying a file as a header file
    pub const HEADER_EXTENSIONS: &[&str] = &["h", "hh", "hpp", "hxx", "h++", "inc", "inl"];
}

/// Extraction concurrency configuration
pub mod concurrency {
    /// Worker pool size multiplier over hardware concurrency for the
    /// concurrent query fallback
    pub const WORKER_MULTIPLIER: usize = 4;
}

/// Output formatting configuration
pub mod output {
    /// Default output format when not specified
    pub const DEFAULT_FORMAT: &str = "console";
}

/// Build-time profiling configuration
pub mod profile {
    use super::*;

    /// File the profiled build writes its trace JSON to, relative to the
    /// workspace root
    pub const PROFILE_FILE_NAME: &str = "profile_detailed.json";

    /// Wall-clock ceiling for the profiled build itself; full builds run
    /// far longer than individual queries
    pub const BUILD_TIMEOUT: Duration = Duration::from_secs(3600);

    /// Flags appended to the profiled `bazel build`
    pub const BUILD_FLAGS: &[&str] = &[
        "--record_full_profiler_data",
        "--noshow_progress",
        "--noshow_loading_progress",
        "--color=no",
    ];

    /// How many of the slowest targets the profile report lists
    pub const TOP_TARGET_COUNT: usize = 10;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bazel_constants() {
        assert_eq!(bazel::QUERY_TIMEOUT, Duration::from_secs(30));
        assert_eq!(bazel::WORKSPACE_MARKERS.len(), 3);
        assert!(bazel::STANDARD_QUERY_FLAGS.contains(&"--keep_going"));
    }

    #[test]
    fn test_extension_sets_are_disjoint() {
        for ext in analysis::SOURCE_EXTENSIONS {
            assert!(!analysis::HEADER_EXTENSIONS.contains(ext));
        }
    }

    #[test]
    fn test_output_constants() {
        assert_eq!(output::DEFAULT_FORMAT, "console");
    }
}
