//! Build-time profile analysis
//!
//! Runs a profiled `bazel build` and summarizes the resulting trace JSON:
//! total wall time, per-phase times, action counts by category, action
//! cache performance, and the slowest targets.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info};

use crate::constants::profile;
use crate::error::AnalyzerError;
use crate::extractor::BazelRunner;

/// Summary distilled from one Bazel `--profile` trace.
#[derive(Debug, Clone, Default)]
pub struct BuildProfileSummary {
    pub profile_file: PathBuf,
    pub total_build_time_ms: Option<f64>,
    /// Accumulated duration (ms) per build phase.
    pub phase_times_ms: BTreeMap<String, f64>,
    /// Trace event counts per category.
    pub action_counts: BTreeMap<String, u64>,
    pub total_actions: u64,
    pub cache_hits: Option<u64>,
    pub cache_misses: Option<u64>,
    /// The slowest targets, by accumulated duration (ms), descending.
    pub top_targets: Vec<(String, f64)>,
}

impl BuildProfileSummary {
    pub fn cache_hit_rate_percent(&self) -> Option<f64> {
        let hits = self.cache_hits? as f64;
        let total = hits + self.cache_misses? as f64;
        if total > 0.0 {
            Some(hits / total * 100.0)
        } else {
            None
        }
    }
}

pub struct BuildTimeAnalyzer<'r> {
    runner: &'r BazelRunner,
}

impl<'r> BuildTimeAnalyzer<'r> {
    pub fn new(runner: &'r BazelRunner) -> Self {
        Self { runner }
    }

    /// Build `target` with profiling enabled and return the profile path.
    ///
    /// Any old profile file is removed first so a stale trace can never
    /// be mistaken for this build's output.
    pub fn create_profile(&self, target: &str) -> Result<PathBuf, AnalyzerError> {
        let profile_path = self.runner.workspace().join(profile::PROFILE_FILE_NAME);
        if profile_path.exists() {
            std::fs::remove_file(&profile_path)?;
        }

        let profile_flag = format!("--profile={}", profile_path.display());
        let mut args = vec!["build", target, profile_flag.as_str()];
        args.extend_from_slice(profile::BUILD_FLAGS);

        info!(target, "running profiled build");
        self.runner.run(&args)?;

        if !profile_path.exists() {
            return Err(AnalyzerError::InvalidProfile {
                path: profile_path,
                message: "profiled build produced no trace file".to_string(),
            });
        }
        Ok(profile_path)
    }

    /// Parse a trace file into a [`BuildProfileSummary`].
    pub fn analyze_profile(&self, path: &Path) -> Result<BuildProfileSummary, AnalyzerError> {
        let content = std::fs::read_to_string(path)?;
        let data: Value =
            serde_json::from_str(&content).map_err(|e| AnalyzerError::InvalidProfile {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let mut summary = BuildProfileSummary {
            profile_file: path.to_path_buf(),
            ..Default::default()
        };

        let events = data
            .get("traceEvents")
            .and_then(Value::as_array)
            .ok_or_else(|| AnalyzerError::InvalidProfile {
                path: path.to_path_buf(),
                message: "no traceEvents array".to_string(),
            })?;
        debug!(events = events.len(), "parsing trace events");

        let mut target_times: BTreeMap<String, f64> = BTreeMap::new();

        for event in events {
            if let (Some(name), Some(duration)) = (
                event.get("name").and_then(Value::as_str),
                event.get("dur").and_then(Value::as_f64),
            ) {
                if name.contains("phase") {
                    *summary.phase_times_ms.entry(name.to_string()).or_default() += duration;
                }
            }

            if let Some(category) = event.get("cat").and_then(Value::as_str) {
                *summary.action_counts.entry(category.to_string()).or_default() += 1;
                summary.total_actions += 1;
            }

            if let Some(target) = event
                .get("args")
                .and_then(|args| args.get("target"))
                .and_then(Value::as_str)
            {
                if let Some(duration) = event.get("dur").and_then(Value::as_f64) {
                    *target_times.entry(target.to_string()).or_default() += duration;
                }
            }
        }

        // The last event's timestamp approximates total wall time.
        summary.total_build_time_ms = events
            .last()
            .and_then(|event| event.get("ts"))
            .and_then(Value::as_f64);

        if let Some(cache) = data.get("otherData").and_then(|d| d.get("action_cache")) {
            summary.cache_hits = cache.get("hits").and_then(Value::as_u64);
            summary.cache_misses = cache.get("misses").and_then(Value::as_u64);
        }

        let mut top: Vec<(String, f64)> = target_times.into_iter().collect();
        top.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        top.truncate(profile::TOP_TARGET_COUNT);
        summary.top_targets = top;

        Ok(summary)
    }
}

/// Render a millisecond duration the way humans read build logs.
pub fn format_duration_ms(ms: f64) -> String {
    let seconds = ms / 1000.0;
    if seconds >= 60.0 {
        format!("{}m {:.1}s", (seconds / 60.0) as u64, seconds % 60.0)
    } else if seconds >= 1.0 {
        format!("{seconds:.1}s")
    } else {
        format!("{ms:.0}ms")
    }
}
