//! Workspace extraction
//!
//! Drives the external Bazel query tool to materialize every C/C++ target
//! with its rule kind, source files, header files, and declared deps.
//!
//! Three strategies are tried in order:
//!
//! 1. *Comprehensive*: one `kind("cc_.* rule", //...)` enumeration with
//!    `--output=label_kind`, then per-target detail queries.
//! 2. *Concurrent fallback*: the same detail queries batched across a
//!    worker pool sized to hardware concurrency x 4; within one target
//!    the three detail queries run in parallel.
//! 3. *Broad fallback*: enumerate `//...` and keep labels containing
//!    `cc_`.
//!
//! A failed detail query is soft: the target survives with whatever
//! detail succeeded. A failed enumeration promotes to the next strategy.

pub mod command;
pub mod parse;

use std::path::PathBuf;
use std::sync::Mutex;

use rayon::prelude::*;
use tracing::{debug, info, warn};

pub use command::BazelRunner;

use crate::catalog::{Target, TargetCatalog, TargetLabel};
use crate::constants::{analysis, concurrency};
use crate::error::AnalyzerError;
use crate::progress::ProgressReporter;

/// Lifecycle of one target inside the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    Queued,
    InFlight,
    Complete,
    /// A detail query failed; the target is kept with partial data.
    FailedSoft,
    /// The target could not be materialized at all and is dropped.
    FailedHard,
}

/// Counters over the per-target state machine, reported after extraction.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractionStats {
    pub complete: usize,
    pub failed_soft: usize,
    pub failed_hard: usize,
}

impl ExtractionStats {
    fn record(&mut self, state: FetchState) {
        match state {
            FetchState::Complete => self.complete += 1,
            FetchState::FailedSoft => self.failed_soft += 1,
            FetchState::FailedHard => self.failed_hard += 1,
            FetchState::Queued | FetchState::InFlight => {}
        }
    }
}

/// Detail gathered for one target by the three per-target queries.
struct TargetDetail {
    srcs: Vec<PathBuf>,
    hdrs: Vec<PathBuf>,
    deps: Vec<TargetLabel>,
    state: FetchState,
}

pub struct WorkspaceExtractor<'r> {
    runner: &'r BazelRunner,
    include_tests: bool,
}

impl<'r> WorkspaceExtractor<'r> {
    pub fn new(runner: &'r BazelRunner) -> Self {
        Self {
            runner,
            include_tests: false,
        }
    }

    pub fn with_include_tests(mut self, include_tests: bool) -> Self {
        self.include_tests = include_tests;
        self
    }

    /// Produce the target catalog, trying each query strategy in order.
    pub fn extract(
        &self,
        progress: Option<&ProgressReporter>,
    ) -> Result<(TargetCatalog, ExtractionStats), AnalyzerError> {
        self.runner.validate_environment()?;

        let (mut catalog, stats) = self
            .extract_comprehensive(progress)
            .or_else(|e| {
                warn!(error = %e, "comprehensive query failed, falling back to concurrent queries");
                self.extract_concurrent(progress)
            })
            .or_else(|e| {
                warn!(error = %e, "concurrent queries failed, falling back to broad enumeration");
                self.extract_broad(progress)
            })
            .map_err(|e| AnalyzerError::ExtractionFailed {
                message: e.to_string(),
            })?;

        if !self.include_tests {
            catalog.remove_test_targets();
        }

        info!(
            targets = catalog.len(),
            complete = stats.complete,
            failed_soft = stats.failed_soft,
            failed_hard = stats.failed_hard,
            "extraction finished"
        );

        Ok((catalog, stats))
    }

    /// Strategy 1: one label_kind enumeration, sequential detail queries.
    fn extract_comprehensive(
        &self,
        progress: Option<&ProgressReporter>,
    ) -> Result<(TargetCatalog, ExtractionStats), AnalyzerError> {
        let output = self.runner.query(r#"kind("cc_.* rule", //...)"#, "label_kind")?;

        let enumerated: Vec<(String, TargetLabel)> = parse::split_lines(&output)
            .into_iter()
            .filter_map(parse::parse_label_kind_line)
            .collect();

        info!(count = enumerated.len(), "comprehensive query enumerated targets");
        if let Some(p) = progress {
            p.start_detail_queries(enumerated.len());
        }

        let mut catalog = TargetCatalog::new();
        let mut stats = ExtractionStats::default();

        for (rule_kind, label) in enumerated {
            let detail = self.fetch_detail(&label);
            stats.record(detail.state);
            if let Some(p) = progress {
                p.detail_query_done(label.as_str());
            }
            if detail.state == FetchState::FailedHard {
                continue;
            }
            catalog.insert(self.assemble(label, rule_kind, detail)?);
        }

        if let Some(p) = progress {
            p.finish_detail_queries();
        }

        Ok((catalog, stats))
    }

    /// Strategy 2: label enumeration, detail queries fanned out across a
    /// worker pool.
    fn extract_concurrent(
        &self,
        progress: Option<&ProgressReporter>,
    ) -> Result<(TargetCatalog, ExtractionStats), AnalyzerError> {
        let output = self.runner.query(r#"kind("cc_.* rule", //...)"#, "label")?;
        let labels = parse::extract_labels(&output);

        info!(count = labels.len(), "concurrent fallback enumerated targets");
        self.fetch_all_concurrent(labels, progress)
    }

    /// Strategy 3: enumerate everything, keep labels containing `cc_`.
    fn extract_broad(
        &self,
        progress: Option<&ProgressReporter>,
    ) -> Result<(TargetCatalog, ExtractionStats), AnalyzerError> {
        let output = self.runner.query("//...", "label")?;
        let labels: Vec<TargetLabel> = parse::extract_labels(&output)
            .into_iter()
            .filter(|label| label.as_str().contains("cc_"))
            .collect();

        info!(count = labels.len(), "broad fallback kept cc_ targets");
        self.fetch_all_concurrent(labels, progress)
    }

    fn fetch_all_concurrent(
        &self,
        labels: Vec<TargetLabel>,
        progress: Option<&ProgressReporter>,
    ) -> Result<(TargetCatalog, ExtractionStats), AnalyzerError> {
        if let Some(p) = progress {
            p.start_detail_queries(labels.len());
        }

        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            * concurrency::WORKER_MULTIPLIER;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| AnalyzerError::ExtractionFailed {
                message: format!("failed to build worker pool: {e}"),
            })?;

        let catalog = Mutex::new(TargetCatalog::new());
        let stats = Mutex::new(ExtractionStats::default());
        let first_error: Mutex<Option<AnalyzerError>> = Mutex::new(None);

        pool.install(|| {
            labels.into_par_iter().for_each(|label| {
                let rule_kind = self.fetch_rule_kind(&label);
                let detail = self.fetch_detail_parallel(&label);

                stats.lock().expect("stats mutex poisoned").record(detail.state);
                if let Some(p) = progress {
                    p.detail_query_done(label.as_str());
                }
                if detail.state == FetchState::FailedHard {
                    return;
                }

                match self.assemble(label, rule_kind, detail) {
                    Ok(target) => catalog.lock().expect("catalog mutex poisoned").insert(target),
                    Err(e) => {
                        let mut slot = first_error.lock().expect("error mutex poisoned");
                        if slot.is_none() {
                            *slot = Some(e);
                        }
                    }
                }
            });
        });

        if let Some(p) = progress {
            p.finish_detail_queries();
        }
        if let Some(e) = first_error.into_inner().expect("error mutex poisoned") {
            return Err(e);
        }

        Ok((
            catalog.into_inner().expect("catalog mutex poisoned"),
            stats.into_inner().expect("stats mutex poisoned"),
        ))
    }

    fn fetch_rule_kind(&self, label: &TargetLabel) -> String {
        match self
            .runner
            .query(&format!("kind(rule, {label})"), "label_kind")
        {
            Ok(output) => parse::extract_rule_kind(&output),
            Err(e) => {
                warn!(target = %label, error = %e, "rule kind query failed");
                "unknown".to_string()
            }
        }
    }

    /// The three detail queries, sequentially.
    fn fetch_detail(&self, label: &TargetLabel) -> TargetDetail {
        let srcs = self.query_file_labels(label, "srcs");
        let hdrs = self.query_file_labels(label, "hdrs");
        let deps = self.query_deps(label);
        self.collect_detail(label, srcs, hdrs, deps)
    }

    /// The three detail queries for one target, run in parallel.
    fn fetch_detail_parallel(&self, label: &TargetLabel) -> TargetDetail {
        let (srcs, (hdrs, deps)) = rayon::join(
            || self.query_file_labels(label, "srcs"),
            || {
                rayon::join(
                    || self.query_file_labels(label, "hdrs"),
                    || self.query_deps(label),
                )
            },
        );
        self.collect_detail(label, srcs, hdrs, deps)
    }

    /// Reassemble a target from its three detail results; any individual
    /// failure downgrades the target to a soft failure.
    fn collect_detail(
        &self,
        label: &TargetLabel,
        srcs: Result<Vec<PathBuf>, AnalyzerError>,
        hdrs: Result<Vec<PathBuf>, AnalyzerError>,
        deps: Result<Vec<TargetLabel>, AnalyzerError>,
    ) -> TargetDetail {
        let mut state = FetchState::Complete;
        let all_failed = srcs.is_err() && hdrs.is_err() && deps.is_err();

        let mut files = soften(srcs, "srcs", label, &mut state);
        files.extend(soften(hdrs, "hdrs", label, &mut state));
        let deps = soften(deps, "deps", label, &mut state);

        // A target with no detail at all is dropped rather than recorded
        // as an empty shell.
        if all_failed {
            state = FetchState::FailedHard;
        }

        // Bazel lets headers appear under srcs and vice versa; classify
        // by extension so the analyzer sees a consistent split. Files
        // with other extensions carry no include information and are
        // dropped.
        let srcs = files.iter().filter(|p| is_source_file(p)).cloned().collect();
        let hdrs = files.iter().filter(|p| is_header_file(p)).cloned().collect();

        TargetDetail {
            srcs,
            hdrs,
            deps,
            state,
        }
    }

    fn query_file_labels(
        &self,
        label: &TargetLabel,
        attribute: &str,
    ) -> Result<Vec<PathBuf>, AnalyzerError> {
        let output = self
            .runner
            .query(&format!("labels({attribute}, {label})"), "label")?;
        Ok(parse::extract_labels(&output)
            .into_iter()
            .filter(|file| !file.is_external())
            .map(|file| file.to_source_path(self.runner.workspace()))
            .collect())
    }

    fn query_deps(&self, label: &TargetLabel) -> Result<Vec<TargetLabel>, AnalyzerError> {
        let output = self
            .runner
            .query(&format!("kind(rule, deps({label}))"), "label")?;
        Ok(parse::extract_dependencies(&output, label))
    }

    fn assemble(
        &self,
        label: TargetLabel,
        rule_kind: String,
        detail: TargetDetail,
    ) -> Result<Target, AnalyzerError> {
        debug!(
            target = %label,
            kind = %rule_kind,
            srcs = detail.srcs.len(),
            hdrs = detail.hdrs.len(),
            deps = detail.deps.len(),
            "materialized target"
        );
        Target::builder()
            .with_label(label)
            .with_rule_kind(rule_kind)
            .with_srcs(detail.srcs)
            .with_hdrs(detail.hdrs)
            .with_deps(detail.deps)
            .build()
    }
}

fn soften<T>(
    result: Result<Vec<T>, AnalyzerError>,
    what: &str,
    label: &TargetLabel,
    state: &mut FetchState,
) -> Vec<T> {
    match result {
        Ok(values) => values,
        Err(e) => {
            warn!(target = %label, query = what, error = %e, "detail query failed");
            *state = FetchState::FailedSoft;
            Vec::new()
        }
    }
}

fn extension_of(path: &std::path::Path) -> Option<String> {
    path.extension().map(|e| e.to_string_lossy().to_string())
}

pub fn is_source_file(path: &std::path::Path) -> bool {
    extension_of(path)
        .map(|ext| analysis::SOURCE_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

pub fn is_header_file(path: &std::path::Path) -> bool {
    extension_of(path)
        .map(|ext| analysis::HEADER_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn test_file_classification() {
        assert!(is_source_file(Path::new("a/b.cc")));
        assert!(is_source_file(Path::new("a/b.c++")));
        assert!(is_source_file(Path::new("view.mm")));
        assert!(!is_source_file(Path::new("a/b.h")));

        assert!(is_header_file(Path::new("a/b.h")));
        assert!(is_header_file(Path::new("tmpl.inl")));
        assert!(!is_header_file(Path::new("a/b.cc")));
        assert!(!is_header_file(Path::new("BUILD")));
    }

    #[test]
    fn test_stats_recording() {
        let mut stats = ExtractionStats::default();
        stats.record(FetchState::Complete);
        stats.record(FetchState::Complete);
        stats.record(FetchState::FailedSoft);
        stats.record(FetchState::FailedHard);
        stats.record(FetchState::Queued);

        assert_eq!(stats.complete, 2);
        assert_eq!(stats.failed_soft, 1);
        assert_eq!(stats.failed_hard, 1);
    }
}
