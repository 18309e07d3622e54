//! Target catalog types
//!
//! The catalog is the immutable output of workspace extraction: a mapping
//! from canonical labels to the targets they name. Everything downstream
//! (graph, source analyzer, engine) borrows it read-only.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::AnalyzerError;

/// Canonical, fully-qualified name of a Bazel target: `//pkg/path:name`.
///
/// Labels are the interned keys of the catalog and the node identity of
/// the dependency graph. Stored trimmed of surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TargetLabel(String);

impl TargetLabel {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True for labels in external workspaces (`@repo//...`).
    pub fn is_external(&self) -> bool {
        self.0.contains('@')
    }

    /// True only for labels that *begin* with `@` (an external workspace
    /// reference in a dependency list).
    pub fn starts_with_external(&self) -> bool {
        self.0.starts_with('@')
    }

    /// The package part of the label, without the leading `//`.
    ///
    /// `//pkg/path:name` -> `pkg/path`; bare `//pkg/path` -> `pkg/path`.
    pub fn package(&self) -> &str {
        let stripped = self.0.strip_prefix("//").unwrap_or(&self.0);
        match stripped.rfind(':') {
            Some(colon) => &stripped[..colon],
            None => stripped,
        }
    }

    /// The name part of the label.
    ///
    /// `//pkg:name` -> `name`; bare `//pkg/path` -> `path` (last segment).
    pub fn target_name(&self) -> &str {
        let stripped = self.0.strip_prefix("//").unwrap_or(&self.0);
        match stripped.rfind(':') {
            Some(colon) => &stripped[colon + 1..],
            None => stripped.rsplit('/').next().unwrap_or(stripped),
        }
    }

    /// Map a file label to its location on disk under `workspace_root`.
    ///
    /// `//pkg:sub/file.cc` -> `<root>/pkg/sub/file.cc`; bare `//pkg` ->
    /// `<root>/pkg/<last-segment>`; an empty package maps to the root
    /// itself.
    pub fn to_source_path(&self, workspace_root: &Path) -> PathBuf {
        let mut path = workspace_root.to_path_buf();
        let package = self.package();
        if !package.is_empty() {
            path.push(package);
        }
        path.push(self.target_name());
        path
    }
}

impl fmt::Display for TargetLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TargetLabel {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A single C/C++ build target materialized from `bazel query`.
///
/// Immutable after construction; lives for the duration of the run.
#[derive(Debug, Clone)]
pub struct Target {
    label: TargetLabel,
    rule_kind: String,
    srcs: Vec<PathBuf>,
    hdrs: Vec<PathBuf>,
    deps: Vec<TargetLabel>,
}

impl Target {
    pub fn builder() -> TargetBuilder {
        TargetBuilder::default()
    }

    pub fn label(&self) -> &TargetLabel {
        &self.label
    }

    pub fn rule_kind(&self) -> &str {
        &self.rule_kind
    }

    pub fn srcs(&self) -> &[PathBuf] {
        &self.srcs
    }

    pub fn hdrs(&self) -> &[PathBuf] {
        &self.hdrs
    }

    /// Declared dependencies, in declaration order, de-duplicated.
    pub fn deps(&self) -> &[TargetLabel] {
        &self.deps
    }

    /// True for `cc_test` and friends, or targets following the
    /// `_test`/`test_` naming convention.
    pub fn is_test(&self) -> bool {
        self.rule_kind.contains("test")
            || self.label.target_name().contains("_test")
            || self.label.target_name().contains("test_")
    }
}

#[derive(Default)]
pub struct TargetBuilder {
    label: Option<TargetLabel>,
    rule_kind: Option<String>,
    srcs: Vec<PathBuf>,
    hdrs: Vec<PathBuf>,
    deps: Vec<TargetLabel>,
}

impl TargetBuilder {
    pub fn with_label(mut self, label: impl Into<TargetLabel>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_rule_kind(mut self, rule_kind: impl Into<String>) -> Self {
        self.rule_kind = Some(rule_kind.into());
        self
    }

    pub fn with_srcs(mut self, srcs: Vec<PathBuf>) -> Self {
        self.srcs = srcs;
        self
    }

    pub fn with_hdrs(mut self, hdrs: Vec<PathBuf>) -> Self {
        self.hdrs = hdrs;
        self
    }

    pub fn with_deps(mut self, deps: Vec<TargetLabel>) -> Self {
        self.deps = deps;
        self
    }

    pub fn build(self) -> Result<Target, AnalyzerError> {
        let label = self.label.ok_or_else(|| AnalyzerError::ConfigurationError {
            message: "Missing required field: label".to_string(),
        })?;

        // Declaration order is preserved; duplicates and empty labels are
        // dropped. Self-labels are kept: the graph refuses the edge, and
        // the engine reports the declaration as removable.
        let mut seen = std::collections::HashSet::new();
        let deps = self
            .deps
            .into_iter()
            .filter(|dep| !dep.is_empty() && seen.insert(dep.clone()))
            .collect();

        Ok(Target {
            label,
            rule_kind: self.rule_kind.unwrap_or_else(|| "unknown".to_string()),
            srcs: self.srcs,
            hdrs: self.hdrs,
            deps,
        })
    }
}

/// Mapping from label to target, built once by the extractor and
/// read-only downstream.
#[derive(Debug, Clone, Default)]
pub struct TargetCatalog {
    targets: HashMap<TargetLabel, Target>,
}

impl TargetCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, target: Target) {
        self.targets.insert(target.label().clone(), target);
    }

    pub fn get(&self, label: &TargetLabel) -> Option<&Target> {
        self.targets.get(label)
    }

    pub fn contains(&self, label: &TargetLabel) -> bool {
        self.targets.contains_key(label)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TargetLabel, &Target)> {
        self.targets.iter()
    }

    pub fn targets(&self) -> impl Iterator<Item = &Target> {
        self.targets.values()
    }

    /// Labels in lexicographic order, for deterministic downstream sweeps.
    pub fn sorted_labels(&self) -> Vec<&TargetLabel> {
        let mut labels: Vec<&TargetLabel> = self.targets.keys().collect();
        labels.sort();
        labels
    }

    /// Drop test targets from the catalog (the default unless
    /// `--include-tests` is given).
    pub fn remove_test_targets(&mut self) {
        self.targets.retain(|_, target| !target.is_test());
    }
}
