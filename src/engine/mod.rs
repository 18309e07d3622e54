//! Cycle / unused-dependency engine
//!
//! Combines the dependency graph with source evidence to classify
//! cycles, enumerate the edges whose removal would break a cycle, and
//! sweep the whole catalog for declared-but-unused dependencies. Every
//! suggestion carries a confidence level; only high-confidence edges are
//! attached to cycle reports.

pub mod suggestions;

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::analyzer::SourceAnalyzer;
use crate::catalog::{TargetCatalog, TargetLabel};
use crate::graph::DependencyGraph;

/// Structural classification of a detected cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CycleKind {
    Direct,
    Diamond,
    Complex,
    Simple,
}

impl CycleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleKind::Direct => "DIRECT",
            CycleKind::Diamond => "DIAMOND",
            CycleKind::Complex => "COMPLEX",
            CycleKind::Simple => "SIMPLE",
        }
    }
}

impl fmt::Display for CycleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "HIGH",
            Confidence::Medium => "MEDIUM",
            Confidence::Low => "LOW",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An edge the engine claims may be deleted from the consumer's deps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovableDependency {
    pub from: TargetLabel,
    pub to: TargetLabel,
    pub reason: String,
    pub confidence: Confidence,
    pub unused_headers: Vec<String>,
}

/// One analyzed cycle, ready for rendering.
#[derive(Debug, Clone)]
pub struct CycleAnalysis {
    path: Vec<TargetLabel>,
    kind: CycleKind,
    removable_dependencies: Vec<RemovableDependency>,
    suggested_fixes: Vec<String>,
    contains_test_targets: bool,
    contains_external_deps: bool,
}

impl CycleAnalysis {
    /// The cycle in edge order; the first element equals the last.
    pub fn path(&self) -> &[TargetLabel] {
        &self.path
    }

    /// Number of distinct targets on the cycle.
    pub fn length(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    pub fn kind(&self) -> CycleKind {
        self.kind
    }

    pub fn removable_dependencies(&self) -> &[RemovableDependency] {
        &self.removable_dependencies
    }

    pub fn suggested_fixes(&self) -> &[String] {
        &self.suggested_fixes
    }

    pub fn contains_test_targets(&self) -> bool {
        self.contains_test_targets
    }

    pub fn contains_external_deps(&self) -> bool {
        self.contains_external_deps
    }
}

pub struct CycleDetector<'c> {
    catalog: &'c TargetCatalog,
    graph: &'c DependencyGraph,
    analyzer: SourceAnalyzer<'c>,
}

impl<'c> CycleDetector<'c> {
    pub fn new(catalog: &'c TargetCatalog, graph: &'c DependencyGraph) -> Self {
        Self {
            catalog,
            graph,
            analyzer: SourceAnalyzer::new(catalog),
        }
    }

    pub fn analyzer(&self) -> &SourceAnalyzer<'c> {
        &self.analyzer
    }

    /// Discover, deduplicate, and classify every cycle in the graph.
    ///
    /// Cycles are ordered by ascending length so the smallest (and
    /// usually easiest to fix) come first.
    pub fn analyze_cycles(&self) -> Vec<CycleAnalysis> {
        let mut seen = HashSet::new();
        let mut analyses = Vec::new();

        for path in self.graph.find_cycles() {
            let distinct = &path[..path.len().saturating_sub(1)];
            if distinct.len() < 2 {
                continue;
            }
            // The DFS may report the same cycle once per discovery root;
            // rotations collapse onto one canonical key.
            if !seen.insert(canonical_rotation(distinct)) {
                continue;
            }
            analyses.push(self.classify_cycle(path));
        }

        analyses.sort_by(|a, b| {
            a.length()
                .cmp(&b.length())
                .then_with(|| a.path.cmp(&b.path))
        });
        analyses
    }

    /// Sweep every catalog target for declared deps that nothing uses.
    ///
    /// Results are sorted by (from, to) so repeated runs over the same
    /// catalog produce identical reports.
    pub fn analyze_unused_dependencies(&self) -> Vec<RemovableDependency> {
        let mut removable = Vec::new();

        for label in self.catalog.sorted_labels() {
            let Some(target) = self.catalog.get(label) else {
                continue;
            };

            // Self-deps never make it into the graph; they are reported
            // straight from the declaration.
            for dep in target.deps() {
                if dep == label {
                    removable.push(RemovableDependency {
                        from: label.clone(),
                        to: dep.clone(),
                        reason: "self-dependency should not exist".to_string(),
                        confidence: Confidence::High,
                        unused_headers: Vec::new(),
                    });
                }
            }

            for dep in self.graph.find_unused_dependencies(label, Some(&self.analyzer)) {
                debug!(from = %label, to = %dep, "unused dependency");
                let unused_headers = self.analyzer.unused_headers(label, &dep);
                removable.push(RemovableDependency {
                    from: label.clone(),
                    to: dep,
                    reason: "No headers from this dependency are used".to_string(),
                    confidence: Confidence::High,
                    unused_headers,
                });
            }
        }

        removable.sort_by(|a, b| a.from.cmp(&b.from).then_with(|| a.to.cmp(&b.to)));
        removable
    }

    fn classify_cycle(&self, path: Vec<TargetLabel>) -> CycleAnalysis {
        let kind = self.determine_kind(&path);
        let contains_test_targets = self.contains_test_targets(&path);
        let contains_external_deps = path.iter().any(|label| label.is_external());

        let removable_dependencies = self.removable_edges(&path);

        let mut suggested_fixes = suggestions::for_kind(kind, &path);
        if !removable_dependencies.is_empty() {
            suggested_fixes.push("Removing any of these dependencies breaks the cycle:".to_string());
            for dep in &removable_dependencies {
                suggested_fixes.push(format!("  {} -> {} ({})", dep.from, dep.to, dep.reason));
            }
        }
        if contains_test_targets {
            suggested_fixes.extend(suggestions::for_test_targets());
        }
        if contains_external_deps {
            suggested_fixes.extend(suggestions::for_external_deps());
        }

        CycleAnalysis {
            path,
            kind,
            removable_dependencies,
            suggested_fixes,
            contains_test_targets,
            contains_external_deps,
        }
    }

    fn determine_kind(&self, path: &[TargetLabel]) -> CycleKind {
        let distinct = &path[..path.len() - 1];

        if distinct.len() == 2 && self.mutually_reachable(&distinct[0], &distinct[1]) {
            return CycleKind::Direct;
        }
        if path.len() >= 4 && self.has_convergence_node(distinct) {
            return CycleKind::Diamond;
        }
        if distinct.len() > 3 {
            return CycleKind::Complex;
        }
        CycleKind::Simple
    }

    fn mutually_reachable(&self, a: &TargetLabel, b: &TargetLabel) -> bool {
        self.graph.transitive_deps(a).contains(b) && self.graph.transitive_deps(b).contains(a)
    }

    /// A convergence node reaches at least two other members of the
    /// cycle, marking paths that rejoin.
    fn has_convergence_node(&self, distinct: &[TargetLabel]) -> bool {
        distinct.iter().any(|node| {
            let reachable = self.graph.transitive_deps(node);
            distinct
                .iter()
                .filter(|other| *other != node && reachable.contains(other))
                .count()
                >= 2
        })
    }

    /// High-confidence removable candidates across the cycle's edges,
    /// merging code-level and target-level evidence.
    fn removable_edges(&self, path: &[TargetLabel]) -> Vec<RemovableDependency> {
        let mut candidates = Vec::new();

        for pair in path.windows(2) {
            let (from, to) = (&pair[0], &pair[1]);
            if !self.catalog.contains(from) || !self.catalog.contains(to) {
                continue;
            }
            candidates.extend(self.analyze_edge_code_level(from, to));
            candidates.extend(self.analyze_edge_target_level(from, to));
        }

        // Only high-confidence candidates make it onto the cycle; the
        // rest can still surface through the unused-dependency sweep.
        let mut kept = Vec::new();
        let mut seen = HashSet::new();
        for candidate in candidates {
            if candidate.confidence == Confidence::High
                && seen.insert((candidate.from.clone(), candidate.to.clone()))
            {
                kept.push(candidate);
            }
        }
        kept.sort_by(|a, b| a.from.cmp(&b.from).then_with(|| a.to.cmp(&b.to)));
        kept
    }

    /// Header-usage evidence for one edge.
    fn analyze_edge_code_level(
        &self,
        from: &TargetLabel,
        to: &TargetLabel,
    ) -> Option<RemovableDependency> {
        let from_target = self.catalog.get(from)?;
        if !from_target.deps().contains(to) {
            return None;
        }
        // A consumer with no files at all, or a dep with no provided
        // headers, yields no concrete evidence either way.
        if from_target.srcs().is_empty() && from_target.hdrs().is_empty() {
            return None;
        }
        if self.analyzer.analyze(to).provided_headers().is_empty() {
            return None;
        }
        if self.analyzer.is_dependency_needed(from, to) {
            return None;
        }

        Some(RemovableDependency {
            from: from.clone(),
            to: to.clone(),
            reason: "No headers from this dependency are used".to_string(),
            confidence: Confidence::High,
            unused_headers: self.analyzer.unused_headers(from, to),
        })
    }

    /// Rule-kind heuristics for one edge.
    fn analyze_edge_target_level(
        &self,
        from: &TargetLabel,
        to: &TargetLabel,
    ) -> Option<RemovableDependency> {
        let from_target = self.catalog.get(from)?;
        let to_target = self.catalog.get(to)?;
        if !from_target.deps().contains(to) {
            return None;
        }

        if from_target.rule_kind() == "cc_library" && to_target.rule_kind() == "cc_library" {
            let has_alternative_path = self
                .graph
                .direct_deps(from)
                .iter()
                .filter(|sibling| *sibling != to)
                .any(|sibling| self.graph.transitive_deps(sibling).contains(to));

            if has_alternative_path {
                let confidence = if self.analyzer.is_dependency_needed(from, to) {
                    Confidence::Medium
                } else {
                    Confidence::High
                };
                return Some(RemovableDependency {
                    from: from.clone(),
                    to: to.clone(),
                    reason: "alternative dependency path exists".to_string(),
                    confidence,
                    unused_headers: Vec::new(),
                });
            }
        }

        if from_target.rule_kind().contains("test") && to_target.rule_kind() == "cc_library" {
            return Some(RemovableDependency {
                from: from.clone(),
                to: to.clone(),
                reason: "test-dep may be over-declared".to_string(),
                confidence: Confidence::Medium,
                unused_headers: Vec::new(),
            });
        }

        None
    }

    fn contains_test_targets(&self, path: &[TargetLabel]) -> bool {
        path.iter().any(|label| {
            self.catalog
                .get(label)
                .map(|target| target.is_test())
                .unwrap_or(false)
        })
    }
}

/// Canonical key for a cycle's distinct-node path: the rotation starting
/// at the smallest label.
fn canonical_rotation(distinct: &[TargetLabel]) -> Vec<TargetLabel> {
    let Some(min_position) = distinct
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.cmp(b))
        .map(|(i, _)| i)
    else {
        return Vec::new();
    };

    let mut rotated = Vec::with_capacity(distinct.len());
    rotated.extend_from_slice(&distinct[min_position..]);
    rotated.extend_from_slice(&distinct[..min_position]);
    rotated
}
