//! Dependency graph
//!
//! A directed graph over catalog targets with forward and reverse
//! adjacency, cycle discovery, and transitive reachability. Built once
//! from the catalog and immutable afterwards.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::analyzer::SourceAnalyzer;
use crate::catalog::{TargetCatalog, TargetLabel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

pub struct DependencyGraph {
    graph: DiGraph<TargetLabel, ()>,
    indices: HashMap<TargetLabel, NodeIndex>,
    /// Declared-order direct deps per target, restricted to graph nodes.
    direct: HashMap<TargetLabel, Vec<TargetLabel>>,
    /// Exact transpose of the forward adjacency.
    reverse: HashMap<TargetLabel, HashSet<TargetLabel>>,
}

impl DependencyGraph {
    /// Build the graph from the catalog.
    ///
    /// Empty, whitespace-only, and `@`-containing labels are dropped.
    /// Self-edges are never inserted; they surface through the engine as
    /// removable dependencies instead.
    pub fn from_catalog(catalog: &TargetCatalog) -> Self {
        let mut graph = DiGraph::new();
        let mut indices = HashMap::new();

        let mut sorted: Vec<&TargetLabel> = catalog.sorted_labels();
        sorted.retain(|label| Self::is_graph_label(label));
        for label in &sorted {
            let idx = graph.add_node((*label).clone());
            indices.insert((*label).clone(), idx);
        }

        let mut direct: HashMap<TargetLabel, Vec<TargetLabel>> = HashMap::new();
        let mut reverse: HashMap<TargetLabel, HashSet<TargetLabel>> = HashMap::new();
        for label in &sorted {
            reverse.insert((*label).clone(), HashSet::new());
        }

        for label in sorted {
            let Some(target) = catalog.get(label) else {
                continue;
            };
            let from_idx = indices[label];
            let mut kept = Vec::new();

            for dep in target.deps() {
                if !Self::is_graph_label(dep) || dep == label {
                    continue;
                }
                let Some(&to_idx) = indices.get(dep) else {
                    // Dangling declared dep (not a catalog target);
                    // excluded from the graph.
                    continue;
                };
                graph.add_edge(from_idx, to_idx, ());
                kept.push(dep.clone());
                reverse
                    .entry(dep.clone())
                    .or_default()
                    .insert(label.clone());
            }

            direct.insert(label.clone(), kept);
        }

        Self {
            graph,
            indices,
            direct,
            reverse,
        }
    }

    fn is_graph_label(label: &TargetLabel) -> bool {
        !label.is_empty() && !label.is_external()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, label: &TargetLabel) -> bool {
        self.indices.contains_key(label)
    }

    pub fn labels(&self) -> impl Iterator<Item = &TargetLabel> {
        self.graph.node_weights()
    }

    /// Direct dependencies of `target` in declaration order.
    pub fn direct_deps(&self, target: &TargetLabel) -> &[TargetLabel] {
        self.direct.get(target).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Targets that declare a dependency on `target`.
    pub fn reverse_deps(&self, target: &TargetLabel) -> HashSet<TargetLabel> {
        self.reverse.get(target).cloned().unwrap_or_default()
    }

    /// Every target reachable from `target` through one or more forward
    /// edges. Never contains `target` itself.
    pub fn transitive_deps(&self, target: &TargetLabel) -> HashSet<TargetLabel> {
        let mut reachable = HashSet::new();
        let Some(&start) = self.indices.get(target) else {
            return reachable;
        };

        let mut visited: HashSet<NodeIndex> = HashSet::new();
        visited.insert(start);
        let mut queue: VecDeque<NodeIndex> = self
            .graph
            .neighbors_directed(start, Direction::Outgoing)
            .collect();

        while let Some(node) = queue.pop_front() {
            if !visited.insert(node) {
                continue;
            }
            if node != start {
                reachable.insert(self.graph[node].clone());
            }
            for next in self.graph.neighbors_directed(node, Direction::Outgoing) {
                if !visited.contains(&next) {
                    queue.push_back(next);
                }
            }
        }

        reachable
    }

    /// Discover cycles with a colored depth-first search.
    ///
    /// Each returned path reads in edge order and is closed: the first
    /// element equals the last, and every consecutive pair is a forward
    /// edge. Rotations of the same cycle may be reported more than once
    /// across DFS roots; callers are expected to deduplicate.
    pub fn find_cycles(&self) -> Vec<Vec<TargetLabel>> {
        let mut cycles = Vec::new();
        let mut color: HashMap<NodeIndex, Color> = self
            .graph
            .node_indices()
            .map(|idx| (idx, Color::White))
            .collect();
        let mut parent: HashMap<NodeIndex, NodeIndex> = HashMap::new();

        // Roots visited in label order for deterministic output.
        let mut roots: Vec<NodeIndex> = self.graph.node_indices().collect();
        roots.sort_by(|a, b| self.graph[*a].cmp(&self.graph[*b]));

        for root in roots {
            if color[&root] == Color::White {
                self.dfs_visit(root, &mut color, &mut parent, &mut cycles);
            }
        }

        cycles
    }

    fn dfs_visit(
        &self,
        root: NodeIndex,
        color: &mut HashMap<NodeIndex, Color>,
        parent: &mut HashMap<NodeIndex, NodeIndex>,
        cycles: &mut Vec<Vec<TargetLabel>>,
    ) {
        // Iterative DFS; each stack frame tracks the next outgoing edge
        // to explore so the gray path mirrors the recursion stack.
        let mut stack: Vec<(NodeIndex, Vec<NodeIndex>, usize)> = Vec::new();
        color.insert(root, Color::Gray);
        stack.push((root, self.successors_sorted(root), 0));

        while !stack.is_empty() {
            let (node, advanced) = {
                let (node, successors, cursor) = stack.last_mut().expect("stack is non-empty");
                if *cursor < successors.len() {
                    let next = successors[*cursor];
                    *cursor += 1;
                    (*node, Some(next))
                } else {
                    (*node, None)
                }
            };

            let Some(next) = advanced else {
                color.insert(node, Color::Black);
                stack.pop();
                continue;
            };

            match color[&next] {
                Color::White => {
                    parent.insert(next, node);
                    color.insert(next, Color::Gray);
                    let successors = self.successors_sorted(next);
                    stack.push((next, successors, 0));
                }
                Color::Gray => {
                    // Back edge node -> next: walk parent pointers from
                    // node up to next, then close the path.
                    cycles.push(self.reconstruct_cycle(node, next, parent));
                }
                Color::Black => {}
            }
        }
    }

    fn successors_sorted(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut successors: Vec<NodeIndex> = self
            .graph
            .edges_directed(node, Direction::Outgoing)
            .map(|e| e.target())
            .collect();
        successors.sort_by(|a, b| self.graph[*a].cmp(&self.graph[*b]));
        successors.dedup();
        successors
    }

    fn reconstruct_cycle(
        &self,
        from: NodeIndex,
        ancestor: NodeIndex,
        parent: &HashMap<NodeIndex, NodeIndex>,
    ) -> Vec<TargetLabel> {
        let mut walk = vec![from];
        let mut node = from;
        while node != ancestor {
            node = parent[&node];
            walk.push(node);
        }
        // walk is [from, ..., ancestor]; reversed it reads in edge order
        // starting at the ancestor, and appending the ancestor again
        // closes the path (first element == last element).
        walk.reverse();
        walk.push(ancestor);
        walk.into_iter().map(|idx| self.graph[idx].clone()).collect()
    }

    /// Declared deps of `target` that nothing appears to use.
    ///
    /// With a source analyzer the decision is header evidence plus the
    /// forwarding rule (see [`Self::is_dependency_truly_needed`]); a
    /// consumer with no files and a dep providing no headers are both
    /// exempt, as neither yields concrete evidence. Without an analyzer,
    /// the weaker graph-only fallback flags deps no *other* target
    /// depends on; callers should downgrade the confidence of those
    /// findings.
    pub fn find_unused_dependencies(
        &self,
        target: &TargetLabel,
        analyzer: Option<&SourceAnalyzer<'_>>,
    ) -> Vec<TargetLabel> {
        if let Some(analyzer) = analyzer {
            if !analyzer.target_has_files(target) {
                return Vec::new();
            }
        }

        self.direct_deps(target)
            .iter()
            .filter(|dep| match analyzer {
                Some(analyzer) => {
                    !analyzer.analyze(dep).provided_headers().is_empty()
                        && !self.is_dependency_truly_needed(target, dep, analyzer)
                }
                None => self
                    .reverse_deps(dep)
                    .iter()
                    .all(|consumer| consumer == target),
            })
            .cloned()
            .collect()
    }

    /// Whether `target`'s declared edge on `dep` is doing real work.
    ///
    /// True when header evidence says `target` uses `dep`, or when some
    /// other direct dep needs `dep`'s headers but cannot reach `dep`
    /// through its own declared deps (so `target`'s edge is the one
    /// forwarding them). A sibling that reaches `dep` on its own does not
    /// justify keeping the edge.
    pub fn is_dependency_truly_needed(
        &self,
        target: &TargetLabel,
        dep: &TargetLabel,
        analyzer: &SourceAnalyzer<'_>,
    ) -> bool {
        if analyzer.is_dependency_needed(target, dep) {
            return true;
        }

        self.direct_deps(target)
            .iter()
            .filter(|sibling| *sibling != dep)
            .any(|sibling| {
                analyzer.is_dependency_needed(sibling, dep)
                    && !self.transitive_deps(sibling).contains(dep)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Target;

    fn catalog_from_edges(edges: &[(&str, &[&str])]) -> TargetCatalog {
        let mut catalog = TargetCatalog::new();
        for (label, deps) in edges {
            catalog.insert(
                Target::builder()
                    .with_label(*label)
                    .with_rule_kind("cc_library")
                    .with_deps(deps.iter().map(|d| TargetLabel::new(*d)).collect())
                    .build()
                    .unwrap(),
            );
        }
        catalog
    }

    #[test]
    fn test_no_cycles_in_linear_graph() {
        let catalog = catalog_from_edges(&[
            ("//a:a", &["//b:b"]),
            ("//b:b", &["//c:c"]),
            ("//c:c", &[]),
        ]);
        let graph = DependencyGraph::from_catalog(&catalog);

        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert!(graph.find_cycles().is_empty());
    }

    #[test]
    fn test_two_node_cycle_is_closed_path() {
        let catalog = catalog_from_edges(&[("//a:a", &["//b:b"]), ("//b:b", &["//a:a"])]);
        let graph = DependencyGraph::from_catalog(&catalog);

        let cycles = graph.find_cycles();
        assert_eq!(cycles.len(), 1);

        let cycle = &cycles[0];
        assert_eq!(cycle.first(), cycle.last());
        assert_eq!(cycle.len(), 3);

        // Every consecutive pair must be a forward edge.
        for pair in cycle.windows(2) {
            assert!(
                graph.direct_deps(&pair[0]).contains(&pair[1]),
                "{} -> {} is not an edge",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_three_node_cycle() {
        let catalog = catalog_from_edges(&[
            ("//a:a", &["//b:b"]),
            ("//b:b", &["//c:c"]),
            ("//c:c", &["//a:a"]),
        ]);
        let graph = DependencyGraph::from_catalog(&catalog);

        let cycles = graph.find_cycles();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].len(), 4);
        assert_eq!(cycles[0].first(), cycles[0].last());
    }

    #[test]
    fn test_transitive_deps_exclude_self() {
        let catalog = catalog_from_edges(&[
            ("//a:a", &["//b:b"]),
            ("//b:b", &["//c:c"]),
            ("//c:c", &["//a:a"]),
        ]);
        let graph = DependencyGraph::from_catalog(&catalog);

        let a = TargetLabel::new("//a:a");
        let transitive = graph.transitive_deps(&a);

        assert!(transitive.contains(&TargetLabel::new("//b:b")));
        assert!(transitive.contains(&TargetLabel::new("//c:c")));
        assert!(!transitive.contains(&a), "transitive deps must not contain the start");
    }

    #[test]
    fn test_reverse_is_transpose_of_forward() {
        let catalog = catalog_from_edges(&[
            ("//a:a", &["//b:b", "//c:c"]),
            ("//b:b", &["//c:c"]),
            ("//c:c", &[]),
        ]);
        let graph = DependencyGraph::from_catalog(&catalog);

        for from in graph.labels() {
            for to in graph.direct_deps(from) {
                assert!(
                    graph.reverse_deps(to).contains(from),
                    "edge {from} -> {to} missing from reverse adjacency"
                );
            }
        }

        let total_reverse: usize = graph
            .labels()
            .map(|label| graph.reverse_deps(label).len())
            .sum();
        assert_eq!(total_reverse, graph.edge_count());
    }

    #[test]
    fn test_external_and_empty_labels_dropped() {
        let mut catalog = catalog_from_edges(&[("//a:a", &["//b:b", "@ext//:lib", "  "])]);
        catalog.insert(
            Target::builder()
                .with_label("//b:b")
                .with_rule_kind("cc_library")
                .build()
                .unwrap(),
        );
        let graph = DependencyGraph::from_catalog(&catalog);

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert!(!graph.contains(&TargetLabel::new("@ext//:lib")));
    }

    #[test]
    fn test_self_edge_not_inserted() {
        let catalog = catalog_from_edges(&[("//a:a", &["//a:a", "//b:b"]), ("//b:b", &[])]);
        let graph = DependencyGraph::from_catalog(&catalog);

        assert_eq!(graph.edge_count(), 1);
        assert!(graph.find_cycles().is_empty());
    }

    #[test]
    fn test_direct_deps_preserve_declared_order() {
        let catalog = catalog_from_edges(&[
            ("//a:a", &["//z:z", "//b:b", "//m:m"]),
            ("//z:z", &[]),
            ("//b:b", &[]),
            ("//m:m", &[]),
        ]);
        let graph = DependencyGraph::from_catalog(&catalog);

        let deps = graph.direct_deps(&TargetLabel::new("//a:a"));
        assert_eq!(
            deps,
            &[
                TargetLabel::new("//z:z"),
                TargetLabel::new("//b:b"),
                TargetLabel::new("//m:m"),
            ]
        );
    }

    #[test]
    fn test_graph_only_unused_fallback() {
        // //x:x is //helper:h's only consumer; //shared:s has two.
        let catalog = catalog_from_edges(&[
            ("//x:x", &["//helper:h", "//shared:s"]),
            ("//y:y", &["//shared:s"]),
            ("//helper:h", &[]),
            ("//shared:s", &[]),
        ]);
        let graph = DependencyGraph::from_catalog(&catalog);

        let unused = graph.find_unused_dependencies(&TargetLabel::new("//x:x"), None);
        assert_eq!(unused, vec![TargetLabel::new("//helper:h")]);
    }

    #[test]
    fn test_find_cycles_is_deterministic() {
        let catalog = catalog_from_edges(&[
            ("//a:a", &["//b:b"]),
            ("//b:b", &["//c:c", "//a:a"]),
            ("//c:c", &["//a:a"]),
        ]);
        let graph = DependencyGraph::from_catalog(&catalog);

        let first = graph.find_cycles();
        let second = graph.find_cycles();
        assert_eq!(first, second);
    }
}
