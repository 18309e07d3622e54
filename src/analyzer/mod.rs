//! Header-level source analysis
//!
//! Decides, for a pair (consumer target, candidate dep), whether any
//! header the dep *provides* appears among the headers the consumer
//! *transitively includes* through its own sources and headers.
//!
//! Comparison is by basename only, case-sensitively. Known limitations,
//! documented as policy: no macro expansion, no conditional-include
//! evaluation, and no include-path resolution, so two distinct headers
//! with the same basename are conflated.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};

use regex::Regex;
use tracing::debug;

use crate::catalog::{TargetCatalog, TargetLabel};

/// Cached per-target analysis result.
#[derive(Debug, Default)]
pub struct TargetAnalysis {
    /// Basenames of every header file the target declares.
    provided: HashSet<String>,
    /// Basenames reachable from the target's source files, expanded
    /// transitively through the target's own headers.
    included: HashSet<String>,
}

impl TargetAnalysis {
    pub fn provided_headers(&self) -> &HashSet<String> {
        &self.provided
    }

    pub fn included_headers(&self) -> &HashSet<String> {
        &self.included
    }
}

pub struct SourceAnalyzer<'c> {
    catalog: &'c TargetCatalog,
    include_pattern: Regex,
    cache: Mutex<HashMap<TargetLabel, Arc<TargetAnalysis>>>,
}

impl<'c> SourceAnalyzer<'c> {
    pub fn new(catalog: &'c TargetCatalog) -> Self {
        Self {
            catalog,
            include_pattern: Regex::new(r#"#\s*include\s*[<"]([^>"]+)[>"]"#)
                .expect("include pattern is valid"),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Analyze a target, memoizing the result for the run.
    pub fn analyze(&self, label: &TargetLabel) -> Arc<TargetAnalysis> {
        if let Some(cached) = self
            .cache
            .lock()
            .expect("analysis cache poisoned")
            .get(label)
        {
            return Arc::clone(cached);
        }

        let analysis = Arc::new(self.analyze_uncached(label));
        self.cache
            .lock()
            .expect("analysis cache poisoned")
            .entry(label.clone())
            .or_insert(analysis)
            .clone()
    }

    /// Whether the target declares any source or header files at all.
    /// A target with none carries no usage evidence.
    pub fn target_has_files(&self, label: &TargetLabel) -> bool {
        self.catalog
            .get(label)
            .map(|target| !target.srcs().is_empty() || !target.hdrs().is_empty())
            .unwrap_or(false)
    }

    /// Whether `consumer`'s sources pull in any header `dep` provides.
    pub fn is_dependency_needed(&self, consumer: &TargetLabel, dep: &TargetLabel) -> bool {
        if consumer == dep {
            return false;
        }

        let consumer_analysis = self.analyze(consumer);
        if consumer_analysis.included.is_empty() {
            return false;
        }

        let dep_analysis = self.analyze(dep);
        if dep_analysis.provided.is_empty() {
            return false;
        }

        consumer_analysis
            .included
            .intersection(&dep_analysis.provided)
            .next()
            .is_some()
    }

    /// Headers `dep` provides that `consumer` never includes; evidence
    /// for removable-dependency findings.
    pub fn unused_headers(&self, consumer: &TargetLabel, dep: &TargetLabel) -> Vec<String> {
        let consumer_analysis = self.analyze(consumer);
        let dep_analysis = self.analyze(dep);

        let mut unused: Vec<String> = dep_analysis
            .provided
            .difference(&consumer_analysis.included)
            .cloned()
            .collect();
        unused.sort();
        unused
    }

    fn analyze_uncached(&self, label: &TargetLabel) -> TargetAnalysis {
        let Some(target) = self.catalog.get(label) else {
            return TargetAnalysis::default();
        };

        let mut provided = HashSet::new();
        // Direct includes of the target's own headers, keyed by header
        // basename, for the transitive expansion below.
        let mut own_header_includes: HashMap<String, Vec<String>> = HashMap::new();

        for header in target.hdrs() {
            let name = basename(header);
            provided.insert(name.clone());
            own_header_includes
                .entry(name)
                .or_default()
                .extend(self.scan_includes(header));
        }

        // Seed with the direct includes of every source file, then
        // expand through the target's own headers with an explicit stack
        // and a visited set, so each header is walked at most once.
        let mut pending: Vec<String> = target
            .srcs()
            .iter()
            .flat_map(|src| self.scan_includes(src))
            .collect();

        let mut included = HashSet::new();
        while let Some(name) = pending.pop() {
            if !included.insert(name.clone()) {
                continue;
            }
            if let Some(nested) = own_header_includes.get(&name) {
                for next in nested {
                    if !included.contains(next) {
                        pending.push(next.clone());
                    }
                }
            }
        }

        TargetAnalysis { provided, included }
    }

    /// Basenames of everything a file `#include`s. An unreadable file is
    /// treated as empty.
    fn scan_includes(&self, path: &Path) -> Vec<String> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                debug!(file = %path.display(), error = %e, "source file unreadable, treated as empty");
                return Vec::new();
            }
        };

        self.include_pattern
            .captures_iter(&content)
            .map(|captures| {
                let path = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
                path.rsplit('/').next().unwrap_or(path).to_string()
            })
            .collect()
    }
}

fn basename(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use tempfile::TempDir;

    use super::*;
    use crate::catalog::Target;

    struct Fixture {
        _dir: TempDir,
        catalog: TargetCatalog,
    }

    fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();

        // //a:a uses b.h through its own header a.h.
        let a_cc = write_file(&dir, "a/a.cc", "#include \"a.h\"\nint main() { return 0; }\n");
        let a_h = write_file(&dir, "a/a.h", "#pragma once\n#include <b/b.h>\n");
        // //b:b provides b.h; its source includes nothing interesting.
        let b_cc = write_file(&dir, "b/b.cc", "#include \"b.h\"\n");
        let b_h = write_file(&dir, "b/b.h", "#pragma once\n");
        // //c:c provides c.h, which nothing includes.
        let c_h = write_file(&dir, "c/c.h", "#pragma once\n");

        let mut catalog = TargetCatalog::new();
        catalog.insert(
            Target::builder()
                .with_label("//a:a")
                .with_rule_kind("cc_library")
                .with_srcs(vec![a_cc])
                .with_hdrs(vec![a_h])
                .with_deps(vec![TargetLabel::new("//b:b"), TargetLabel::new("//c:c")])
                .build()
                .unwrap(),
        );
        catalog.insert(
            Target::builder()
                .with_label("//b:b")
                .with_rule_kind("cc_library")
                .with_srcs(vec![b_cc])
                .with_hdrs(vec![b_h])
                .build()
                .unwrap(),
        );
        catalog.insert(
            Target::builder()
                .with_label("//c:c")
                .with_rule_kind("cc_library")
                .with_hdrs(vec![c_h])
                .build()
                .unwrap(),
        );

        Fixture {
            _dir: dir,
            catalog,
        }
    }

    #[test]
    fn test_provided_and_included_sets() {
        let fixture = fixture();
        let analyzer = SourceAnalyzer::new(&fixture.catalog);

        let analysis = analyzer.analyze(&TargetLabel::new("//a:a"));
        assert_eq!(
            analysis.provided_headers(),
            &HashSet::from(["a.h".to_string()])
        );
        // a.cc includes a.h; a.h (own header) includes b/b.h -> basename
        // b.h reached transitively.
        assert!(analysis.included_headers().contains("a.h"));
        assert!(analysis.included_headers().contains("b.h"));
    }

    #[test]
    fn test_dependency_needed_through_own_header() {
        let fixture = fixture();
        let analyzer = SourceAnalyzer::new(&fixture.catalog);

        let a = TargetLabel::new("//a:a");
        assert!(analyzer.is_dependency_needed(&a, &TargetLabel::new("//b:b")));
        assert!(!analyzer.is_dependency_needed(&a, &TargetLabel::new("//c:c")));
    }

    #[test]
    fn test_self_dependency_never_needed() {
        let fixture = fixture();
        let analyzer = SourceAnalyzer::new(&fixture.catalog);

        let a = TargetLabel::new("//a:a");
        assert!(!analyzer.is_dependency_needed(&a, &a));
    }

    #[test]
    fn test_target_without_headers_provides_nothing() {
        let dir = TempDir::new().unwrap();
        let main_cc = write_file(&dir, "bin/main.cc", "#include <x.h>\n");

        let mut catalog = TargetCatalog::new();
        catalog.insert(
            Target::builder()
                .with_label("//bin:main")
                .with_rule_kind("cc_binary")
                .with_srcs(vec![main_cc])
                .build()
                .unwrap(),
        );
        catalog.insert(
            Target::builder()
                .with_label("//empty:empty")
                .with_rule_kind("cc_library")
                .build()
                .unwrap(),
        );

        let analyzer = SourceAnalyzer::new(&catalog);
        let main = TargetLabel::new("//bin:main");
        let empty = TargetLabel::new("//empty:empty");

        // A target that provides nothing can never be needed on header
        // grounds, and a target including nothing never needs anyone.
        assert!(!analyzer.is_dependency_needed(&main, &empty));
        assert!(!analyzer.is_dependency_needed(&empty, &main));
    }

    #[test]
    fn test_unreadable_file_treated_as_empty() {
        let mut catalog = TargetCatalog::new();
        catalog.insert(
            Target::builder()
                .with_label("//gone:gone")
                .with_rule_kind("cc_library")
                .with_srcs(vec![PathBuf::from("/nonexistent/gone.cc")])
                .with_hdrs(vec![PathBuf::from("/nonexistent/gone.h")])
                .build()
                .unwrap(),
        );

        let analyzer = SourceAnalyzer::new(&catalog);
        let analysis = analyzer.analyze(&TargetLabel::new("//gone:gone"));

        // The header is still *declared*, so its basename is provided,
        // but nothing is included.
        assert!(analysis.provided_headers().contains("gone.h"));
        assert!(analysis.included_headers().is_empty());
    }

    #[test]
    fn test_include_forms_and_basename_stripping() {
        let dir = TempDir::new().unwrap();
        let src = write_file(
            &dir,
            "x/x.cc",
            concat!(
                "#include <deep/nested/path/one.h>\n",
                "#  include \"two.hpp\"\n",
                "// #include commented_out.h is not an include\n",
                "#include \"three.h\" // trailing comment\n",
            ),
        );

        let mut catalog = TargetCatalog::new();
        catalog.insert(
            Target::builder()
                .with_label("//x:x")
                .with_rule_kind("cc_library")
                .with_srcs(vec![src])
                .build()
                .unwrap(),
        );

        let analyzer = SourceAnalyzer::new(&catalog);
        let analysis = analyzer.analyze(&TargetLabel::new("//x:x"));

        assert!(analysis.included_headers().contains("one.h"));
        assert!(analysis.included_headers().contains("two.hpp"));
        assert!(analysis.included_headers().contains("three.h"));
        assert!(!analysis.included_headers().contains("commented_out.h"));
    }

    #[test]
    fn test_analysis_is_cached() {
        let fixture = fixture();
        let analyzer = SourceAnalyzer::new(&fixture.catalog);

        let a = TargetLabel::new("//a:a");
        let first = analyzer.analyze(&a);
        let second = analyzer.analyze(&a);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_header_include_cycle_terminates() {
        let dir = TempDir::new().unwrap();
        let one = write_file(&dir, "p/one.h", "#include \"two.h\"\n");
        let two = write_file(&dir, "p/two.h", "#include \"one.h\"\n");
        let src = write_file(&dir, "p/p.cc", "#include \"one.h\"\n");

        let mut catalog = TargetCatalog::new();
        catalog.insert(
            Target::builder()
                .with_label("//p:p")
                .with_rule_kind("cc_library")
                .with_srcs(vec![src])
                .with_hdrs(vec![one, two])
                .build()
                .unwrap(),
        );

        let analyzer = SourceAnalyzer::new(&catalog);
        let analysis = analyzer.analyze(&TargetLabel::new("//p:p"));

        assert!(analysis.included_headers().contains("one.h"));
        assert!(analysis.included_headers().contains("two.h"));
    }
}
