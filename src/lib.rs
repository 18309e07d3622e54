//! # Bazel Deps Analyzer - Build-Health Analysis for Bazel C/C++ Workspaces
//!
//! This crate analyzes a Bazel C/C++ workspace to detect two classes of
//! build-health problems: cyclic dependency relations among targets, and
//! declared-but-unused dependencies. For each issue it produces an
//! actionable report with suggested fixes and a confidence level.
//!
//! ## Main Components
//!
//! - **Extractor**: drives `bazel query` to materialize every C/C++
//!   target with its rule kind, sources, headers, and declared deps
//! - **Graph**: the in-memory dependency graph with cycle discovery and
//!   transitive reachability
//! - **Analyzer**: header-level source evidence for whether an edge is
//!   actually used
//! - **Engine**: classifies cycles and labels removable dependencies
//! - **Reports**: console, markdown, JSON, and HTML renderers
//!
//! ## Usage
//!
//! The library can be used programmatically:
//!
//! ```
//! use bazel_deps_analyzer::catalog::{Target, TargetCatalog, TargetLabel};
//! use bazel_deps_analyzer::engine::CycleDetector;
//! use bazel_deps_analyzer::graph::DependencyGraph;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Assemble a catalog by hand; in real usage the extractor builds it
//! // from `bazel query` output.
//! let mut catalog = TargetCatalog::new();
//! catalog.insert(
//!     Target::builder()
//!         .with_label("//a:a")
//!         .with_rule_kind("cc_library")
//!         .with_deps(vec![TargetLabel::new("//b:b")])
//!         .build()?,
//! );
//! catalog.insert(
//!     Target::builder()
//!         .with_label("//b:b")
//!         .with_rule_kind("cc_library")
//!         .with_deps(vec![TargetLabel::new("//a:a")])
//!         .build()?,
//! );
//!
//! let graph = DependencyGraph::from_catalog(&catalog);
//! let detector = CycleDetector::new(&catalog, &graph);
//!
//! let cycles = detector.analyze_cycles();
//! assert_eq!(cycles.len(), 1);
//! assert_eq!(cycles[0].length(), 2);
//! # Ok(())
//! # }
//! ```

// Private modules
mod constants;
mod utils;

// Public modules
pub mod analyzer;
pub mod buildtime;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod executors;
pub mod extractor;
pub mod graph;
pub mod progress;
pub mod reports;

// Re-export commonly used types
pub use crate::catalog::{Target, TargetCatalog, TargetLabel};
pub use crate::engine::{Confidence, CycleAnalysis, CycleDetector, CycleKind, RemovableDependency};
pub use crate::error::AnalyzerError;
pub use crate::graph::DependencyGraph;
pub use crate::reports::ReportFormat;

// Main entry point for the library
pub fn run() -> miette::Result<()> {
    use clap::Parser;
    use tracing_subscriber::EnvFilter;

    use crate::cli::Cli;
    use crate::config::AnalysisMode;
    use crate::executors::{
        buildtime::BuildTimeExecutor, cycles::CyclesExecutor, unused::UnusedExecutor,
        CommandExecutor,
    };

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version are ordinary exits; anything else is a
            // usage error.
            let exit_code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(exit_code);
        }
    };

    let default_filter = match cli.verbose {
        0 => "bazel_deps_analyzer=warn",
        1 => "bazel_deps_analyzer=info",
        _ => "bazel_deps_analyzer=debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = cli.into_config()?;
    match config.mode {
        AnalysisMode::Cycles => CyclesExecutor::execute(&config),
        AnalysisMode::Unused => UnusedExecutor::execute(&config),
        AnalysisMode::BuildTime => BuildTimeExecutor::execute(&config),
    }
}
