//! Command executors that handle the actual logic for each analysis mode

pub mod buildtime;
pub mod cycles;
pub mod unused;

use miette::Result;

use crate::catalog::TargetCatalog;
use crate::config::AnalysisConfig;
use crate::extractor::{BazelRunner, WorkspaceExtractor};
use crate::progress::ProgressReporter;

/// Trait for command executors
pub trait CommandExecutor {
    /// Execute the analysis described by the configuration
    fn execute(config: &AnalysisConfig) -> Result<()>;
}

/// Shared front half of the cycle and unused-dependency pipelines:
/// build the runner, extract the catalog, report progress.
pub(crate) fn extract_catalog(
    config: &AnalysisConfig,
    progress: Option<&ProgressReporter>,
) -> Result<TargetCatalog> {
    let runner = BazelRunner::new(&config.bazel_path, &config.workspace)
        .with_timeout(config.query_timeout);

    if let Some(p) = progress {
        p.start_enumeration();
    }

    let extractor = WorkspaceExtractor::new(&runner).with_include_tests(config.include_tests);
    let (catalog, _stats) = extractor.extract(progress)?;

    if let Some(p) = progress {
        p.finish_extraction(catalog.len());
    }

    Ok(catalog)
}
