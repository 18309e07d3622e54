//! Cycle detection executor

use console::style;
use miette::Result;

use crate::config::AnalysisConfig;
use crate::engine::CycleDetector;
use crate::graph::DependencyGraph;
use crate::progress::ProgressReporter;
use crate::reports;

use super::{extract_catalog, CommandExecutor};

pub struct CyclesExecutor;

impl CommandExecutor for CyclesExecutor {
    fn execute(config: &AnalysisConfig) -> Result<()> {
        eprintln!(
            "{} Checking for dependency cycles in {}...\n",
            style("🔍").cyan(),
            style(config.workspace.display()).bold()
        );

        let progress = ProgressReporter::when_interactive();
        let catalog = extract_catalog(config, progress.as_ref())?;

        if catalog.is_empty() {
            eprintln!("{} No C/C++ targets found to analyze", style("ℹ").blue());
            return Ok(());
        }

        let graph = DependencyGraph::from_catalog(&catalog);
        if let Some(p) = progress.as_ref() {
            p.start_cycle_detection();
        }

        let detector = CycleDetector::new(&catalog, &graph);
        let cycles = detector.analyze_cycles();

        if let Some(p) = progress.as_ref() {
            p.finish_cycle_detection(cycles.len());
        }

        let mut writer = reports::open_output(config.output.as_deref());
        reports::render_cycles(&cycles, config.format, writer.as_mut())?;

        Ok(())
    }
}
