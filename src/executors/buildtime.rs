//! Build-time profile analysis executor

use console::style;
use miette::Result;

use crate::buildtime::BuildTimeAnalyzer;
use crate::config::AnalysisConfig;
use crate::extractor::BazelRunner;
use crate::reports;

use super::CommandExecutor;

pub struct BuildTimeExecutor;

impl CommandExecutor for BuildTimeExecutor {
    fn execute(config: &AnalysisConfig) -> Result<()> {
        eprintln!(
            "{} Profiling build of {}...\n",
            style("⏱").cyan(),
            style(config.workspace.display()).bold()
        );

        let runner = BazelRunner::new(&config.bazel_path, &config.workspace)
            .with_timeout(config.query_timeout);
        runner.validate_environment()?;

        // The profiled build gets its own, far longer, ceiling.
        let build_runner = BazelRunner::new(&config.bazel_path, &config.workspace)
            .with_timeout(crate::constants::profile::BUILD_TIMEOUT);
        let analyzer = BuildTimeAnalyzer::new(&build_runner);
        let profile_path = analyzer.create_profile("//...")?;
        let summary = analyzer.analyze_profile(&profile_path)?;

        let mut writer = reports::open_output(config.output.as_deref());
        reports::render_build_profile(&summary, config.format, writer.as_mut())?;

        Ok(())
    }
}
