//! Markdown format report generation

use std::io::Write;

use crate::buildtime::{format_duration_ms, BuildProfileSummary};
use crate::engine::{CycleAnalysis, RemovableDependency};
use crate::error::AnalyzerError;

use super::{format_cycle_path, timestamp};

pub fn render_cycles(
    cycles: &[CycleAnalysis],
    writer: &mut dyn Write,
) -> Result<(), AnalyzerError> {
    writeln!(writer, "# Dependency Cycle Report\n")?;
    writeln!(writer, "- **Generated**: {}", timestamp())?;
    writeln!(writer, "- **Cycles found**: {}\n", cycles.len())?;

    if cycles.is_empty() {
        writeln!(writer, "No dependency cycles detected.")?;
        return Ok(());
    }

    writeln!(writer, "## Cycles\n")?;

    for (i, cycle) in cycles.iter().enumerate() {
        writeln!(writer, "### Cycle #{}\n", i + 1)?;
        writeln!(writer, "- **Kind**: `{}`", cycle.kind())?;
        writeln!(writer, "- **Path**: `{}`", format_cycle_path(cycle.path()))?;
        writeln!(writer, "- **Length**: {} targets", cycle.length())?;

        if !cycle.removable_dependencies().is_empty() {
            writeln!(writer, "- **Safe to remove**:")?;
            for dep in cycle.removable_dependencies() {
                writeln!(
                    writer,
                    "  - `{}` → `{}` ({})",
                    dep.from, dep.to, dep.reason
                )?;
            }
        }

        if !cycle.suggested_fixes().is_empty() {
            writeln!(writer, "- **Suggested fixes**:")?;
            for fix in cycle.suggested_fixes() {
                writeln!(writer, "  - {fix}")?;
            }
        }
        writeln!(writer)?;
    }

    // Group by size so readers know where to start.
    let small = cycles.iter().filter(|c| c.length() <= 3).count();
    let medium = cycles.iter().filter(|c| (4..=5).contains(&c.length())).count();
    let large = cycles.iter().filter(|c| c.length() > 5).count();

    writeln!(writer, "## Priority\n")?;
    writeln!(writer, "| Priority | Cycle size | Count | Notes |")?;
    writeln!(writer, "|----------|------------|-------|-------|")?;
    writeln!(
        writer,
        "| High | small (2-3 targets) | {small} | easy to fix, start here |"
    )?;
    writeln!(
        writer,
        "| Medium | medium (4-5 targets) | {medium} | needs some refactoring |"
    )?;
    writeln!(
        writer,
        "| Low | large (6+ targets) | {large} | may need architectural changes |"
    )?;

    Ok(())
}

pub fn render_unused(
    unused: &[RemovableDependency],
    writer: &mut dyn Write,
) -> Result<(), AnalyzerError> {
    writeln!(writer, "# Unused Dependency Report\n")?;
    writeln!(writer, "- **Generated**: {}", timestamp())?;
    writeln!(writer, "- **Unused dependencies found**: {}\n", unused.len())?;

    if unused.is_empty() {
        writeln!(writer, "No unused dependencies detected.")?;
        return Ok(());
    }

    writeln!(writer, "| From | To | Confidence | Reason |")?;
    writeln!(writer, "|------|----|-----------|--------|")?;
    for dep in unused {
        writeln!(
            writer,
            "| `{}` | `{}` | {} | {} |",
            dep.from, dep.to, dep.confidence, dep.reason
        )?;
    }

    Ok(())
}

pub fn render_build_profile(
    summary: &BuildProfileSummary,
    writer: &mut dyn Write,
) -> Result<(), AnalyzerError> {
    writeln!(writer, "# Build Time Report\n")?;
    writeln!(writer, "- **Generated**: {}", timestamp())?;
    writeln!(writer, "- **Profile**: `{}`", summary.profile_file.display())?;
    if let Some(total) = summary.total_build_time_ms {
        writeln!(writer, "- **Total build time**: {}", format_duration_ms(total))?;
    }
    writeln!(writer, "- **Actions**: {}\n", summary.total_actions)?;

    if !summary.phase_times_ms.is_empty() {
        writeln!(writer, "## Phases\n")?;
        writeln!(writer, "| Phase | Time |")?;
        writeln!(writer, "|-------|------|")?;
        for (phase, ms) in &summary.phase_times_ms {
            writeln!(writer, "| {phase} | {} |", format_duration_ms(*ms))?;
        }
        writeln!(writer)?;
    }

    if let Some(rate) = summary.cache_hit_rate_percent() {
        writeln!(writer, "Action cache hit rate: **{rate:.1}%**\n")?;
    }

    if !summary.top_targets.is_empty() {
        writeln!(writer, "## Slowest targets\n")?;
        writeln!(writer, "| Target | Time |")?;
        writeln!(writer, "|--------|------|")?;
        for (target, ms) in &summary.top_targets {
            writeln!(writer, "| `{target}` | {} |", format_duration_ms(*ms))?;
        }
    }

    Ok(())
}
