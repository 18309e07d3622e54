//! Human-readable console report generation

use std::io::Write;

use console::style;

use crate::buildtime::{format_duration_ms, BuildProfileSummary};
use crate::engine::{CycleAnalysis, RemovableDependency};
use crate::error::AnalyzerError;
use crate::utils::string::pluralize;

use super::{format_cycle_path, timestamp};

const RULE: &str = "========================================";

pub fn render_cycles(
    cycles: &[CycleAnalysis],
    writer: &mut dyn Write,
) -> Result<(), AnalyzerError> {
    if cycles.is_empty() {
        writeln!(
            writer,
            "{} No dependency cycles detected.",
            style("✓").green().bold()
        )?;
        return Ok(());
    }

    writeln!(writer, "{RULE}")?;
    writeln!(writer, "  Dependency Cycle Report")?;
    writeln!(writer, "  Generated: {}", timestamp())?;
    writeln!(
        writer,
        "  Found {} {}",
        cycles.len(),
        pluralize("cycle", cycles.len())
    )?;
    writeln!(writer, "{RULE}\n")?;

    for (i, cycle) in cycles.iter().enumerate() {
        writeln!(writer, "Cycle #{}:", i + 1)?;
        writeln!(writer, "├─ Kind: {}", style(cycle.kind()).yellow())?;
        writeln!(writer, "├─ Path: {}", format_cycle_path(cycle.path()))?;
        writeln!(
            writer,
            "├─ Length: {} {}",
            cycle.length(),
            pluralize("target", cycle.length())
        )?;

        if !cycle.removable_dependencies().is_empty() {
            writeln!(writer, "├─ Safe to remove:")?;
            for (j, dep) in cycle.removable_dependencies().iter().enumerate() {
                writeln!(
                    writer,
                    "│    {}. {} → {} ({})",
                    j + 1,
                    style(&dep.from).bold(),
                    style(&dep.to).bold(),
                    dep.reason
                )?;
            }
        }

        if cycle.suggested_fixes().is_empty() {
            writeln!(writer, "└─ No fix suggestions")?;
        } else {
            writeln!(writer, "└─ Suggested fixes:")?;
            for (j, fix) in cycle.suggested_fixes().iter().enumerate() {
                writeln!(writer, "     {}. {fix}", j + 1)?;
            }
        }
        writeln!(writer)?;
    }

    let total_removable: usize = cycles
        .iter()
        .map(|c| c.removable_dependencies().len())
        .sum();

    writeln!(writer, "{RULE}")?;
    writeln!(writer, "Summary:")?;
    if total_removable > 0 {
        writeln!(
            writer,
            "- {total_removable} {} can be removed safely; removing one per cycle breaks it",
            pluralize("dependency", total_removable)
        )?;
    }
    writeln!(writer, "- Start with the shortest cycles; they are listed first")?;
    writeln!(writer, "- Direct cycles are usually the quickest to fix")?;
    writeln!(writer, "{RULE}")?;

    Ok(())
}

pub fn render_unused(
    unused: &[RemovableDependency],
    writer: &mut dyn Write,
) -> Result<(), AnalyzerError> {
    if unused.is_empty() {
        writeln!(
            writer,
            "{} No unused dependencies detected.",
            style("✓").green().bold()
        )?;
        return Ok(());
    }

    writeln!(writer, "{RULE}")?;
    writeln!(writer, "  Unused Dependency Report")?;
    writeln!(writer, "  Generated: {}", timestamp())?;
    writeln!(
        writer,
        "  Found {} unused {}",
        unused.len(),
        pluralize("dependency", unused.len())
    )?;
    writeln!(writer, "{RULE}\n")?;

    for (i, dep) in unused.iter().enumerate() {
        writeln!(
            writer,
            "{}. {} → {} [{}]",
            i + 1,
            style(&dep.from).bold(),
            style(&dep.to).bold(),
            style(dep.confidence).cyan()
        )?;
        writeln!(writer, "   {}", dep.reason)?;
        if !dep.unused_headers.is_empty() {
            writeln!(writer, "   Unused headers: {}", dep.unused_headers.join(", "))?;
        }
    }

    Ok(())
}

pub fn render_build_profile(
    summary: &BuildProfileSummary,
    writer: &mut dyn Write,
) -> Result<(), AnalyzerError> {
    writeln!(writer, "{RULE}")?;
    writeln!(writer, "  Build Time Report")?;
    writeln!(writer, "  Generated: {}", timestamp())?;
    writeln!(writer, "  Profile: {}", summary.profile_file.display())?;
    writeln!(writer, "{RULE}\n")?;

    if let Some(total) = summary.total_build_time_ms {
        writeln!(writer, "Total build time: {}", format_duration_ms(total))?;
    }

    if !summary.phase_times_ms.is_empty() {
        writeln!(writer, "\nBuild phases:")?;
        for (phase, ms) in &summary.phase_times_ms {
            writeln!(writer, "  {phase}: {}", format_duration_ms(*ms))?;
        }
    }

    writeln!(writer, "\nActions: {} total", summary.total_actions)?;
    for (category, count) in &summary.action_counts {
        writeln!(writer, "  {category}: {count}")?;
    }

    if let Some(rate) = summary.cache_hit_rate_percent() {
        writeln!(writer, "\nAction cache hit rate: {rate:.1}%")?;
    }

    if !summary.top_targets.is_empty() {
        writeln!(writer, "\nSlowest targets:")?;
        for (i, (target, ms)) in summary.top_targets.iter().enumerate() {
            writeln!(
                writer,
                "  {}. {} ({})",
                i + 1,
                style(target).bold(),
                format_duration_ms(*ms)
            )?;
        }
    }

    Ok(())
}
