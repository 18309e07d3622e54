//! Report rendering
//!
//! Four interchangeable output formats sharing one input shape. The
//! format is a plain tag and the renderers are plain functions over
//! `io::Write`; there is no generator hierarchy.

pub mod console;
pub mod html;
pub mod json;
pub mod markdown;

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use tracing::warn;

use crate::buildtime::BuildProfileSummary;
use crate::engine::{CycleAnalysis, RemovableDependency};
use crate::error::AnalyzerError;

/// Output format tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Console,
    Markdown,
    Json,
    Html,
}

impl ReportFormat {
    /// Parse a user-supplied format name. Unknown names fall back to
    /// console output with a warning rather than failing the run.
    pub fn parse_or_warn(name: &str) -> Self {
        match name {
            "console" | "text" => ReportFormat::Console,
            "markdown" | "md" => ReportFormat::Markdown,
            "json" => ReportFormat::Json,
            "html" => ReportFormat::Html,
            other => {
                warn!(format = other, "unknown output format, using console");
                eprintln!("Warning: unknown output format '{other}', using console");
                ReportFormat::Console
            }
        }
    }
}

/// Render the cycle report in the requested format.
pub fn render_cycles(
    cycles: &[CycleAnalysis],
    format: ReportFormat,
    writer: &mut dyn Write,
) -> Result<(), AnalyzerError> {
    match format {
        ReportFormat::Console => console::render_cycles(cycles, writer),
        ReportFormat::Markdown => markdown::render_cycles(cycles, writer),
        ReportFormat::Json => json::render_cycles(cycles, writer),
        ReportFormat::Html => html::render_cycles(cycles, writer),
    }
}

/// Render the unused-dependency report in the requested format.
pub fn render_unused(
    unused: &[RemovableDependency],
    format: ReportFormat,
    writer: &mut dyn Write,
) -> Result<(), AnalyzerError> {
    match format {
        ReportFormat::Console => console::render_unused(unused, writer),
        ReportFormat::Markdown => markdown::render_unused(unused, writer),
        ReportFormat::Json => json::render_unused(unused, writer),
        ReportFormat::Html => html::render_unused(unused, writer),
    }
}

/// Render the build-time profile report in the requested format.
pub fn render_build_profile(
    summary: &BuildProfileSummary,
    format: ReportFormat,
    writer: &mut dyn Write,
) -> Result<(), AnalyzerError> {
    match format {
        ReportFormat::Console => console::render_build_profile(summary, writer),
        ReportFormat::Markdown => markdown::render_build_profile(summary, writer),
        ReportFormat::Json => json::render_build_profile(summary, writer),
        ReportFormat::Html => html::render_build_profile(summary, writer),
    }
}

/// Open the report destination: the given file, or stdout when no path
/// is set. A file that cannot be opened degrades to stdout with a
/// warning instead of failing the run.
pub fn open_output(path: Option<&Path>) -> Box<dyn Write> {
    match path {
        Some(path) => match File::create(path) {
            Ok(file) => Box::new(file),
            Err(e) => {
                warn!(file = %path.display(), error = %e, "cannot open output file, writing to stdout");
                eprintln!(
                    "Warning: cannot open output file '{}': {e}; writing to stdout",
                    path.display()
                );
                Box::new(io::stdout())
            }
        },
        None => Box::new(io::stdout()),
    }
}

pub(crate) fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Join a cycle path for display: `//a:a -> //b:b -> //a:a`.
pub(crate) fn format_cycle_path(path: &[crate::catalog::TargetLabel]) -> String {
    path.iter()
        .map(|label| label.as_str())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Removable-dependency counts grouped by confidence: (high, medium, low).
pub(crate) fn confidence_counts(unused: &[RemovableDependency]) -> (usize, usize, usize) {
    use crate::engine::Confidence;

    let mut counts = (0, 0, 0);
    for dep in unused {
        match dep.confidence {
            Confidence::High => counts.0 += 1,
            Confidence::Medium => counts.1 += 1,
            Confidence::Low => counts.2 += 1,
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_formats() {
        assert_eq!(ReportFormat::parse_or_warn("console"), ReportFormat::Console);
        assert_eq!(ReportFormat::parse_or_warn("markdown"), ReportFormat::Markdown);
        assert_eq!(ReportFormat::parse_or_warn("md"), ReportFormat::Markdown);
        assert_eq!(ReportFormat::parse_or_warn("json"), ReportFormat::Json);
        assert_eq!(ReportFormat::parse_or_warn("html"), ReportFormat::Html);
    }

    #[test]
    fn test_unknown_format_falls_back_to_console() {
        assert_eq!(ReportFormat::parse_or_warn("yaml"), ReportFormat::Console);
    }

    #[test]
    fn test_open_output_falls_back_to_stdout() {
        // A path inside a nonexistent directory cannot be created.
        let sink = open_output(Some(Path::new("/nonexistent-dir/report.txt")));
        drop(sink);
    }
}
