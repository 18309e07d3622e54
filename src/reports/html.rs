//! HTML format report generation

use std::io::Write;

use crate::buildtime::{format_duration_ms, BuildProfileSummary};
use crate::engine::{CycleAnalysis, RemovableDependency};
use crate::error::AnalyzerError;
use crate::utils::string::escape_html;

use super::{format_cycle_path, timestamp};

const STYLE: &str = r#"    body { font-family: Arial, sans-serif; margin: 20px; }
    .header { background: #f5f5f5; padding: 20px; border-radius: 5px; }
    .cycle { border: 1px solid #ddd; margin: 10px 0; padding: 15px; border-radius: 5px; }
    .cycle.small { border-left: 4px solid #e74c3c; }
    .cycle.medium { border-left: 4px solid #f39c12; }
    .cycle.large { border-left: 4px solid #27ae60; }
    .removable { background: #e8f5e8; padding: 8px; margin: 5px 0; border-radius: 3px; border-left: 3px solid #2ecc71; }
    .suggestion { background: #f8f9fa; padding: 8px; margin: 5px 0; border-radius: 3px; }
    .path { font-family: monospace; background: #f1f1f1; padding: 5px; }
    table { border-collapse: collapse; }
    td, th { border: 1px solid #ddd; padding: 6px 10px; }"#;

fn header(title: &str, writer: &mut dyn Write) -> Result<(), AnalyzerError> {
    writeln!(writer, "<!DOCTYPE html>")?;
    writeln!(writer, "<html lang=\"en\">")?;
    writeln!(writer, "<head>")?;
    writeln!(writer, "  <meta charset=\"UTF-8\">")?;
    writeln!(writer, "  <title>{}</title>", escape_html(title))?;
    writeln!(writer, "  <style>\n{STYLE}\n  </style>")?;
    writeln!(writer, "</head>")?;
    writeln!(writer, "<body>")?;
    writeln!(writer, "  <div class=\"header\">")?;
    writeln!(writer, "    <h1>{}</h1>", escape_html(title))?;
    writeln!(writer, "    <p><strong>Generated:</strong> {}</p>", timestamp())?;
    writeln!(writer, "  </div>")?;
    Ok(())
}

fn footer(writer: &mut dyn Write) -> Result<(), AnalyzerError> {
    writeln!(writer, "</body>")?;
    writeln!(writer, "</html>")?;
    Ok(())
}

pub fn render_cycles(
    cycles: &[CycleAnalysis],
    writer: &mut dyn Write,
) -> Result<(), AnalyzerError> {
    header("Dependency Cycle Report", writer)?;

    if cycles.is_empty() {
        writeln!(writer, "  <p>No dependency cycles detected.</p>")?;
        return footer(writer);
    }

    writeln!(writer, "  <p><strong>Cycles found:</strong> {}</p>", cycles.len())?;

    for (i, cycle) in cycles.iter().enumerate() {
        let size_class = match cycle.length() {
            0..=3 => "small",
            4..=5 => "medium",
            _ => "large",
        };

        writeln!(writer, "  <div class=\"cycle {size_class}\">")?;
        writeln!(
            writer,
            "    <h3>Cycle #{} - {}</h3>",
            i + 1,
            cycle.kind()
        )?;
        writeln!(
            writer,
            "    <p><strong>Path:</strong> <span class=\"path\">{}</span></p>",
            escape_html(&format_cycle_path(cycle.path()))
        )?;
        writeln!(
            writer,
            "    <p><strong>Length:</strong> {} targets</p>",
            cycle.length()
        )?;

        if !cycle.removable_dependencies().is_empty() {
            writeln!(writer, "    <div><strong>Safe to remove:</strong>")?;
            for dep in cycle.removable_dependencies() {
                writeln!(
                    writer,
                    "      <div class=\"removable\">{} → {} ({})</div>",
                    escape_html(dep.from.as_str()),
                    escape_html(dep.to.as_str()),
                    escape_html(&dep.reason)
                )?;
            }
            writeln!(writer, "    </div>")?;
        }

        if !cycle.suggested_fixes().is_empty() {
            writeln!(writer, "    <div><strong>Suggested fixes:</strong>")?;
            for fix in cycle.suggested_fixes() {
                writeln!(
                    writer,
                    "      <div class=\"suggestion\">{}</div>",
                    escape_html(fix)
                )?;
            }
            writeln!(writer, "    </div>")?;
        }

        writeln!(writer, "  </div>")?;
    }

    footer(writer)
}

pub fn render_unused(
    unused: &[RemovableDependency],
    writer: &mut dyn Write,
) -> Result<(), AnalyzerError> {
    header("Unused Dependency Report", writer)?;

    if unused.is_empty() {
        writeln!(writer, "  <p>No unused dependencies detected.</p>")?;
        return footer(writer);
    }

    writeln!(writer, "  <p><strong>Found:</strong> {}</p>", unused.len())?;
    writeln!(writer, "  <table>")?;
    writeln!(
        writer,
        "    <tr><th>From</th><th>To</th><th>Confidence</th><th>Reason</th></tr>"
    )?;
    for dep in unused {
        writeln!(
            writer,
            "    <tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape_html(dep.from.as_str()),
            escape_html(dep.to.as_str()),
            dep.confidence,
            escape_html(&dep.reason)
        )?;
    }
    writeln!(writer, "  </table>")?;

    footer(writer)
}

pub fn render_build_profile(
    summary: &BuildProfileSummary,
    writer: &mut dyn Write,
) -> Result<(), AnalyzerError> {
    header("Build Time Report", writer)?;

    if let Some(total) = summary.total_build_time_ms {
        writeln!(
            writer,
            "  <p><strong>Total build time:</strong> {}</p>",
            format_duration_ms(total)
        )?;
    }
    writeln!(
        writer,
        "  <p><strong>Actions:</strong> {}</p>",
        summary.total_actions
    )?;
    if let Some(rate) = summary.cache_hit_rate_percent() {
        writeln!(
            writer,
            "  <p><strong>Action cache hit rate:</strong> {rate:.1}%</p>"
        )?;
    }

    if !summary.top_targets.is_empty() {
        writeln!(writer, "  <h3>Slowest targets</h3>")?;
        writeln!(writer, "  <table>")?;
        writeln!(writer, "    <tr><th>Target</th><th>Time</th></tr>")?;
        for (target, ms) in &summary.top_targets {
            writeln!(
                writer,
                "    <tr><td>{}</td><td>{}</td></tr>",
                escape_html(target),
                format_duration_ms(*ms)
            )?;
        }
        writeln!(writer, "  </table>")?;
    }

    footer(writer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_structure() {
        let mut out = Vec::new();
        render_cycles(&[], &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("<!DOCTYPE html>"));
        assert!(text.contains("<title>Dependency Cycle Report</title>"));
        assert!(text.trim_end().ends_with("</html>"));
    }
}
