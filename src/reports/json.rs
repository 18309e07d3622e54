//! JSON format report generation
//!
//! The only format with a stable schema contract; see the integration
//! tests for the exact shape.

use std::io::Write;

use serde_json::json;

use crate::buildtime::BuildProfileSummary;
use crate::engine::{CycleAnalysis, RemovableDependency};
use crate::error::AnalyzerError;

use super::{confidence_counts, timestamp};

pub fn render_cycles(
    cycles: &[CycleAnalysis],
    writer: &mut dyn Write,
) -> Result<(), AnalyzerError> {
    let cycle_values: Vec<_> = cycles
        .iter()
        .enumerate()
        .map(|(i, cycle)| {
            json!({
                "id": i + 1,
                "type": cycle.kind().as_str(),
                "length": cycle.length(),
                "path": cycle.path(),
                "removable_dependencies": removable_values(cycle.removable_dependencies()),
                "suggestions": cycle.suggested_fixes(),
            })
        })
        .collect();

    let report = json!({
        "report": {
            "timestamp": timestamp(),
            "total_cycles": cycles.len(),
            "cycles": cycle_values,
        }
    });

    writeln!(writer, "{}", serde_json::to_string_pretty(&report)?)?;
    Ok(())
}

pub fn render_unused(
    unused: &[RemovableDependency],
    writer: &mut dyn Write,
) -> Result<(), AnalyzerError> {
    let (high, medium, low) = confidence_counts(unused);

    let report = json!({
        "unused_dependencies_report": {
            "timestamp": timestamp(),
            "total_unused": unused.len(),
            "unused_dependencies": removable_values(unused),
            "statistics": {
                "high_confidence": high,
                "medium_confidence": medium,
                "low_confidence": low,
            }
        }
    });

    writeln!(writer, "{}", serde_json::to_string_pretty(&report)?)?;
    Ok(())
}

pub fn render_build_profile(
    summary: &BuildProfileSummary,
    writer: &mut dyn Write,
) -> Result<(), AnalyzerError> {
    let phases: serde_json::Map<String, serde_json::Value> = summary
        .phase_times_ms
        .iter()
        .map(|(phase, ms)| (phase.clone(), json!(ms)))
        .collect();

    let top_targets: Vec<_> = summary
        .top_targets
        .iter()
        .map(|(target, ms)| json!({"target": target, "time_ms": ms}))
        .collect();

    let report = json!({
        "build_time_report": {
            "timestamp": timestamp(),
            "profile_file": summary.profile_file.display().to_string(),
            "total_build_time_ms": summary.total_build_time_ms,
            "build_phases": phases,
            "action_counts": &summary.action_counts,
            "total_actions": summary.total_actions,
            "cache_performance": {
                "hits": summary.cache_hits,
                "misses": summary.cache_misses,
                "hit_rate_percent": summary.cache_hit_rate_percent(),
            },
            "top_targets": top_targets,
        }
    });

    writeln!(writer, "{}", serde_json::to_string_pretty(&report)?)?;
    Ok(())
}

fn removable_values(deps: &[RemovableDependency]) -> Vec<serde_json::Value> {
    deps.iter()
        .map(|dep| {
            json!({
                "from": &dep.from,
                "to": &dep.to,
                "reason": &dep.reason,
                "confidence": dep.confidence.as_str(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::catalog::TargetLabel;
    use crate::engine::Confidence;

    fn removable(from: &str, to: &str, confidence: Confidence) -> RemovableDependency {
        RemovableDependency {
            from: TargetLabel::new(from),
            to: TargetLabel::new(to),
            reason: "No headers from this dependency are used".to_string(),
            confidence,
            unused_headers: vec![],
        }
    }

    #[test]
    fn test_empty_cycle_report_schema() {
        let mut out = Vec::new();
        render_cycles(&[], &mut out).unwrap();

        let value: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["report"]["total_cycles"], 0);
        assert!(value["report"]["cycles"].as_array().unwrap().is_empty());
        assert!(value["report"]["timestamp"].is_string());
    }

    #[test]
    fn test_unused_report_statistics() {
        let deps = vec![
            removable("//a:a", "//b:b", Confidence::High),
            removable("//a:a", "//c:c", Confidence::High),
            removable("//x:x", "//y:y", Confidence::Medium),
        ];

        let mut out = Vec::new();
        render_unused(&deps, &mut out).unwrap();

        let value: Value = serde_json::from_slice(&out).unwrap();
        let report = &value["unused_dependencies_report"];
        assert_eq!(report["total_unused"], 3);
        assert_eq!(report["statistics"]["high_confidence"], 2);
        assert_eq!(report["statistics"]["medium_confidence"], 1);
        assert_eq!(report["statistics"]["low_confidence"], 0);

        let first = &report["unused_dependencies"][0];
        assert_eq!(first["from"], "//a:a");
        assert_eq!(first["confidence"], "HIGH");
    }
}
