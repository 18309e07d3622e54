//! Parsing of `bazel query` output
//!
//! Free functions turning raw query output into labels and rule kinds.
//! Bazel mixes progress chatter into both streams, so every splitter
//! drops `Loading:` and `INFO:` lines before interpreting anything.

use crate::catalog::TargetLabel;
use crate::constants::bazel;

/// Split query output into meaningful lines, dropping empty lines and
/// Bazel progress noise.
pub fn split_lines(output: &str) -> Vec<&str> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| {
            !line.is_empty() && !line.contains("Loading:") && !line.contains("INFO:")
        })
        .collect()
}

/// Parse one `--output=label_kind` line of the shape
/// `<rule_kind> rule <label>`.
pub fn parse_label_kind_line(line: &str) -> Option<(String, TargetLabel)> {
    let mut parts = line.split_whitespace();
    let rule_kind = parts.next()?;
    let rule_word = parts.next()?;
    let label = parts.next()?;

    if rule_word != "rule" {
        return None;
    }

    Some((rule_kind.to_string(), TargetLabel::new(label)))
}

/// Extract the rule kind from `kind(rule, <label>)` output, falling back
/// to `unknown` when no label_kind line is present.
pub fn extract_rule_kind(output: &str) -> String {
    split_lines(output)
        .into_iter()
        .find_map(|line| parse_label_kind_line(line).map(|(kind, _)| kind))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Clean up a dependency query result: drop the target's own label and,
/// unless externals are retained, every `@`-prefixed label.
pub fn extract_dependencies(output: &str, own_label: &TargetLabel) -> Vec<TargetLabel> {
    split_lines(output)
        .into_iter()
        .map(TargetLabel::new)
        .filter(|label| label != own_label)
        .filter(|label| bazel::KEEP_EXTERNAL_DEPS || !label.starts_with_external())
        .collect()
}

/// Parse a plain `--output=label` listing.
pub fn extract_labels(output: &str) -> Vec<TargetLabel> {
    split_lines(output).into_iter().map(TargetLabel::new).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_lines_filters_noise() {
        let output = "\
Loading: 3 packages loaded
//a:a
INFO: Analyzed 2 targets

//b:b
";
        assert_eq!(split_lines(output), vec!["//a:a", "//b:b"]);
    }

    #[test]
    fn test_parse_label_kind_line() {
        let (kind, label) = parse_label_kind_line("cc_library rule //pkg:lib").unwrap();
        assert_eq!(kind, "cc_library");
        assert_eq!(label.as_str(), "//pkg:lib");
    }

    #[test]
    fn test_parse_label_kind_rejects_non_rule_lines() {
        assert!(parse_label_kind_line("source file //pkg:lib.cc").is_none());
        assert!(parse_label_kind_line("cc_library").is_none());
    }

    #[test]
    fn test_extract_rule_kind_fallback() {
        assert_eq!(extract_rule_kind("cc_test rule //a:a_test"), "cc_test");
        assert_eq!(extract_rule_kind("Loading: 1 package"), "unknown");
        assert_eq!(extract_rule_kind(""), "unknown");
    }

    #[test]
    fn test_extract_dependencies_drops_self_and_externals() {
        let own = TargetLabel::new("//a:a");
        let output = "//a:a\n//b:b\n@ext//:lib\n//c:c\n";

        let deps = extract_dependencies(output, &own);
        assert_eq!(
            deps,
            vec![TargetLabel::new("//b:b"), TargetLabel::new("//c:c")]
        );
    }

    #[test]
    fn test_extract_labels() {
        let labels = extract_labels("//a:a\nINFO: done\n//b:b\n");
        assert_eq!(
            labels,
            vec![TargetLabel::new("//a:a"), TargetLabel::new("//b:b")]
        );
    }
}
