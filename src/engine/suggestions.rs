//! Fix-suggestion catalog for cycle reports

use crate::catalog::TargetLabel;

use super::CycleKind;

/// Base suggestions for a cycle of the given kind.
pub fn for_kind(kind: CycleKind, cycle: &[TargetLabel]) -> Vec<String> {
    match kind {
        CycleKind::Direct => vec![
            format!(
                "Extract common interface into a new library (e.g. {})",
                extract_common_interface(cycle)
            ),
            "Use forward declarations to cut header coupling".to_string(),
            "Decouple the two targets by moving shared code out".to_string(),
        ],
        CycleKind::Diamond => vec![
            "Introduce interface layer between the converging targets".to_string(),
            "Apply dependency inversion at the convergence point".to_string(),
            "Extract a common base library".to_string(),
        ],
        CycleKind::Complex => vec![
            "Identify the pivot node carrying most of the cycle's edges".to_string(),
            "Consider restructuring the involved modules".to_string(),
            "Introduce a mediator target to break the mesh".to_string(),
        ],
        CycleKind::Simple => vec![
            "Audit the dependency declarations for correctness".to_string(),
            "Remove dependencies that are not needed".to_string(),
            "Reorganize the code layout".to_string(),
        ],
    }
}

/// Extra suggestions when the cycle touches test targets.
pub fn for_test_targets() -> Vec<String> {
    vec![
        "Move test-only dependencies to a testonly target".to_string(),
        "Replace direct dependencies with test stubs".to_string(),
    ]
}

/// Extra suggestions when the cycle touches external dependencies.
pub fn for_external_deps() -> Vec<String> {
    vec![
        "Check external dependency version compatibility".to_string(),
        "Consider pinning a different external version".to_string(),
    ]
}

/// Best-effort label for a shared interface library extracted from the
/// cycle members. Advisory only; the result is not guaranteed to be a
/// legal Bazel label.
pub fn extract_common_interface(targets: &[TargetLabel]) -> String {
    let Some(first) = targets.first() else {
        return "//common:interface".to_string();
    };

    let package = first.package();
    if package.is_empty() {
        return "//common:interface".to_string();
    }

    let last_segment = package.rsplit('/').next().unwrap_or(package);
    format!("//{package}:{last_segment}_interface")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_common_interface() {
        let targets = vec![TargetLabel::new("//pkg/sub:lib"), TargetLabel::new("//other:x")];
        assert_eq!(extract_common_interface(&targets), "//pkg/sub:sub_interface");
    }

    #[test]
    fn test_extract_common_interface_fallbacks() {
        assert_eq!(extract_common_interface(&[]), "//common:interface");
        assert_eq!(
            extract_common_interface(&[TargetLabel::new("//:root")]),
            "//common:interface"
        );
    }

    #[test]
    fn test_direct_suggestions_name_the_interface() {
        let cycle = vec![TargetLabel::new("//a:a"), TargetLabel::new("//b:b")];
        let suggestions = for_kind(CycleKind::Direct, &cycle);
        assert!(suggestions[0].contains("Extract common interface"));
        assert!(suggestions[0].contains("//a:a_interface"));
    }
}
