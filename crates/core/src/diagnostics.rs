//! Splits compiler diagnostics into errors and warnings

use crate::standard_json::Diagnostic;

/// Diagnostics partitioned by severity, in compiler order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitDiagnostics {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Anything that is not an `error` is reported as a warning
pub fn split(diagnostics: &[Diagnostic]) -> SplitDiagnostics {
    let mut split = SplitDiagnostics::default();
    for diagnostic in diagnostics {
        let text = diagnostic.text().to_string();
        if diagnostic.is_error() {
            split.errors.push(text);
        } else {
            split.warnings.push(text);
        }
    }
    split
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diagnostic(severity: &str, text: &str) -> Diagnostic {
        Diagnostic {
            severity: severity.to_string(),
            message: text.to_string(),
            formatted_message: Some(format!("{severity}: {text}")),
            kind: None,
        }
    }

    #[test]
    fn test_split_preserves_order_and_drops_nothing() {
        let diagnostics = vec![
            diagnostic("warning", "a"),
            diagnostic("error", "b"),
            diagnostic("info", "c"),
            diagnostic("error", "d"),
        ];

        let split = split(&diagnostics);
        assert_eq!(split.errors, vec!["error: b", "error: d"]);
        assert_eq!(split.warnings, vec!["warning: a", "info: c"]);
        assert_eq!(split.errors.len() + split.warnings.len(), diagnostics.len());
    }

    #[test]
    fn test_split_empty() {
        assert_eq!(split(&[]), SplitDiagnostics::default());
    }
}
