//! Heuristic lint pass over raw Solidity source
//!
//! Everything here is lexical pattern matching. It has no notion of scopes,
//! comments, string literals or reachability and must not be presented as a
//! static analyzer.

pub mod optimization;
pub mod security;

pub use security::{SecurityIssue, Severity};

use serde::Serialize;

/// Combined output of the lint pass
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LintReport {
    pub security_issues: Vec<SecurityIssue>,
    pub optimization_suggestions: Vec<String>,
}

impl LintReport {
    pub fn is_clean(&self) -> bool {
        self.security_issues.is_empty() && self.optimization_suggestions.is_empty()
    }

    /// Highest severity among the security issues
    pub fn max_severity(&self) -> Option<Severity> {
        self.security_issues.iter().map(|i| i.severity).max()
    }
}

/// Runs the security rules and optimization hints over `source`
pub fn run(source: &str) -> LintReport {
    let report = LintReport {
        security_issues: security::scan(source),
        optimization_suggestions: optimization::advise(source),
    };

    tracing::debug!(
        "Lint pass found {} security issues and {} optimization hints",
        report.security_issues.len(),
        report.optimization_suggestions.len()
    );

    report
}
