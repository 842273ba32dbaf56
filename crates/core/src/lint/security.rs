//! Lexical security rules
//!
//! Each rule is a regular expression run over the raw source text. Matches
//! inside comments or string literals are reported like any other match.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Issue severity, ordered from least to most severe
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        f.write_str(name)
    }
}

/// A flagged pattern in the submitted source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SecurityIssue {
    pub severity: Severity,
    pub message: String,
    /// 1-indexed line of the first match
    pub line: usize,
    #[serde(rename = "type")]
    pub kind: String,
}

pub const ISSUE_KIND: &str = "security";

/// A single entry of the rule table
pub struct SecurityRule {
    pub id: &'static str,
    pub pattern: Regex,
    pub severity: Severity,
    pub message: &'static str,
}

fn rule(id: &'static str, pattern: &str, severity: Severity, message: &'static str) -> SecurityRule {
    SecurityRule {
        id,
        pattern: Regex::new(pattern).expect("valid security rule pattern"),
        severity,
        message,
    }
}

/// Rule table, evaluated in declaration order
pub static RULES: Lazy<Vec<SecurityRule>> = Lazy::new(|| {
    vec![
        rule(
            "tx-origin",
            r"\btx\.origin\b",
            Severity::High,
            "tx.origin detected: using it for authentication is vulnerable to phishing",
        ),
        rule(
            "block-timestamp",
            r"\bblock\.timestamp\b",
            Severity::Medium,
            "block.timestamp detected: can be manipulated by miners",
        ),
        rule(
            "low-level-call",
            r"\.call\s*(?:\{\s*value\s*:|\.value\s*\()",
            Severity::Medium,
            "Low-level call with value detected: should be avoided when possible",
        ),
        rule(
            "selfdestruct",
            r"\bselfdestruct\s*\(",
            Severity::High,
            "selfdestruct detected: dangerous and deprecated",
        ),
    ]
});

/// Runs every rule against `source`, emitting at most one issue per rule
pub fn scan(source: &str) -> Vec<SecurityIssue> {
    RULES
        .iter()
        .filter_map(|rule| {
            let found = rule.pattern.find(source)?;
            let line = line_of(source, found.start());
            tracing::debug!("Security rule {} matched at line {}", rule.id, line);
            Some(SecurityIssue {
                severity: rule.severity,
                message: rule.message.to_string(),
                line,
                kind: ISSUE_KIND.to_string(),
            })
        })
        .collect()
}

/// 1-indexed line containing byte `offset`
fn line_of(source: &str, offset: usize) -> usize {
    source[..offset].matches('\n').count() + 1
}
