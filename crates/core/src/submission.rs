//! Submission records handed to the persistence layer

use crate::compiler::CompilationResult;
use eyre::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Mutex;

/// Score awarded for a submission that compiles
pub const PASSING_SCORE: u32 = 100;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionStatus {
    Compiled,
    Failed,
}

/// One code lab submission as stored by the application database
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecord {
    pub user_id: String,
    pub lesson_id: String,
    pub code: String,
    pub status: SubmissionStatus,
    pub score: u32,
    /// Compiler errors joined by newlines, if any
    pub feedback: Option<String>,
    /// Gas estimate as a decimal string
    pub gas_used: Option<String>,
    /// Snapshot of the compile outcome
    pub result: Value,
}

impl SubmissionRecord {
    pub fn from_result(
        user_id: impl Into<String>,
        lesson_id: impl Into<String>,
        code: impl Into<String>,
        result: &CompilationResult,
    ) -> Self {
        let (status, score) = if result.success {
            (SubmissionStatus::Compiled, PASSING_SCORE)
        } else {
            (SubmissionStatus::Failed, 0)
        };

        let feedback = (!result.errors.is_empty()).then(|| result.errors.join("\n"));

        Self {
            user_id: user_id.into(),
            lesson_id: lesson_id.into(),
            code: code.into(),
            status,
            score,
            feedback,
            gas_used: result.gas_estimate.map(|gas| gas.to_string()),
            result: json!({
                "compiled": result.success,
                "errors": result.errors,
                "warnings": result.warnings,
                "securityIssues": result.security_issues,
                "optimizationSuggestions": result.optimization_suggestions,
            }),
        }
    }
}

/// Persists submission records; implemented by the application's storage layer
pub trait SubmissionStore: Send + Sync {
    fn save(&self, record: &SubmissionRecord) -> Result<()>;
}

/// Keeps submissions in memory
#[derive(Debug, Default)]
pub struct InMemorySubmissionStore {
    records: Mutex<Vec<SubmissionRecord>>,
}

impl InMemorySubmissionStore {
    pub fn records(&self) -> Vec<SubmissionRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl SubmissionStore for InMemorySubmissionStore {
    fn save(&self, record: &SubmissionRecord) -> Result<()> {
        self.records
            .lock()
            .map_err(|_| eyre::eyre!("Submission store lock poisoned"))?
            .push(record.clone());
        tracing::debug!(
            "Stored submission for user {} lesson {}",
            record.user_id,
            record.lesson_id
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lint::{SecurityIssue, Severity};

    fn failed_result() -> CompilationResult {
        CompilationResult {
            success: false,
            errors: vec!["ParserError: a".to_string(), "TypeError: b".to_string()],
            warnings: vec!["Warning: c".to_string()],
            security_issues: vec![SecurityIssue {
                severity: Severity::Medium,
                message: "block.timestamp detected: can be manipulated by miners".to_string(),
                line: 4,
                kind: "security".to_string(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_successful_submission() {
        let result = CompilationResult {
            success: true,
            bytecode: Some("6080".to_string()),
            gas_estimate: Some(21_400),
            optimization_suggestions: vec!["hint".to_string()],
            ..Default::default()
        };

        let record = SubmissionRecord::from_result("user-1", "lesson-1", "contract C {}", &result);

        assert_eq!(record.status, SubmissionStatus::Compiled);
        assert_eq!(record.score, 100);
        assert_eq!(record.feedback, None);
        assert_eq!(record.gas_used.as_deref(), Some("21400"));
        assert_eq!(record.result["compiled"], true);
        assert_eq!(record.result["optimizationSuggestions"], json!(["hint"]));
    }

    #[test]
    fn test_failed_submission() {
        let record = SubmissionRecord::from_result("u", "l", "contract", &failed_result());

        assert_eq!(record.status, SubmissionStatus::Failed);
        assert_eq!(record.score, 0);
        assert_eq!(record.feedback.as_deref(), Some("ParserError: a\nTypeError: b"));
        assert_eq!(record.gas_used, None);
        assert_eq!(record.result["compiled"], false);
        assert_eq!(record.result["warnings"], json!(["Warning: c"]));
        assert_eq!(record.result["securityIssues"][0]["severity"], "medium");
        assert_eq!(record.result["securityIssues"][0]["type"], "security");
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&SubmissionStatus::Compiled).unwrap(),
            "\"COMPILED\""
        );
        assert_eq!(serde_json::to_string(&SubmissionStatus::Failed).unwrap(), "\"FAILED\"");
    }

    #[test]
    fn test_in_memory_store() {
        let store = InMemorySubmissionStore::default();
        let record = SubmissionRecord::from_result("u", "l", "c", &failed_result());

        store.save(&record).unwrap();
        store.save(&record).unwrap();

        assert_eq!(store.records().len(), 2);
        assert_eq!(store.records()[0], record);
    }
}
