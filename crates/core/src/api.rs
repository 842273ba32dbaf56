//! Compile route boundary
//!
//! Maps a request body onto a compile call and the result onto an HTTP
//! status plus JSON body. The transport itself belongs to the host
//! application.

use crate::{
    compiler::{CompilationResult, CompileRequest, SolidityCompiler},
    submission::{SubmissionRecord, SubmissionStore},
};
use eyre::{Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};

/// JSON body accepted by the compile route
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileRequestBody {
    #[serde(default)]
    pub source_code: Option<String>,
    #[serde(default)]
    pub contract_name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub optimize: Option<bool>,
}

/// Who submitted the code and where to record it
pub struct SubmissionContext<'a> {
    pub user_id: &'a str,
    pub lesson_id: &'a str,
    pub store: &'a dyn SubmissionStore,
}

/// Status code and body for the host framework to send
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Handles one compile request
///
/// An empty `sourceCode` is rejected with 400 before anything is compiled.
/// Compiler failures are part of a 200 response; only failures of the
/// handler itself (such as persisting the submission) produce a 500.
pub fn handle_compile(
    compiler: &SolidityCompiler,
    body: CompileRequestBody,
    submission: Option<&SubmissionContext<'_>>,
) -> ApiResponse {
    let source_code = match body.source_code {
        Some(source) if !source.is_empty() => source,
        _ => {
            return ApiResponse {
                status: 400,
                body: json!({ "success": false, "error": "Source code is required" }),
            }
        }
    };

    let request = CompileRequest {
        source_code,
        contract_name: body.contract_name,
        version: body.version,
        optimize: body.optimize,
    };
    let result = compiler.compile(&request);

    match respond(&request, &result, submission) {
        Ok(body) => ApiResponse { status: 200, body },
        Err(e) => {
            tracing::error!("Compile route failed: {:#}", e);
            ApiResponse {
                status: 500,
                body: json!({
                    "success": false,
                    "error": "Compilation failed",
                    "errors": [format!("{e:#}")],
                }),
            }
        }
    }
}

fn respond(
    request: &CompileRequest,
    result: &CompilationResult,
    submission: Option<&SubmissionContext<'_>>,
) -> Result<Value> {
    if let Some(ctx) = submission {
        let record =
            SubmissionRecord::from_result(ctx.user_id, ctx.lesson_id, &request.source_code, result);
        ctx.store
            .save(&record)
            .context("Failed to save submission")?;
    }

    Ok(json!({
        "success": result.success,
        "bytecode": result.bytecode,
        "abi": result.abi,
        "errors": result.errors,
        "warnings": result.warnings,
        "gasEstimate": result.gas_estimate,
        "securityIssues": result.security_issues,
        "optimizationSuggestions": result.optimization_suggestions,
    }))
}
