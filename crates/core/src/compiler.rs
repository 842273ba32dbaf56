//! End-to-end compile requests

use crate::{
    config::LabConfig,
    diagnostics,
    error::LabError,
    gas,
    lint::{self, SecurityIssue},
    registry::CompilerRegistry,
    solc::SolcLoader,
    standard_json::{OptimizerSettings, StandardJsonInput, StandardJsonOutput},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    time::Instant,
};

/// Name of the single source unit submitted to the compiler
pub const SOURCE_UNIT: &str = "Contract.sol";

/// One compile request; unset fields fall back to the configured defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CompileRequest {
    pub source_code: String,
    pub contract_name: Option<String>,
    pub version: Option<String>,
    pub optimize: Option<bool>,
}

impl CompileRequest {
    pub fn new(source_code: impl Into<String>) -> Self {
        Self {
            source_code: source_code.into(),
            ..Default::default()
        }
    }

    pub fn contract_name(mut self, name: impl Into<String>) -> Self {
        self.contract_name = Some(name.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn optimize(mut self, optimize: bool) -> Self {
        self.optimize = Some(optimize);
        self
    }
}

/// Outcome of a compile request
///
/// Warnings and lint findings are filled in whether or not compilation
/// succeeded.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompilationResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytecode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abi: Option<Vec<Value>>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_estimate: Option<u64>,
    pub security_issues: Vec<SecurityIssue>,
    pub optimization_suggestions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<CompilationFailure>,
}

/// Why a compile did not succeed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CompilationFailure {
    /// The source has error-severity diagnostics
    #[error("Compilation produced {count} error(s)")]
    Diagnostics { count: usize },

    #[error("Compiler version {version} is unavailable: {reason}")]
    CompilerUnavailable { version: String, reason: String },

    /// The compiler response could not be parsed
    #[error("Invalid compiler output: {reason}")]
    InvalidOutput { reason: String },

    #[error("Compiler invocation failed: {reason}")]
    Invocation { reason: String },
}

impl CompilationFailure {
    /// Infrastructure failures may succeed on a later attempt, source errors never do
    pub fn is_retryable(&self) -> bool {
        !matches!(self, CompilationFailure::Diagnostics { .. })
    }
}

impl From<LabError> for CompilationFailure {
    fn from(error: LabError) -> Self {
        match error {
            LabError::CompilerUnavailable { version, reason } => {
                CompilationFailure::CompilerUnavailable { version, reason }
            }
            LabError::MalformedOutput(e) => CompilationFailure::InvalidOutput {
                reason: e.to_string(),
            },
            other => CompilationFailure::Invocation {
                reason: other.to_string(),
            },
        }
    }
}

impl CompilationResult {
    /// Result for a request that never produced compiler output
    fn failed(failure: CompilationFailure) -> Self {
        Self {
            success: false,
            errors: vec![failure.to_string()],
            failure: Some(failure),
            ..Default::default()
        }
    }

    /// Normalizes compiler output for `contract_name`
    fn from_output(output: &StandardJsonOutput, contract_name: &str) -> Self {
        let split = diagnostics::split(&output.errors);
        let success = split.errors.is_empty();

        let contract = output.contract(SOURCE_UNIT, contract_name);
        if contract.is_none() {
            tracing::debug!("Contract {} not found in compiler output", contract_name);
        }
        let bytecode = contract.and_then(|c| c.bytecode()).map(str::to_string);
        let abi = contract.and_then(|c| c.abi.clone());
        let gas_estimate = bytecode.as_deref().and_then(gas::estimate);

        let failure = (!success).then(|| CompilationFailure::Diagnostics {
            count: split.errors.len(),
        });

        Self {
            success,
            bytecode,
            abi,
            errors: split.errors,
            warnings: split.warnings,
            gas_estimate,
            security_issues: Vec::new(),
            optimization_suggestions: Vec::new(),
            failure,
        }
    }
}

/// Effective settings of a compile request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedRequest<'a> {
    pub contract_name: &'a str,
    pub version: &'a str,
    pub optimizer: OptimizerSettings,
}

/// Compiles submissions through a shared compiler registry
#[derive(Debug, Clone)]
pub struct SolidityCompiler {
    registry: Arc<CompilerRegistry>,
    config: LabConfig,
}

impl SolidityCompiler {
    pub fn new(registry: Arc<CompilerRegistry>, config: LabConfig) -> Self {
        Self { registry, config }
    }

    /// Uses native `solc` binaries discovered per `config.solc`
    pub fn from_config(config: LabConfig) -> Self {
        let loader = SolcLoader::new(
            config.solc.compilers_dir.clone(),
            config.solc.fallback_binary.clone(),
        );
        Self::new(Arc::new(CompilerRegistry::new(loader)), config)
    }

    pub fn registry(&self) -> &Arc<CompilerRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &LabConfig {
        &self.config
    }

    /// Settings `compile` will use for `request`: trimmed values, with unset or
    /// blank fields replaced by the configured defaults
    pub fn resolve<'a>(&'a self, request: &'a CompileRequest) -> ResolvedRequest<'a> {
        ResolvedRequest {
            contract_name: non_empty(request.contract_name.as_deref())
                .unwrap_or(&self.config.default_contract_name),
            version: non_empty(request.version.as_deref()).unwrap_or(&self.config.default_version),
            optimizer: OptimizerSettings {
                enabled: request.optimize.unwrap_or(self.config.optimizer.enabled),
                runs: self.config.optimizer.runs,
            },
        }
    }

    /// Compiles `request`; every failure is reported inside the result
    pub fn compile(&self, request: &CompileRequest) -> CompilationResult {
        let start = Instant::now();
        let ResolvedRequest {
            contract_name,
            version,
            optimizer,
        } = self.resolve(request);
        let optimize = optimizer.enabled;

        tracing::info!(
            "Compiling {} with solc {} (optimize={})",
            contract_name,
            version,
            optimize
        );

        let mut result = match self.invoke(&request.source_code, version, optimize) {
            Ok(output) => CompilationResult::from_output(&output, contract_name),
            Err(failure) => {
                tracing::warn!("Compilation aborted: {}", failure);
                CompilationResult::failed(failure)
            }
        };

        let report = lint::run(&request.source_code);
        result.security_issues = report.security_issues;
        result.optimization_suggestions = report.optimization_suggestions;

        tracing::info!(
            "Compilation of {} finished in {:.2}s: success={}, {} error(s), {} warning(s)",
            contract_name,
            start.elapsed().as_secs_f64(),
            result.success,
            result.errors.len(),
            result.warnings.len()
        );

        result
    }

    /// Builds the standard JSON input document for one request
    pub fn build_input(&self, source_code: &str, optimize: bool) -> StandardJsonInput {
        StandardJsonInput::new(
            SOURCE_UNIT,
            source_code,
            OptimizerSettings {
                enabled: optimize,
                runs: self.config.optimizer.runs,
            },
        )
    }

    fn invoke(
        &self,
        source_code: &str,
        version: &str,
        optimize: bool,
    ) -> Result<StandardJsonOutput, CompilationFailure> {
        let input = serde_json::to_string(&self.build_input(source_code, optimize))
            .map_err(|e| CompilationFailure::Invocation {
                reason: format!("Failed to serialize compiler input: {e}"),
            })?;

        // Loading and running both execute third-party code that may panic
        let raw = panic::catch_unwind(AssertUnwindSafe(|| {
            let handle = self.registry.get_handle(version)?;
            handle.compile_standard_json(&input)
        }))
        .map_err(|payload| CompilationFailure::Invocation {
            reason: panic_message(payload.as_ref()),
        })??;

        tracing::debug!("Compiler returned {} bytes", raw.len());

        serde_json::from_str(&raw).map_err(|e| CompilationFailure::InvalidOutput {
            reason: e.to_string(),
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "compiler panicked".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::LabResult,
        lint::{optimization::EXTERNAL_INSTEAD_OF_PUBLIC, Severity},
        registry::{testing::ScriptedLoader, CompilerHandle, CompilerLoader},
    };
    use serde_json::json;

    const TX_ORIGIN_SOURCE: &str = "contract C { function f() public { tx.origin; } }";

    fn compiler_with(loader: impl CompilerLoader + 'static) -> SolidityCompiler {
        SolidityCompiler::new(Arc::new(CompilerRegistry::new(loader)), LabConfig::default())
    }

    fn contract_output(name: &str, bytecode: &str) -> Value {
        json!({
            "contracts": {
                SOURCE_UNIT: {
                    name: {
                        "abi": [{"type": "function", "name": "f", "inputs": [], "outputs": [], "stateMutability": "nonpayable"}],
                        "evm": {"bytecode": {"object": bytecode}}
                    }
                }
            }
        })
    }

    #[test]
    fn test_successful_compile_extracts_artifacts() {
        let compiler = compiler_with(ScriptedLoader::with_output(
            "0.8.21",
            contract_output("C", "60806040"),
        ));

        let result = compiler.compile(&CompileRequest::new(TX_ORIGIN_SOURCE).contract_name("C"));

        assert!(result.success);
        assert_eq!(result.bytecode.as_deref(), Some("60806040"));
        assert_eq!(result.abi.as_ref().map(Vec::len), Some(1));
        assert_eq!(result.gas_estimate, Some(21_000 + 4 * 200));
        assert!(result.errors.is_empty());
        assert!(result.failure.is_none());

        assert_eq!(result.security_issues.len(), 1);
        assert_eq!(result.security_issues[0].severity, Severity::High);
        assert_eq!(
            result.optimization_suggestions,
            vec![EXTERNAL_INSTEAD_OF_PUBLIC.to_string()]
        );
    }

    #[test]
    fn test_error_diagnostic_fails_but_keeps_everything_else() {
        let mut output = contract_output("C", "6080");
        output["errors"] = json!([
            {"severity": "warning", "message": "w", "formattedMessage": "Warning: unused variable"},
            {"severity": "error", "message": "e", "formattedMessage": "TypeError: bad"}
        ]);
        let compiler = compiler_with(ScriptedLoader::with_output("0.8.21", output));

        let result = compiler.compile(&CompileRequest::new(TX_ORIGIN_SOURCE).contract_name("C"));

        assert!(!result.success);
        assert_eq!(result.errors, vec!["TypeError: bad"]);
        assert_eq!(result.warnings, vec!["Warning: unused variable"]);
        // Strict success: bytecode may still be present
        assert_eq!(result.bytecode.as_deref(), Some("6080"));
        assert_eq!(result.failure, Some(CompilationFailure::Diagnostics { count: 1 }));
        assert!(!result.failure.as_ref().unwrap().is_retryable());
        assert_eq!(result.security_issues.len(), 1);
        assert!(!result.optimization_suggestions.is_empty());
    }

    #[test]
    fn test_missing_contract_leaves_artifacts_unset() {
        let compiler = compiler_with(ScriptedLoader::with_output(
            "0.8.21",
            contract_output("MathLib", "6080"),
        ));

        let result = compiler.compile(&CompileRequest::new("library MathLib {}"));

        assert!(result.success);
        assert!(result.bytecode.is_none());
        assert!(result.abi.is_none());
        assert!(result.gas_estimate.is_none());
    }

    #[test]
    fn test_defaults_come_from_config() {
        let compiler = compiler_with(ScriptedLoader::with_output(
            "0.8.21",
            contract_output("Contract", "60"),
        ));

        let result = compiler.compile(&CompileRequest::new("contract Contract {}"));

        assert!(result.success);
        assert_eq!(result.bytecode.as_deref(), Some("60"));
        assert_eq!(compiler.registry().cached_versions(), vec!["0.8.21"]);
    }

    #[test]
    fn test_unavailable_version_is_reported_not_raised() {
        let compiler = compiler_with(ScriptedLoader::default());

        let result = compiler.compile(&CompileRequest::new(TX_ORIGIN_SOURCE).version("0.9.99"));

        assert!(!result.success);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("0.9.99"));
        assert!(matches!(
            result.failure,
            Some(CompilationFailure::CompilerUnavailable { ref version, .. }) if version == "0.9.99"
        ));
        assert!(result.failure.as_ref().unwrap().is_retryable());
        // Lint findings are still available
        assert_eq!(result.security_issues.len(), 1);
    }

    #[test]
    fn test_malformed_output_is_invalid_output() {
        let loader = ScriptedLoader::default().version("0.8.21", Ok("not json".to_string()));
        let result = compiler_with(loader).compile(&CompileRequest::new("contract C {}"));

        assert!(!result.success);
        assert_eq!(result.errors.len(), 1);
        assert!(matches!(result.failure, Some(CompilationFailure::InvalidOutput { .. })));
    }

    #[test]
    fn test_invocation_error_is_reported() {
        let loader = ScriptedLoader::default().version("0.8.21", Err("killed".to_string()));
        let result = compiler_with(loader).compile(&CompileRequest::new("contract C {}"));

        assert!(!result.success);
        assert!(result.errors[0].contains("killed"));
        assert!(matches!(result.failure, Some(CompilationFailure::Invocation { .. })));
    }

    #[derive(Debug)]
    struct PanickingCompiler;

    impl CompilerHandle for PanickingCompiler {
        fn version(&self) -> &str {
            "0.8.21"
        }

        fn compile_standard_json(&self, _input: &str) -> LabResult<String> {
            panic!("compiler crashed")
        }
    }

    struct PanickingCompilerLoader;

    impl CompilerLoader for PanickingCompilerLoader {
        fn load(&self, _version: &str) -> LabResult<Arc<dyn CompilerHandle>> {
            Ok(Arc::new(PanickingCompiler))
        }
    }

    struct PanickingLoader;

    impl CompilerLoader for PanickingLoader {
        fn load(&self, _version: &str) -> LabResult<Arc<dyn CompilerHandle>> {
            panic!("loader crashed")
        }
    }

    #[test]
    fn test_panicking_compiler_is_contained() {
        let result =
            compiler_with(PanickingCompilerLoader).compile(&CompileRequest::new("contract C {}"));

        assert!(!result.success);
        assert!(result.errors[0].contains("compiler crashed"));
        assert!(matches!(result.failure, Some(CompilationFailure::Invocation { .. })));
    }

    #[test]
    fn test_panicking_loader_is_contained() {
        let compiler = compiler_with(PanickingLoader);
        let request = CompileRequest::new(TX_ORIGIN_SOURCE);

        let result = panic::catch_unwind(AssertUnwindSafe(|| compiler.compile(&request)))
            .expect("compile must not unwind");

        assert!(!result.success);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("loader crashed"));
        assert!(matches!(result.failure, Some(CompilationFailure::Invocation { .. })));
        assert!(result.failure.as_ref().unwrap().is_retryable());
        assert_eq!(result.security_issues.len(), 1);

        // The slot stays empty, so the next request loads again
        assert!(!compiler.registry().is_loaded("0.8.21"));
        compiler.compile(&request);
        assert_eq!(compiler.registry().load_count(), 2);
    }

    #[test]
    fn test_resolve_trims_and_falls_back_to_defaults() {
        let compiler = compiler_with(ScriptedLoader::default());

        let blank = CompileRequest::new("contract C {}")
            .contract_name("")
            .version("   ");
        let resolved = compiler.resolve(&blank);
        assert_eq!(resolved.contract_name, "Contract");
        assert_eq!(resolved.version, "0.8.21");
        assert_eq!(resolved.optimizer, OptimizerSettings { enabled: true, runs: 200 });

        let named = CompileRequest::new("contract C {}")
            .contract_name(" Token ")
            .version("0.8.19")
            .optimize(false);
        let resolved = compiler.resolve(&named);
        assert_eq!(resolved.contract_name, "Token");
        assert_eq!(resolved.version, "0.8.19");
        assert!(!resolved.optimizer.enabled);
    }

    #[test]
    fn test_compile_is_idempotent_and_loads_once() {
        let compiler = compiler_with(ScriptedLoader::with_output(
            "0.8.21",
            contract_output("C", "6080604052"),
        ));
        let request = CompileRequest::new(TX_ORIGIN_SOURCE).contract_name("C");

        let first = compiler.compile(&request);
        let second = compiler.compile(&request);

        assert_eq!(first, second);
        assert_eq!(compiler.registry().load_count(), 1);
    }

    #[test]
    fn test_build_input_uses_optimizer_settings() {
        let compiler = compiler_with(ScriptedLoader::default());
        let input = compiler.build_input("contract C {}", false);

        assert_eq!(input.settings.optimizer, OptimizerSettings { enabled: false, runs: 200 });
        assert_eq!(input.sources[SOURCE_UNIT].content, "contract C {}");
    }

    #[test]
    fn test_result_json_shape() {
        let result = CompilationResult::failed(CompilationFailure::InvalidOutput {
            reason: "eof".to_string(),
        });
        let value = serde_json::to_value(&result).unwrap();

        assert_eq!(value["success"], false);
        assert_eq!(value["errors"], json!(["Invalid compiler output: eof"]));
        assert_eq!(value["securityIssues"], json!([]));
        assert_eq!(value["optimizationSuggestions"], json!([]));
        assert_eq!(value["failure"]["kind"], "invalid_output");
        assert!(value.get("bytecode").is_none());
        assert!(value.get("gasEstimate").is_none());
    }
}
