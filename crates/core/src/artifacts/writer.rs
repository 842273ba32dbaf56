//! Artifact writing utilities for saving compilation results to disk

use super::{create_metadata, ArtifactContext};
use crate::{compiler::CompilationResult, config::ArtifactsConfig};
use eyre::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

pub const BYTECODE_FILE: &str = "bytecode.hex";
pub const ABI_FILE: &str = "abi.json";
pub const REPORT_FILE: &str = "report.json";
pub const METADATA_FILE: &str = "metadata.json";

/// Information about saved artifacts
#[derive(Debug, Clone)]
pub struct SavedArtifacts {
    /// Path to the contract output directory
    pub output_dir: PathBuf,
    /// Path to the full compile report
    pub report_path: PathBuf,
    /// Path to bytecode file (if saved)
    pub bytecode_path: Option<PathBuf>,
    /// Path to ABI file (if saved)
    pub abi_path: Option<PathBuf>,
    /// Path to metadata file (if saved)
    pub metadata_path: Option<PathBuf>,
}

/// Saves the artifacts of one compile to disk
///
/// Creates a directory structure like:
/// ```ignore
/// out/
///   ContractName.sol/
///     bytecode.hex
///     abi.json
///     report.json
///     metadata.json
/// ```
pub fn save_artifacts(
    result: &CompilationResult,
    ctx: &ArtifactContext<'_>,
    config: &ArtifactsConfig,
) -> Result<SavedArtifacts> {
    let contract_dir = contract_output_dir(&config.output_dir, ctx.contract_name);
    std::fs::create_dir_all(&contract_dir).with_context(|| {
        format!(
            "Failed to create contract output directory: {}",
            contract_dir.display()
        )
    })?;

    let mut saved = SavedArtifacts {
        output_dir: contract_dir.clone(),
        report_path: contract_dir.join(REPORT_FILE),
        bytecode_path: None,
        abi_path: None,
        metadata_path: None,
    };

    if let Some(bytecode) = &result.bytecode {
        let path = contract_dir.join(BYTECODE_FILE);
        std::fs::write(&path, bytecode)
            .with_context(|| format!("Failed to write bytecode: {}", path.display()))?;
        info!("Saved bytecode to: {}", path.display());
        saved.bytecode_path = Some(path);
    }

    if let Some(abi) = &result.abi {
        let path = contract_dir.join(ABI_FILE);
        write_json(&path, abi, config.pretty_json)?;
        info!("Saved ABI to: {}", path.display());
        saved.abi_path = Some(path);
    }

    write_json(&saved.report_path, result, config.pretty_json)?;

    if config.generate_metadata {
        let path = contract_dir.join(METADATA_FILE);
        write_json(&path, &create_metadata(ctx, result), config.pretty_json)?;
        info!("Saved metadata to: {}", path.display());
        saved.metadata_path = Some(path);
    }

    info!("All artifacts saved to: {}", contract_dir.display());

    Ok(saved)
}

/// Helper to get the contract output directory path
pub fn contract_output_dir(base_dir: &Path, contract_name: &str) -> PathBuf {
    base_dir.join(format!("{}.sol", contract_name))
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };

    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::standard_json::OptimizerSettings;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    fn ctx() -> ArtifactContext<'static> {
        ArtifactContext {
            contract_name: "Counter",
            source_code: "contract Counter {}",
            compiler_version: "0.8.21",
            optimizer: OptimizerSettings {
                enabled: true,
                runs: 200,
            },
        }
    }

    fn config(dir: &Path) -> ArtifactsConfig {
        ArtifactsConfig {
            output_dir: dir.to_path_buf(),
            generate_metadata: true,
            pretty_json: false,
        }
    }

    #[test]
    fn test_save_successful_compile() {
        let temp_dir = TempDir::new().unwrap();
        let result = CompilationResult {
            success: true,
            bytecode: Some("6080".to_string()),
            abi: Some(vec![json!({"type": "function", "name": "inc", "inputs": []})]),
            gas_estimate: Some(21_400),
            ..Default::default()
        };

        let saved = save_artifacts(&result, &ctx(), &config(temp_dir.path())).unwrap();

        assert_eq!(saved.output_dir, temp_dir.path().join("Counter.sol"));
        assert_eq!(std::fs::read_to_string(saved.bytecode_path.unwrap()).unwrap(), "6080");

        let abi: Value =
            serde_json::from_str(&std::fs::read_to_string(saved.abi_path.unwrap()).unwrap())
                .unwrap();
        assert_eq!(abi[0]["name"], "inc");

        let report: CompilationResult =
            serde_json::from_str(&std::fs::read_to_string(&saved.report_path).unwrap()).unwrap();
        assert_eq!(report, result);

        let metadata: Value =
            serde_json::from_str(&std::fs::read_to_string(saved.metadata_path.unwrap()).unwrap())
                .unwrap();
        assert_eq!(metadata["contract"], "Counter");
        assert_eq!(metadata["compiler"]["optimizer"]["runs"], 200);
        assert_eq!(metadata["function_selectors"]["inc()"], "0x371303c0");
    }

    #[test]
    fn test_save_failed_compile_writes_report_only() {
        let temp_dir = TempDir::new().unwrap();
        let result = CompilationResult {
            success: false,
            errors: vec!["ParserError: expected ';'".to_string()],
            ..Default::default()
        };
        let mut config = config(temp_dir.path());
        config.generate_metadata = false;

        let saved = save_artifacts(&result, &ctx(), &config).unwrap();

        assert!(saved.bytecode_path.is_none());
        assert!(saved.abi_path.is_none());
        assert!(saved.metadata_path.is_none());
        assert!(saved.report_path.exists());
        assert!(!saved.output_dir.join(BYTECODE_FILE).exists());
    }
}
