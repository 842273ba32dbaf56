//! Artifact generation for compiled submissions

use crate::{compiler::CompilationResult, standard_json::OptimizerSettings};
use serde_json::Value;
use sha2::{Digest, Sha256};
use sha3::Keccak256;
use std::collections::BTreeMap;

pub mod metadata;
pub mod writer;

pub use writer::{save_artifacts, SavedArtifacts};

/// Solidity ABI represented as JSON values
pub type Abi = Vec<Value>;

pub const METADATA_SCHEMA_VERSION: u32 = 1;

/// What was compiled and how
#[derive(Debug, Clone)]
pub struct ArtifactContext<'a> {
    pub contract_name: &'a str,
    pub source_code: &'a str,
    pub compiler_version: &'a str,
    pub optimizer: OptimizerSettings,
}

/// Create metadata structure
pub fn create_metadata(ctx: &ArtifactContext<'_>, result: &CompilationResult) -> metadata::Metadata {
    metadata::Metadata {
        schema_version: METADATA_SCHEMA_VERSION,
        contract: ctx.contract_name.to_string(),
        success: result.success,
        compiler: metadata::CompilerInfo {
            version: ctx.compiler_version.to_string(),
            optimizer: ctx.optimizer,
        },
        built_at: chrono::Utc::now().to_rfc3339(),
        source_hash: format!("sha256:{}", hash_bytes(ctx.source_code.as_bytes())),
        bytecode: result.bytecode.as_deref().map(|code| {
            let hex_code = code.strip_prefix("0x").unwrap_or(code);
            // Unlinked bytecode has library placeholders and is hashed as text
            let hash = match hex::decode(hex_code) {
                Ok(bytes) => hash_bytes(&bytes),
                Err(_) => hash_bytes(hex_code.as_bytes()),
            };
            metadata::ArtifactInfo {
                hash: format!("sha256:{hash}"),
                size: hex_code.len() / 2,
                path: writer::BYTECODE_FILE.to_string(),
            }
        }),
        function_selectors: result
            .abi
            .as_ref()
            .map(extract_function_selectors)
            .unwrap_or_default(),
    }
}

/// Hash bytes to SHA256 hex string
pub fn hash_bytes(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// Extract function selectors from ABI
pub fn extract_function_selectors(abi: &Abi) -> BTreeMap<String, String> {
    let mut selectors = BTreeMap::new();

    for func in abi.iter().filter(|e| e["type"] == "function") {
        if let Some(name) = func["name"].as_str() {
            let types: Vec<String> = func["inputs"]
                .as_array()
                .map(|inputs| inputs.iter().map(canonical_type).collect())
                .unwrap_or_default();

            let signature = format!("{}({})", name, types.join(","));
            let hash = Keccak256::digest(signature.as_bytes());
            let selector = format!("0x{}", hex::encode(&hash[..4]));

            selectors.insert(signature, selector);
        }
    }

    selectors
}

/// Canonical ABI type, expanding tuples into their components
fn canonical_type(param: &Value) -> String {
    let ty = param["type"].as_str().unwrap_or_default();
    match ty.strip_prefix("tuple") {
        Some(array_suffix) => {
            let components: Vec<String> = param["components"]
                .as_array()
                .map(|c| c.iter().map(canonical_type).collect())
                .unwrap_or_default();
            format!("({}){}", components.join(","), array_suffix)
        }
        None => ty.to_string(),
    }
}
