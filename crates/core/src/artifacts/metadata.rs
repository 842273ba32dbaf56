//! Metadata written next to saved artifacts

use crate::standard_json::OptimizerSettings;
use serde::Serialize;
use std::collections::BTreeMap;

/// Root metadata structure for a saved compile
#[derive(Debug, Clone, Serialize)]
pub struct Metadata {
    pub schema_version: u32,
    pub contract: String,
    pub success: bool,
    pub compiler: CompilerInfo,
    /// RFC 3339 timestamp
    pub built_at: String,
    pub source_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytecode: Option<ArtifactInfo>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub function_selectors: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompilerInfo {
    pub version: String,
    pub optimizer: OptimizerSettings,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArtifactInfo {
    pub hash: String,
    pub size: usize,
    pub path: String,
}
