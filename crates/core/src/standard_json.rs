//! Standard JSON input/output documents exchanged with solc
//!
//! Only the subset of the output schema used by the pipeline is modelled;
//! unknown fields are ignored on deserialization.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Compiler input document for a single compile request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StandardJsonInput {
    pub language: String,
    pub sources: BTreeMap<String, SourceInput>,
    pub settings: Settings,
}

/// A single source unit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceInput {
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub optimizer: OptimizerSettings,
    /// file -> contract -> requested outputs
    pub output_selection: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct OptimizerSettings {
    pub enabled: bool,
    pub runs: u32,
}

impl StandardJsonInput {
    /// Builds an input requesting every output for every contract
    pub fn new(source_unit: &str, content: &str, optimizer: OptimizerSettings) -> Self {
        let mut sources = BTreeMap::new();
        sources.insert(
            source_unit.to_string(),
            SourceInput {
                content: content.to_string(),
            },
        );

        let mut contracts = BTreeMap::new();
        contracts.insert("*".to_string(), vec!["*".to_string()]);
        let mut output_selection = BTreeMap::new();
        output_selection.insert("*".to_string(), contracts);

        Self {
            language: "Solidity".to_string(),
            sources,
            settings: Settings {
                optimizer,
                output_selection,
            },
        }
    }
}

/// Compiler output document
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StandardJsonOutput {
    #[serde(default)]
    pub errors: Vec<Diagnostic>,
    /// file -> contract name -> compiled contract
    #[serde(default)]
    pub contracts: BTreeMap<String, BTreeMap<String, ContractOutput>>,
}

impl StandardJsonOutput {
    /// Looks up a compiled contract by source unit and name
    pub fn contract(&self, source_unit: &str, name: &str) -> Option<&ContractOutput> {
        self.contracts.get(source_unit).and_then(|c| c.get(name))
    }
}

/// A compiler diagnostic (error, warning or info)
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub severity: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub formatted_message: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl Diagnostic {
    /// Human readable text, preferring the formatted variant
    pub fn text(&self) -> &str {
        self.formatted_message.as_deref().unwrap_or(&self.message)
    }

    pub fn is_error(&self) -> bool {
        self.severity == "error"
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContractOutput {
    #[serde(default)]
    pub abi: Option<Vec<Value>>,
    #[serde(default)]
    pub evm: Option<EvmOutput>,
}

impl ContractOutput {
    /// Creation bytecode, if the compiler emitted a non-empty object
    pub fn bytecode(&self) -> Option<&str> {
        self.evm
            .as_ref()
            .and_then(|evm| evm.bytecode.as_ref())
            .map(|b| b.object.as_str())
            .filter(|object| !object.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EvmOutput {
    #[serde(default)]
    pub bytecode: Option<BytecodeOutput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BytecodeOutput {
    #[serde(default)]
    pub object: String,
}
