//! Configuration for the compile-and-lint pipeline

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_SOLC_VERSION: &str = "0.8.21";
pub const DEFAULT_CONTRACT_NAME: &str = "Contract";
pub const DEFAULT_OPTIMIZER_RUNS: u32 = 200;

/// Main configuration, loadable from a TOML file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LabConfig {
    /// Compiler version used when a request does not name one
    pub default_version: String,

    /// Contract extracted when a request does not name one
    pub default_contract_name: String,

    /// Optimizer settings applied to every compile
    pub optimizer: OptimizerConfig,

    /// Compiler discovery settings
    pub solc: SolcConfig,

    /// Artifact output settings
    pub artifacts: ArtifactsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Whether optimization is enabled when a request does not say
    pub enabled: bool,
    pub runs: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SolcConfig {
    /// Directory with `solc-v<version>` style binaries
    pub compilers_dir: Option<PathBuf>,
    /// Binary tried when no versioned binary matches
    pub fallback_binary: PathBuf,
}

/// Configuration for artifact generation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ArtifactsConfig {
    /// Output directory for saved artifacts
    pub output_dir: PathBuf,

    /// Whether to write metadata.json with hashes and selectors
    pub generate_metadata: bool,

    /// Whether to pretty-print JSON artifacts
    pub pretty_json: bool,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            default_version: DEFAULT_SOLC_VERSION.to_string(),
            default_contract_name: DEFAULT_CONTRACT_NAME.to_string(),
            optimizer: OptimizerConfig::default(),
            solc: SolcConfig::default(),
            artifacts: ArtifactsConfig::default(),
        }
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            runs: DEFAULT_OPTIMIZER_RUNS,
        }
    }
}

impl Default for SolcConfig {
    fn default() -> Self {
        Self {
            compilers_dir: None,
            fallback_binary: PathBuf::from("solc"),
        }
    }
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("out"),
            generate_metadata: true,
            pretty_json: true,
        }
    }
}

impl LabConfig {
    /// Reads and validates a TOML config file; missing keys take defaults
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: LabConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        Ok(config)
    }

    /// Validates the entire configuration
    pub fn validate(&self) -> Result<()> {
        if self.default_version.trim().is_empty() {
            return Err(eyre::eyre!("default_version cannot be empty"));
        }
        if self.default_contract_name.trim().is_empty() {
            return Err(eyre::eyre!("default_contract_name cannot be empty"));
        }
        if self.optimizer.runs == 0 {
            return Err(eyre::eyre!("optimizer.runs must be greater than zero"));
        }
        Ok(())
    }

    /// Create a new builder for LabConfig
    pub fn builder() -> LabConfigBuilder {
        LabConfigBuilder::default()
    }
}

/// Builder for creating LabConfig with a fluent API
#[derive(Default)]
pub struct LabConfigBuilder {
    config: LabConfig,
}

impl LabConfigBuilder {
    pub fn default_version(mut self, version: impl Into<String>) -> Self {
        self.config.default_version = version.into();
        self
    }

    pub fn default_contract_name(mut self, name: impl Into<String>) -> Self {
        self.config.default_contract_name = name.into();
        self
    }

    pub fn optimize(mut self, enabled: bool) -> Self {
        self.config.optimizer.enabled = enabled;
        self
    }

    pub fn optimizer_runs(mut self, runs: u32) -> Self {
        self.config.optimizer.runs = runs;
        self
    }

    pub fn compilers_dir(mut self, dir: PathBuf) -> Self {
        self.config.solc.compilers_dir = Some(dir);
        self
    }

    pub fn fallback_binary(mut self, path: PathBuf) -> Self {
        self.config.solc.fallback_binary = path;
        self
    }

    pub fn output_dir(mut self, path: PathBuf) -> Self {
        self.config.artifacts.output_dir = path;
        self
    }

    /// Configure artifact generation
    pub fn artifacts(mut self, configure: impl FnOnce(&mut ArtifactsConfig)) -> Self {
        configure(&mut self.config.artifacts);
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<LabConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
