//! Native `solc` binaries as compiler handles

use crate::{
    error::{LabError, LabResult},
    registry::{CompilerHandle, CompilerLoader},
};
use std::{
    io::{self, Write},
    path::{Path, PathBuf},
    process::{Command, Stdio},
    sync::Arc,
};

/// A `solc` executable verified to report a specific version
#[derive(Debug, Clone)]
pub struct SolcBinary {
    pub path: PathBuf,
    pub version: String,
}

impl CompilerHandle for SolcBinary {
    fn version(&self) -> &str {
        &self.version
    }

    fn compile_standard_json(&self, input: &str) -> LabResult<String> {
        let mut cmd = Command::new(&self.path);
        cmd.arg("--standard-json")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        tracing::debug!("Running: {:?}", cmd);

        let mut process = cmd.spawn().map_err(|e| {
            LabError::Invocation(format!("{} subprocess spawning: {e}", self.path.display()))
        })?;

        // solc may exit before reading all of stdin; its stderr explains why
        let written = match process.stdin.take() {
            Some(mut stdin) => stdin.write_all(input.as_bytes()),
            None => Err(io::Error::new(io::ErrorKind::BrokenPipe, "stdin unavailable")),
        };

        let output = process.wait_with_output()?;
        if !output.status.success() {
            return Err(LabError::Invocation(format!(
                "{} exited with code {:?}:\n{}",
                self.path.display(),
                output.status.code(),
                String::from_utf8_lossy(&output.stderr)
            )));
        }
        written.map_err(|e| {
            LabError::Invocation(format!("{} stdin write failed: {e}", self.path.display()))
        })?;

        String::from_utf8(output.stdout).map_err(|e| {
            LabError::Invocation(format!("{} wrote non UTF-8 output: {e}", self.path.display()))
        })
    }
}

/// Resolves versions to `solc` binaries on disk
#[derive(Debug, Clone)]
pub struct SolcLoader {
    /// Directory holding version specific binaries
    pub compilers_dir: Option<PathBuf>,
    /// Binary tried last, typically `solc` on `PATH`
    pub fallback: PathBuf,
}

impl Default for SolcLoader {
    fn default() -> Self {
        Self {
            compilers_dir: None,
            fallback: PathBuf::from("solc"),
        }
    }
}

impl SolcLoader {
    pub fn new(compilers_dir: Option<PathBuf>, fallback: PathBuf) -> Self {
        Self {
            compilers_dir,
            fallback,
        }
    }

    /// Candidate binaries for `version`, most specific first
    pub fn candidates(&self, version: &str) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(dir) = &self.compilers_dir {
            paths.push(dir.join(format!("solc-v{version}")));
            paths.push(dir.join(format!("solc-{version}")));
            paths.push(dir.join(version).join("solc"));
        }
        paths.push(self.fallback.clone());
        paths
    }
}

impl CompilerLoader for SolcLoader {
    fn canonical_version(&self, version: &str) -> String {
        normalize_version(version).to_string()
    }

    fn load(&self, version: &str) -> LabResult<Arc<dyn CompilerHandle>> {
        let wanted = normalize_version(version);
        let mut tried = Vec::new();

        for path in self.candidates(wanted) {
            match query_version(&path) {
                Ok(found) if found == wanted => {
                    tracing::info!("Using {} for solc {}", path.display(), wanted);
                    return Ok(Arc::new(SolcBinary {
                        path,
                        version: wanted.to_string(),
                    }));
                }
                Ok(found) => {
                    tracing::debug!("{} reports {}, wanted {}", path.display(), found, wanted);
                    tried.push(format!("{} ({found})", path.display()));
                }
                Err(e) => {
                    tracing::debug!("Skipping {}: {}", path.display(), e);
                    tried.push(path.display().to_string());
                }
            }
        }

        Err(LabError::unavailable(
            version,
            format!("no matching solc binary, tried: {}", tried.join(", ")),
        ))
    }
}

/// Strips a leading `v` from user supplied versions
pub fn normalize_version(version: &str) -> &str {
    let version = version.trim();
    version.strip_prefix('v').unwrap_or(version)
}

/// Runs `<path> --version` and returns the reported release
fn query_version(path: &Path) -> LabResult<String> {
    let output = Command::new(path)
        .arg("--version")
        .stdin(Stdio::null())
        .output()?;

    if !output.status.success() {
        return Err(LabError::Invocation(format!(
            "{} --version exited with code {:?}",
            path.display(),
            output.status.code()
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_version_output(&stdout).ok_or_else(|| {
        LabError::Invocation(format!("{} printed no version line", path.display()))
    })
}

/// Extracts `0.8.21` from `Version: 0.8.21+commit.d9974bed.Linux.g++`
pub fn parse_version_output(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .find_map(|line| line.trim().strip_prefix("Version:"))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|full| full.split('+').next())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
