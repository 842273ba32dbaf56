//! Error type for the compiler backend and version registry

/// Failures raised while loading or driving a compiler
#[derive(Debug, thiserror::Error)]
pub enum LabError {
    #[error("Compiler version {version} is unavailable: {reason}")]
    CompilerUnavailable { version: String, reason: String },

    #[error("Compiler invocation failed: {0}")]
    Invocation(String),

    #[error("Malformed compiler output: {0}")]
    MalformedOutput(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LabError {
    /// Shortcut for a version that could not be loaded
    pub fn unavailable(version: impl Into<String>, reason: impl Into<String>) -> Self {
        LabError::CompilerUnavailable {
            version: version.into(),
            reason: reason.into(),
        }
    }
}

pub type LabResult<T> = std::result::Result<T, LabError>;
