//! Solidity compile-and-lint pipeline for code lab submissions
pub mod api;
pub mod artifacts;
mod compiler;
pub mod config;
pub mod diagnostics;
mod error;
pub mod gas;
pub mod lint;
pub mod registry;
pub mod solc;
pub mod standard_json;
pub mod submission;

pub use api::{handle_compile, ApiResponse, CompileRequestBody, SubmissionContext};
pub use artifacts::{save_artifacts, ArtifactContext, SavedArtifacts};
pub use compiler::{
    CompilationFailure, CompilationResult, CompileRequest, ResolvedRequest, SolidityCompiler,
    SOURCE_UNIT,
};
pub use config::{LabConfig, LabConfigBuilder};
pub use error::{LabError, LabResult};
pub use lint::{LintReport, SecurityIssue, Severity};
pub use registry::{CompilerHandle, CompilerLoader, CompilerRegistry};
pub use solc::{SolcBinary, SolcLoader};
pub use submission::{
    InMemorySubmissionStore, SubmissionRecord, SubmissionStatus, SubmissionStore,
};
