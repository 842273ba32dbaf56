//! CLI for the solidity-lab library
//!
//! Compiles Solidity submissions and runs the heuristic lint pass.

use clap::{Args, Parser, Subcommand};
use eyre::{Context, Result};
use serde::Serialize;
use solidity_lab::{
    lint::{self, LintReport},
    save_artifacts, ArtifactContext, CompilationResult, CompileRequest, LabConfig, SavedArtifacts,
    Severity, SolidityCompiler,
};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Solidity code lab compiler and linter
#[derive(Parser, Debug)]
#[command(name = "solidity-lab")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all logging except errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

/// Compile settings
#[derive(Args, Debug, Clone)]
struct CompileArgs {
    /// Solidity source file
    file: PathBuf,

    /// Contract to extract bytecode and ABI for
    #[arg(long)]
    contract: Option<String>,

    /// solc version to compile with
    #[arg(long = "solc-version")]
    solc_version: Option<String>,

    /// Disable the optimizer
    #[arg(long)]
    no_optimize: bool,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory with version specific solc binaries
    #[arg(long)]
    compilers_dir: Option<PathBuf>,

    /// Output directory for saved artifacts
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Save artifacts to the output directory
    #[arg(long)]
    save: bool,

    /// Output JSON to stdout
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile a Solidity file and lint it
    Compile(CompileArgs),

    /// Run only the heuristic lint pass
    Lint {
        /// Solidity source file
        file: PathBuf,

        /// Output JSON to stdout
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Serialize)]
#[serde(tag = "status")]
enum Output<'a> {
    #[serde(rename = "success")]
    Success {
        #[serde(flatten)]
        data: SuccessData<'a>,
    },

    #[serde(rename = "error")]
    Error { error_type: String, message: String },
}

#[derive(Debug, Serialize)]
#[serde(tag = "command")]
enum SuccessData<'a> {
    #[serde(rename = "compile")]
    Compile {
        contract_name: &'a str,
        compiler_version: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        output_dir: Option<String>,
        result: &'a CompilationResult,
    },

    #[serde(rename = "lint")]
    Lint {
        file: String,
        #[serde(flatten)]
        report: &'a LintReport,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Compile(args) => run_compile(args),
        Commands::Lint { file, json } => run_lint(&file, json),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            output_error(e);
            std::process::exit(1);
        }
    }
}

/// Loads config and applies command-line overrides
fn build_config(args: &CompileArgs) -> Result<LabConfig> {
    let mut config = match &args.config {
        Some(path) => LabConfig::from_toml_file(path)?,
        None => LabConfig::default(),
    };

    if let Some(dir) = &args.compilers_dir {
        config.solc.compilers_dir = Some(dir.clone());
    }
    if let Some(dir) = &args.output_dir {
        config.artifacts.output_dir = dir.clone();
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn read_source(file: &Path) -> Result<String> {
    let source = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    if source.is_empty() {
        return Err(eyre::eyre!("Source code is required: {} is empty", file.display()));
    }
    Ok(source)
}

/// Returns whether compilation succeeded
fn run_compile(args: CompileArgs) -> Result<bool> {
    let config = build_config(&args)?;
    let source = read_source(&args.file)?;
    debug!(file = %args.file.display(), "Compiling submission");

    let request = CompileRequest {
        source_code: source,
        contract_name: args.contract.clone(),
        version: args.solc_version.clone(),
        optimize: args.no_optimize.then_some(false),
    };

    let compiler = SolidityCompiler::from_config(config);
    let result = compiler.compile(&request);

    let ctx = artifact_context(&compiler, &request);
    let contract_name = ctx.contract_name;
    let compiler_version = ctx.compiler_version;

    let saved = if args.save {
        Some(
            save_artifacts(&result, &ctx, &compiler.config().artifacts)
                .context("Failed to save artifacts")?,
        )
    } else {
        None
    };

    if args.json {
        let output = Output::Success {
            data: SuccessData::Compile {
                contract_name,
                compiler_version,
                output_dir: saved.as_ref().map(|s| s.output_dir.display().to_string()),
                result: &result,
            },
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        print_compile_summary(contract_name, compiler_version, &result, saved.as_ref());
    }

    Ok(result.success)
}

/// Describes the compile exactly as `SolidityCompiler::compile` resolved it
fn artifact_context<'a>(
    compiler: &'a SolidityCompiler,
    request: &'a CompileRequest,
) -> ArtifactContext<'a> {
    let resolved = compiler.resolve(request);
    ArtifactContext {
        contract_name: resolved.contract_name,
        source_code: &request.source_code,
        compiler_version: resolved.version,
        optimizer: resolved.optimizer,
    }
}

fn print_compile_summary(
    contract_name: &str,
    compiler_version: &str,
    result: &CompilationResult,
    saved: Option<&SavedArtifacts>,
) {
    if result.success {
        println!("✅ Successfully compiled {} (solc {})", contract_name, compiler_version);
        match &result.bytecode {
            Some(bytecode) => println!("   - bytecode: {} bytes", bytecode.len() / 2),
            None => println!("   - no bytecode emitted for {}", contract_name),
        }
        if let Some(gas) = result.gas_estimate {
            println!("   - estimated deployment gas: {}", gas);
        }
    } else {
        println!("❌ Compilation of {} failed", contract_name);
        if let Some(failure) = &result.failure {
            if failure.is_retryable() {
                println!("   (infrastructure problem, retrying may help)");
            }
        }
    }

    for error in &result.errors {
        println!("\nerror: {}", error.trim_end());
    }
    for warning in &result.warnings {
        println!("\nwarning: {}", warning.trim_end());
    }

    print_lint(&result.security_issues, &result.optimization_suggestions);

    if let Some(saved) = saved {
        println!("\n📁 Output directory: {}", saved.output_dir.display());
    }
}

fn print_lint(issues: &[solidity_lab::SecurityIssue], suggestions: &[String]) {
    if !issues.is_empty() {
        println!("\n🔍 Security findings (heuristic):");
        for issue in issues {
            println!("   [{}] line {}: {}", issue.severity, issue.line, issue.message);
        }
    }
    if !suggestions.is_empty() {
        println!("\n⛽ Optimization suggestions:");
        for suggestion in suggestions {
            println!("   - {}", suggestion);
        }
    }
}

/// Returns false when a high or critical finding is present
fn run_lint(file: &Path, json: bool) -> Result<bool> {
    let source = read_source(file)?;
    let report = lint::run(&source);

    if json {
        let output = Output::Success {
            data: SuccessData::Lint {
                file: file.display().to_string(),
                report: &report,
            },
        };
        println!("{}", serde_json::to_string(&output)?);
    } else if report.is_clean() {
        println!("✅ No findings in {}", file.display());
    } else {
        print_lint(&report.security_issues, &report.optimization_suggestions);
    }

    Ok(lint_passes(&report))
}

fn lint_passes(report: &LintReport) -> bool {
    report
        .max_severity()
        .map_or(true, |severity| severity < Severity::High)
}

fn error_type(error: &eyre::Report) -> &'static str {
    let message = format!("{error:#}");
    if message.contains("Failed to read") {
        "io_error"
    } else if message.contains("Invalid configuration") || message.contains("Failed to parse") {
        "config_error"
    } else if message.contains("Source code is required") {
        "invalid_source"
    } else if message.contains("Failed to save artifacts") {
        "artifact_error"
    } else {
        "unknown_error"
    }
}

fn output_error(error: eyre::Report) {
    let output: Output<'_> = Output::Error {
        error_type: error_type(&error).to_string(),
        message: format!("{error:#}"),
    };

    match serde_json::to_string(&output) {
        Ok(json) => eprintln!("{}", json),
        Err(_) => eprintln!("{:#}", error),
    }
}
