// crates/review-gate-cli/src/main.rs
// ============================================================================
// Module: Review Gate CLI Entry Point
// Description: Command dispatcher for the review server and offline checks.
// Purpose: Run the webhook server and validate submissions locally.
// Dependencies: clap, review-gate-config, review-gate-core, review-gate-server, tokio
// ============================================================================

//! ## Overview
//! The `review-gate` binary starts the webhook review server and exposes the
//! submission checks for local use: manifest validation (including the
//! payload download) and icon header checks. Security posture: input files
//! are untrusted and read with size limits.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use review_gate_config::CONFIG_ENV_VAR;
use review_gate_config::DEFAULT_CONFIG_NAME;
use review_gate_config::ReviewGateConfig;
use review_gate_core::ManifestValidator;
use review_gate_core::Violation;
use review_gate_core::check_icon;
use review_gate_server::ReviewServer;
use review_gate_server::build_fetcher;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Line printed when a check finds nothing to report.
const SUCCESS_LINE: &str = "Validated successfully";

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "review-gate", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the webhook review server.
    Serve(ConfigArgs),
    /// Package manifest utilities.
    Manifest {
        /// Selected manifest subcommand.
        #[command(subcommand)]
        command: ManifestCommand,
    },
    /// Icon utilities.
    Icon {
        /// Selected icon subcommand.
        #[command(subcommand)]
        command: IconCommand,
    },
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Shared config path argument.
#[derive(Args, Debug)]
struct ConfigArgs {
    /// Optional config file path (defaults to review-gate.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Manifest subcommands.
#[derive(Subcommand, Debug)]
enum ManifestCommand {
    /// Validate a manifest file and its downloadable payload.
    Validate(ManifestValidateCommand),
}

/// Arguments for manifest validation.
#[derive(Args, Debug)]
struct ManifestValidateCommand {
    /// Manifest file to validate.
    #[arg(value_name = "FILE")]
    file: PathBuf,
    /// Package directory name (defaults to the manifest's parent directory).
    #[arg(long, value_name = "NAME")]
    dir: Option<String>,
    /// Config path arguments.
    #[command(flatten)]
    config: ConfigArgs,
}

/// Icon subcommands.
#[derive(Subcommand, Debug)]
enum IconCommand {
    /// Check an icon file's format and dimensions.
    Check(IconCheckCommand),
}

/// Arguments for icon checks.
#[derive(Args, Debug)]
struct IconCheckCommand {
    /// Icon file to check.
    #[arg(value_name = "FILE")]
    file: PathBuf,
    /// Config path arguments.
    #[command(flatten)]
    config: ConfigArgs,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a review gate configuration file.
    Validate(ConfigArgs),
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

/// Errors returned by bounded file reads.
#[derive(Debug)]
enum ReadLimitError {
    /// File I/O failure.
    Io(std::io::Error),
    /// File size exceeds the limit.
    TooLarge {
        /// Actual size in bytes.
        size: u64,
        /// Allowed limit in bytes.
        limit: u64,
    },
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Commands::Serve(args) => command_serve(&args),
        Commands::Manifest {
            command: ManifestCommand::Validate(command),
        } => command_manifest_validate(&command),
        Commands::Icon {
            command: IconCommand::Check(command),
        } => command_icon_check(&command),
        Commands::Config {
            command: ConfigCommand::Validate(args),
        } => command_config_validate(&args),
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Executes the `serve` command.
fn command_serve(args: &ConfigArgs) -> CliResult<ExitCode> {
    let config = load_config(args.config.as_deref())?;
    let server = ReviewServer::from_config(&config)
        .map_err(|err| CliError::new(format!("server initialization failed: {err}")))?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| CliError::new(format!("runtime initialization failed: {err}")))?;
    write_stderr_line(&format!("review-gate listening on {}", server.bind_addr()))
        .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    runtime
        .block_on(server.serve())
        .map_err(|err| CliError::new(format!("server failed: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `manifest validate`.
fn command_manifest_validate(command: &ManifestValidateCommand) -> CliResult<ExitCode> {
    let config = load_config_or_default(command.config.config.as_deref())?;
    let declared_dir = match &command.dir {
        Some(dir) => dir.clone(),
        None => manifest_dir(&command.file)?,
    };
    let limits = config.validation.limits();
    let bytes = read_input(&command.file, limits.max_manifest_bytes)?;
    let text = String::from_utf8(bytes).map_err(|_| {
        CliError::new(format!("{} is not valid utf-8", command.file.display()))
    })?;
    let fetcher = build_fetcher(&config.fetch).map_err(|err| CliError::new(err.to_string()))?;
    let mut validator = ManifestValidator::new(&fetcher, &limits);
    if let Some(dir) = &config.validation.spool_dir {
        validator = validator.with_spool_dir(dir);
    }
    let violations = validator.validate_text(&text, &declared_dir);
    report(&violations)
}

/// Executes `icon check`.
fn command_icon_check(command: &IconCheckCommand) -> CliResult<ExitCode> {
    let config = load_config_or_default(command.config.config.as_deref())?;
    let limits = config.validation.limits();
    let bytes = read_input(&command.file, limits.max_icon_bytes)?;
    let label = command.file.display().to_string();
    let violations: Vec<Violation> =
        check_icon(&label, &bytes, limits.icon_width, limits.icon_height).into_iter().collect();
    report(&violations)
}

/// Executes `config validate`.
fn command_config_validate(args: &ConfigArgs) -> CliResult<ExitCode> {
    let _config = load_config(args.config.as_deref())?;
    write_stdout_line("Config is valid")
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Loads configuration from the explicit path, env override, or default file.
fn load_config(path: Option<&Path>) -> CliResult<ReviewGateConfig> {
    ReviewGateConfig::load(path)
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))
}

/// Loads configuration, falling back to defaults when none is present.
fn load_config_or_default(path: Option<&Path>) -> CliResult<ReviewGateConfig> {
    let implicit = path.is_none()
        && std::env::var_os(CONFIG_ENV_VAR).is_none()
        && !Path::new(DEFAULT_CONFIG_NAME).exists();
    if implicit {
        return Ok(ReviewGateConfig::default());
    }
    load_config(path)
}

/// Derives the package directory name from a manifest path.
fn manifest_dir(file: &Path) -> CliResult<String> {
    let parent = file.canonicalize().ok().and_then(|path| {
        path.parent().and_then(Path::file_name).map(|name| name.to_string_lossy().into_owned())
    });
    parent.ok_or_else(|| {
        CliError::new(format!(
            "cannot derive package directory from {}; pass --dir",
            file.display()
        ))
    })
}

/// Prints violations (or the success line) and returns the exit code.
fn report(violations: &[Violation]) -> CliResult<ExitCode> {
    if violations.is_empty() {
        write_stdout_line(SUCCESS_LINE)
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }
    write_stdout_line(&render_violations(violations))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::FAILURE)
}

/// Renders one violation message per line.
fn render_violations(violations: &[Violation]) -> String {
    violations.iter().map(Violation::message).collect::<Vec<_>>().join("\n")
}

/// Reads an input file with a size limit, mapping failures to CLI errors.
fn read_input(path: &Path, max_bytes: u64) -> CliResult<Vec<u8>> {
    read_bytes_with_limit(path, max_bytes).map_err(|err| match err {
        ReadLimitError::Io(err) => {
            CliError::new(format!("failed to read {}: {err}", path.display()))
        }
        ReadLimitError::TooLarge {
            size,
            limit,
        } => CliError::new(format!(
            "{} is too large ({size} bytes, limit {limit})",
            path.display()
        )),
    })
}

/// Reads a file, failing closed when it exceeds `max_bytes`.
fn read_bytes_with_limit(path: &Path, max_bytes: u64) -> Result<Vec<u8>, ReadLimitError> {
    let file = File::open(path).map_err(ReadLimitError::Io)?;
    let size = file.metadata().map_err(ReadLimitError::Io)?.len();
    if size > max_bytes {
        return Err(ReadLimitError::TooLarge {
            size,
            limit: max_bytes,
        });
    }
    let mut bytes = Vec::new();
    file.take(max_bytes.saturating_add(1)).read_to_end(&mut bytes).map_err(ReadLimitError::Io)?;
    let actual = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
    if actual > max_bytes {
        return Err(ReadLimitError::TooLarge {
            size: actual,
            limit: max_bytes,
        });
    }
    Ok(bytes)
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
