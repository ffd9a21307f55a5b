//! gitconflict command-line tool.
//!
//! Reports files changed on both a local branch and a GitHub branch since
//! their merge base, without fetching the remote branch.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use gitconflict_core::config::{DEFAULT_API_URL, DEFAULT_REMOTE};
use gitconflict_core::{detect, ConfigFile, ConflictReport, DetectorConfig};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// Detect potential merge conflicts between a local branch and a GitHub branch.
#[derive(Parser, Debug)]
#[command(
    name = "git-conflict-detector",
    version,
    about = "Detect potential merge conflicts without fetching the remote branch"
)]
struct Cli {
    /// Repository owner on GitHub.
    #[arg(long)]
    owner: Option<String>,

    /// Repository name on GitHub.
    #[arg(long)]
    repo: Option<String>,

    /// GitHub personal access token.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// File containing the GitHub token. Takes precedence over --token.
    #[arg(long)]
    token_file: Option<PathBuf>,

    /// Path to the local repository (default: current directory).
    #[arg(long)]
    path: Option<String>,

    /// Remote branch on GitHub.
    #[arg(long)]
    branch_a: Option<String>,

    /// Local branch.
    #[arg(long)]
    branch_b: Option<String>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Write the report to this file instead of stdout.
    #[arg(long)]
    output_file: Option<PathBuf>,

    /// GitHub API base URL.
    #[arg(long)]
    api_url: Option<String>,

    /// Name of the git remote tracking the GitHub repository.
    #[arg(long)]
    remote: Option<String>,

    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let token_from_file = match &cli.token_file {
        Some(path) => match read_token_file(path) {
            Ok(token) => Some(token),
            Err(e) => {
                eprintln!("Error reading token file: {:#}", e);
                return Ok(ExitCode::FAILURE);
            }
        },
        None => None,
    };

    let file = match &cli.config {
        Some(path) => ConfigFile::load_and_resolve(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => ConfigFile::default(),
    };

    let config = build_config(&cli, file, token_from_file)?;
    let report = detect(&config).await;

    if let Some(ref message) = report.error {
        eprintln!("Error: {}", message);
        return Ok(ExitCode::FAILURE);
    }

    let rendered = match cli.output {
        OutputFormat::Text => format_text(&report),
        OutputFormat::Json => format_json(&report)?,
    };

    match &cli.output_file {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Output written to {}", path.display());
        }
        None => println!("{}", rendered),
    }

    Ok(ExitCode::SUCCESS)
}

// ---------------------------------------------------------------------------
// Config helpers
// ---------------------------------------------------------------------------

fn read_token_file(path: &Path) -> Result<String> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    Ok(contents.trim().to_string())
}

/// Merge flags over file values. Token precedence: token file, then
/// `--token`/`GITHUB_TOKEN`, then the file's `token_env`.
fn build_config(
    cli: &Cli,
    file: ConfigFile,
    token_from_file: Option<String>,
) -> Result<DetectorConfig> {
    let path = match cli.path.clone().or(file.local.path) {
        Some(path) => path,
        None => std::env::current_dir()
            .context("cannot determine current directory")?
            .display()
            .to_string(),
    };

    let config = DetectorConfig::new(
        cli.owner.clone().or(file.github.owner).unwrap_or_default(),
        cli.repo.clone().or(file.github.repo).unwrap_or_default(),
        token_from_file
            .or_else(|| cli.token.clone())
            .or(file.github.token)
            .unwrap_or_default(),
        path,
        cli.branch_a.clone().or(file.github.branch).unwrap_or_default(),
        cli.branch_b.clone().or(file.local.branch).unwrap_or_default(),
    )
    .with_api_url(
        cli.api_url
            .clone()
            .or(file.github.api_url)
            .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
    )
    .with_remote(
        cli.remote
            .clone()
            .or(file.local.remote)
            .unwrap_or_else(|| DEFAULT_REMOTE.to_string()),
    );

    Ok(config)
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn format_text(report: &ConflictReport) -> String {
    let mut out = format!("Merge base commit: {}\n", report.merge_base_commit);
    if report.potential_conflicts.is_empty() {
        out.push_str("No potential conflicts found.");
        return out;
    }
    out.push_str(&format!(
        "Found {} potential conflicts:",
        report.potential_conflicts.len()
    ));
    for file in &report.potential_conflicts {
        out.push_str("\n- ");
        out.push_str(file);
    }
    out
}

fn format_json(report: &ConflictReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize report")
}
