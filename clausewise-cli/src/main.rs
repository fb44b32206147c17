//! Clausewise CLI: terminal front end for contract compliance checks.
//!
//! Runs one compliance check or question per invocation and prints either a
//! human-readable report or a JSON envelope.

mod commands;
mod render;

use anyhow::Context;
use clap::Parser;
use clausewise_core::Severity;
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Clausewise: retrieval-augmented compliance analysis over your contracts
#[derive(Parser, Debug)]
#[command(name = "clausewise", version, about, long_about = None)]
pub(crate) struct Cli {
    /// Workspace directory (holds data/, models/ and .clausewise/)
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Generation model to use
    #[arg(short, long)]
    model: Option<String>,

    /// Emit machine-readable JSON instead of a report
    #[arg(long)]
    json: bool,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub(crate) enum Commands {
    /// Run a compliance check against every registered rule
    Check {
        /// Compliance query, e.g. "Are governing law clauses present?"
        #[arg(required_unless_present = "preset", conflicts_with = "preset")]
        query: Option<String>,

        /// Run a suggested query by slug (see `clausewise presets`)
        #[arg(short, long)]
        preset: Option<String>,

        /// Number of contract passages to retrieve
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },
    /// Ask a free-form question about the contracts
    Ask {
        question: String,

        /// Number of contract passages to retrieve
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },
    /// List compliance rules
    Rules {
        /// Only show these severities (comma-separated: HIGH,MEDIUM,LOW)
        #[arg(short, long, value_delimiter = ',')]
        severity: Vec<Severity>,
    },
    /// List the suggested compliance queries
    Presets,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Subcommand, Debug)]
pub(crate) enum ConfigAction {
    /// Write a default configuration file to the workspace
    Init,
    /// Print the effective configuration
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Set up tracing: human-readable stderr + JSON file logging
    let filter = match cli.verbose {
        0 if cli.quiet || cli.json => "error",
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(filter));

    let log_dir = directories::ProjectDirs::from("dev", "clausewise", "clausewise")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "clausewise.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let options = commands::Options {
        model: cli.model,
        json: cli.json,
    };

    let result = match resolve_workspace(&cli.workspace) {
        Ok(workspace) => commands::handle_command(cli.command, &workspace, &options).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        if options.json {
            println!("{}", render::error_envelope(&e));
            std::process::exit(1);
        }
        return Err(e);
    }
    Ok(())
}

/// Canonical workspace directory. Missing paths are an error.
fn resolve_workspace(path: &Path) -> anyhow::Result<PathBuf> {
    let workspace = path
        .canonicalize()
        .with_context(|| format!("Workspace directory '{}' does not exist", path.display()))?;
    if !workspace.is_dir() {
        anyhow::bail!("Workspace '{}' is not a directory", path.display());
    }
    Ok(workspace)
}
