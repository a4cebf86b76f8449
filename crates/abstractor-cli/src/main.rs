//! Command line interface for the abstractor paper summarizer.
//!
//! This crate provides the `abstractor` binary on top of the `abstractor` library. It supports:
//! - Filling in a generated summary for every paper in a CSV file that lacks one
//! - Searching arXiv and saving the hits to a CSV file ready for summarization
//!
//! # Usage
//!
//! ```bash
//! # Find papers and save them
//! abstractor search "cat:physics.geo-ph" --max-results 25 --save-csv geophysics.csv
//!
//! # Summarize everything that is still missing a summary
//! export AISTUDIO_GOOGLE_API_KEY=...
//! abstractor summarize --csv-file geophysics.csv
//! ```
//!
//! A summarization run can be interrupted at any point; running the same command again picks up
//! at the first paper without a summary. Use `-v` for more logging detail.

#![warn(missing_docs, clippy::missing_docs_in_private_items)]

use std::{
  path::{Path, PathBuf},
  process::ExitCode,
};

use abstractor::{configuration::Config, error::AbstractorError};
use clap::{builder::ArgAction, Parser};
use console::style;
use tracing::{error, info, trace};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod commands;
pub mod error;

use crate::{commands::*, error::*};

/// Prefix for information messages
static INFO_PREFIX: &str = "ℹ ";
/// Prefix for success messages
static SUCCESS_PREFIX: &str = "✓ ";
/// Prefix for warning messages
static WARNING_PREFIX: &str = "! ";
/// Prefix for error messages
static ERROR_PREFIX: &str = "✗ ";
/// Prefix for an item in a list
static ITEM_PREFIX: &str = "├─";
/// Prefix for the last item in a list
static LAST_ITEM_PREFIX: &str = "└─";
/// Continuation line for tree structure
static CONTINUE_PREFIX: &str = "│  ";

/// Command line interface configuration and argument parsing
#[derive(Parser)]
#[command(author, version, about = "Resumable, rate-limited summarization of academic papers")]
pub struct Cli {
  /// Verbose mode (-v, -vv) for different levels of logging detail
  #[arg(
        short,
        long,
        action = ArgAction::Count,
        global = true,
        help = "Increase logging verbosity"
    )]
  verbose: u8,

  /// Path to a TOML configuration file. If not specified, uses `abstractor/config.toml` in the
  /// platform-specific configuration directory when it exists.
  #[arg(long, short, global = true)]
  config: Option<PathBuf>,

  /// The subcommand to execute
  #[command(subcommand)]
  command: Commands,
}

/// Configures the logging system based on the verbosity level
///
/// # Arguments
///
/// * `verbosity` - Number of times the verbose flag was used
/// * `log_dir` - Directory for a run-scoped log file, if this command keeps one
///
/// The verbosity levels are:
/// - 0: info (default)
/// - 1: debug
/// - 2+: trace
///
/// `RUST_LOG` takes precedence when set. The returned guard flushes the log file on drop.
fn setup_logging(verbosity: u8, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
  let filter = match verbosity {
    0 => "info",
    1 => "debug",
    _ => "trace",
  };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
  let console = fmt::layer().with_target(false).with_writer(std::io::stderr);

  let Some(log_dir) = log_dir else {
    tracing_subscriber::registry().with(filter).with(console).init();
    return Ok(None);
  };

  std::fs::create_dir_all(log_dir)?;
  let file_name = format!("summarize_{}.log", chrono::Local::now().format("%Y%m%d_%H%M%S"));
  let (writer, guard) =
    tracing_appender::non_blocking(tracing_appender::rolling::never(log_dir, &file_name));
  let file = fmt::layer().with_ansi(false).with_target(false).with_writer(writer);

  tracing_subscriber::registry().with(filter).with(console).with(file).init();
  trace!("Logging to {}", log_dir.join(file_name).display());
  Ok(Some(guard))
}

/// Entry point for the abstractor CLI application
///
/// Loads the configuration, sets up logging and executes the requested command.
///
/// Exits with status 0 when the command completed (including when there was nothing to do) and
/// 1 when it failed or a summarization run had to halt.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
  let cli = Cli::parse();

  let config = match Config::resolve(cli.config.as_deref()) {
    Ok(config) => config,
    Err(e) => {
      eprintln!("{} Failed to load configuration: {}", style(ERROR_PREFIX).red(), e);
      return ExitCode::FAILURE;
    },
  };

  let log_dir = matches!(cli.command, Commands::Summarize(_)).then_some(config.log_dir.as_path());
  let _guard = match setup_logging(cli.verbose, log_dir) {
    Ok(guard) => guard,
    Err(e) => {
      eprintln!("{} Failed to set up logging: {}", style(ERROR_PREFIX).red(), e);
      return ExitCode::FAILURE;
    },
  };

  let result = match cli.command {
    Commands::Summarize(options) => summarize(&config, options).await,
    Commands::Search(options) => search(&config, options).await,
  };

  match result {
    Ok(code) => code,
    Err(e) => {
      error!("{}", e);
      eprintln!("{} {}", style(ERROR_PREFIX).red(), e);
      ExitCode::FAILURE
    },
  }
}
