//! Subcommands of the `abstractor` CLI and their options.

use clap::{Args, Subcommand};

use super::*;

pub mod search;
pub mod summarize;

pub use search::{search, SearchOptions};
pub use summarize::{summarize, SummarizeOptions};

/// Available commands for the CLI
#[derive(Subcommand, Clone)]
pub enum Commands {
  /// Generate a summary for every paper in a CSV file that does not have one yet
  Summarize(SummarizeOptions),

  /// Search arXiv and optionally save the results to a CSV file
  Search(SearchOptions),
}
