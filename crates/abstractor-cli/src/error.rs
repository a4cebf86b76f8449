//! Error types for the abstractor CLI.

use thiserror::Error;

use super::*;

/// Error type alias used for the CLI.
pub type Result<T> = core::result::Result<T, AbstractorCliError>;

/// Errors that end a CLI command.
#[derive(Error, Debug)]
pub enum AbstractorCliError {
  /// An error from the underlying library.
  #[error(transparent)]
  Abstractor(#[from] AbstractorError),

  /// A file system operation of the CLI itself failed.
  #[error(transparent)]
  Io(#[from] std::io::Error),

  /// The CSV file given to `summarize` does not exist.
  #[error("CSV file not found: {}", .0.display())]
  MissingCsv(PathBuf),
}
