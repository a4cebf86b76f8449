//! Error types for the abstractor library.
//!
//! Two kinds of failure flow through this crate:
//! - [`AbstractorError`]: failures of the surrounding machinery (the record store, the metadata
//!   source, configuration). Any of these reaching the orchestrator ends the run.
//! - [`CallError`]: the classification of a single failed exchange with the generative API. These
//!   are data, not exceptions; the retry controller decides what each one means for a row.
//!
//! # Examples
//!
//! ```
//! use abstractor::error::{AbstractorError, CallError};
//!
//! let err = CallError::Blocked("SAFETY".to_string());
//! assert!(!err.is_retryable());
//! assert_eq!(err.message(), "SAFETY");
//!
//! let err = AbstractorError::UnknownLink("https://arxiv.org/pdf/0000.00000".to_string());
//! assert!(err.is_storage());
//! ```

use thiserror::Error;

/// Error type alias used for the [`abstractor`](crate) crate.
pub type Result<T> = core::result::Result<T, AbstractorError>;

/// Errors that can occur outside of a single generative API exchange.
#[derive(Error, Debug)]
pub enum AbstractorError {
  /// A file system operation on the record store failed.
  ///
  /// This occurs when:
  /// - The CSV file does not exist or cannot be opened
  /// - The temporary checkpoint file cannot be created or written
  /// - Permission errors occur
  #[error(transparent)]
  Io(#[from] std::io::Error),

  /// The record store could not be parsed or serialized as CSV.
  #[error(transparent)]
  Csv(#[from] csv::Error),

  /// The record store is missing a column the pipeline needs to read.
  #[error("Record store is missing required column \"{0}\"")]
  MissingColumn(String),

  /// A row of the record store has more fields than its header.
  #[error("Record store line {line} has {fields} fields, but the header has {header}")]
  MalformedRow {
    /// 1-based line of the offending row
    line:   u64,
    /// Number of fields in the row
    fields: usize,
    /// Number of columns in the header
    header: usize,
  },

  /// Two rows in the record store share a `link`, so updates cannot be routed.
  #[error("Record store contains duplicate link \"{0}\"")]
  DuplicateLink(String),

  /// An update was addressed to a `link` that is not in the record store.
  #[error("No record with link \"{0}\" in the record store")]
  UnknownLink(String),

  /// Atomically replacing the record store with its checkpoint failed.
  #[error(transparent)]
  Persist(#[from] tempfile::PersistError),

  /// A network request to the metadata source failed.
  #[error(transparent)]
  Network(#[from] reqwest::Error),

  /// The metadata source returned a document that is not well-formed XML.
  #[error(transparent)]
  Xml(#[from] quick_xml::Error),

  /// The metadata source returned an error response or an unexpected document.
  #[error("API error: {0}")]
  ApiError(String),

  /// The generative API failed its availability check before the first row.
  #[error("Generative API is not available: {0}")]
  ServiceUnavailable(String),

  /// A configuration file could not be decoded.
  #[error(transparent)]
  TomlDe(#[from] toml::de::Error),

  /// The environment variable holding the generative API key is not set.
  #[error("{0} environment variable is not set")]
  MissingApiKey(String),

  /// Any other configuration problem.
  #[error("{0}")]
  Config(String),
}

impl AbstractorError {
  /// Whether this error came from reading or writing the record store.
  ///
  /// Storage errors are always fatal for a summarization run.
  pub fn is_storage(&self) -> bool {
    matches!(
      self,
      Self::Io(_)
        | Self::Csv(_)
        | Self::MissingColumn(_)
        | Self::MalformedRow { .. }
        | Self::DuplicateLink(_)
        | Self::UnknownLink(_)
        | Self::Persist(_)
    )
  }
}

/// Classification of a failed exchange with the generative API.
///
/// Each variant carries a human-readable message. The message is what ends up in the record
/// store (prefixed with `Error: `) when the row gives up.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallError {
  /// The prompt was empty, or the service rejected the request as malformed. Never retried.
  #[error("{0}")]
  InvalidInput(String),

  /// The service's content filter blocked the prompt or the response. Never retried, since an
  /// identical prompt against the same filter cannot succeed.
  #[error("{0}")]
  Blocked(String),

  /// The service rejected the call for quota or rate-limit reasons. Retried up to the budget,
  /// after which the whole run halts.
  #[error("{0}")]
  QuotaExceeded(String),

  /// Any other transport or unexpected failure. Retried up to the budget, after which only the
  /// current row gives up.
  #[error("{0}")]
  Transient(String),
}

impl CallError {
  /// Whether another attempt at the same prompt could succeed.
  pub fn is_retryable(&self) -> bool { matches!(self, Self::QuotaExceeded(_) | Self::Transient(_)) }

  /// The message carried by this classification.
  pub fn message(&self) -> &str {
    match self {
      Self::InvalidInput(m) | Self::Blocked(m) | Self::QuotaExceeded(m) | Self::Transient(m) => m,
    }
  }

  /// Short name of the classification, used in log lines.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::InvalidInput(_) => "invalid input",
      Self::Blocked(_) => "blocked",
      Self::QuotaExceeded(_) => "quota exceeded",
      Self::Transient(_) => "transient",
    }
  }
}
