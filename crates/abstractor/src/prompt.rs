//! Prompt construction for paper summaries.

use super::*;
use crate::store::Record;

/// Text sent to the generative API for one record.
///
/// Built deterministically from the record's title, authors and original abstract, so the same
/// record always produces the same prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt(String);

impl Prompt {
  /// Builds the summarization prompt for a record.
  pub fn for_record(record: &Record) -> Self {
    Self(format!(
      "Summarize this scientific paper in a couple of sentences, focusing on:
1. The main research question or objective
2. Key findings and conclusions
3. Potential implications or applications

Do NOT begin with phrases like 'This paper' or 'This study'.

Title: {}
Authors: {}
Original Abstract: {}

If you cannot generate a summary, return only 'Unable to summarize'.
Only return the summary, nothing else.",
      record.title.trim(),
      record.authors.trim(),
      record.summary.trim(),
    ))
  }

  /// The prompt text.
  pub fn as_str(&self) -> &str { &self.0 }

  /// Whether there is any non-whitespace text to send.
  pub fn is_blank(&self) -> bool { self.0.trim().is_empty() }
}

impl From<&str> for Prompt {
  fn from(text: &str) -> Self { Self(text.to_string()) }
}

impl From<String> for Prompt {
  fn from(text: String) -> Self { Self(text) }
}

impl Display for Prompt {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(&self.0) }
}
