//! Resumable, rate-limited summarization of academic papers.
//!
//! `abstractor` keeps a CSV file of paper metadata and fills in a generated summary for every
//! paper that does not have one yet, providing:
//!
//! - A durable record store that checkpoints after every row
//! - Pacing between calls to the generative API
//! - A Gemini client that classifies every failure
//! - A bounded retry policy keyed by failure class
//! - An orchestrator that ties these together and can be killed at any point
//! - An arXiv search client that feeds new papers into the store
//!
//! # Getting Started
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use abstractor::{
//!   clock::SystemClock,
//!   llm::GeminiClient,
//!   pacing::Pacer,
//!   pipeline::Pipeline,
//!   retry::RetryPolicy,
//!   store::RecordStore,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!   let mut store = RecordStore::open("papers.csv")?;
//!   let client = GeminiClient::new("my-api-key");
//!   let clock = SystemClock;
//!   let pacer = Pacer::new(Duration::from_secs(120));
//!
//!   let report =
//!     Pipeline::new(&client, &clock, pacer, RetryPolicy::default()).run(&mut store).await?;
//!   println!("Summarized {} papers", report.succeeded);
//!   Ok(())
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`store`]: The CSV record store and its checkpointing
//! - [`pacing`]: Minimum interval between outbound generative calls
//! - [`llm`]: The generative API client and its error classification
//! - [`retry`]: The per-row retry state machine
//! - [`pipeline`]: The batch orchestrator
//! - [`prompt`]: Prompt construction from a record
//! - [`retriever`]: arXiv metadata search
//! - [`clock`]: Injected time source so pacing and backoff are testable
//! - [`configuration`]: Runtime configuration
//! - [`prelude`]: Common traits and types for ergonomic imports

#![warn(missing_docs, clippy::missing_docs_in_private_items)]

use std::{
  fmt::Display,
  path::{Path, PathBuf},
  time::Duration,
};

use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, trace, warn};
#[cfg(test)]
use {tempfile::tempdir, tracing_test::traced_test};

pub mod clock;
pub mod configuration;
pub mod error;
pub mod llm;
pub mod pacing;
pub mod pipeline;
pub mod prompt;
pub mod retriever;
pub mod retry;
pub mod store;

use crate::{clock::*, error::*};

/// Common traits and types for ergonomic imports.
///
/// # Usage
///
/// ```no_run
/// use abstractor::prelude::*;
///
/// async fn first_pending(path: &str) -> Result<Option<String>, AbstractorError> {
///   let store = abstractor::store::RecordStore::open(path)?;
///   Ok(store.load_pending().into_iter().next().map(|record| record.title))
/// }
/// ```
pub mod prelude {
  pub use crate::{
    clock::Clock,
    error::{AbstractorError, CallError},
    llm::SummaryClient,
    retriever::MetadataSource,
  };
}
