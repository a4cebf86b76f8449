//! The batch orchestrator.
//!
//! A [`Pipeline`] walks the pending records of a [`RecordStore`] in row order and, for each one,
//! builds the prompt, waits on the pacer, runs the retry controller around the client and writes
//! the outcome back to the store before moving on. Because every row is checkpointed before the
//! next one starts, a run can be killed at any moment and the next run picks up exactly where
//! this one left off, without repeating a completed call.
//!
//! The pipeline never exits the process. A halt caused by quota exhaustion is reported through
//! [`RunReport::halted`]; every other failure (the store becoming unreadable or unwritable,
//! mostly) is returned as an error. Mapping either to an exit status is up to the caller.

use super::*;
use crate::{
  llm::SummaryClient,
  pacing::Pacer,
  prompt::Prompt,
  retry::{Outcome, RetryPolicy},
  store::RecordStore,
};

/// Number of summary characters echoed into the progress log.
const SUMMARY_PREVIEW_CHARS: usize = 200;

/// Summary of one [`Pipeline::run`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
  /// Records that were pending when the run started
  pub pending:   usize,
  /// Records that received a summary
  pub succeeded: usize,
  /// Records marked with a recoverable error
  pub failed:    usize,
  /// Reason the run stopped early, if it did
  pub halted:    Option<String>,
}

impl RunReport {
  /// Whether the run went through every pending record.
  pub fn is_complete(&self) -> bool { self.halted.is_none() }

  /// Records that were left pending because the run halted.
  pub fn unprocessed(&self) -> usize {
    self.pending - self.succeeded - self.failed - usize::from(self.halted.is_some())
  }
}

/// Drives summarization of every pending record in a store.
pub struct Pipeline<'a> {
  /// Outbound generative API
  client:    &'a dyn SummaryClient,
  /// Source of time for pacing and backoff
  clock:     &'a dyn Clock,
  /// Call pacing, kept across runs of the same pipeline
  pacer:     Pacer,
  /// Per-record retry budget
  policy:    RetryPolicy,
  /// Whether to probe the client before the first pending record
  preflight: bool,
}

impl<'a> Pipeline<'a> {
  /// Creates a pipeline without an availability probe.
  pub fn new(
    client: &'a dyn SummaryClient,
    clock: &'a dyn Clock,
    pacer: Pacer,
    policy: RetryPolicy,
  ) -> Self {
    Self { client, clock, pacer, policy, preflight: false }
  }

  /// Probes the client once, paced like any other call, before the first pending record.
  ///
  /// Nothing is probed when nothing is pending.
  pub fn with_preflight(mut self, preflight: bool) -> Self {
    self.preflight = preflight;
    self
  }

  /// Summarizes every pending record of `store`.
  ///
  /// # Errors
  ///
  /// Returns an error if the store cannot be read or checkpointed, or if the availability probe
  /// fails. Per-record failures are written to the store instead and do not surface here.
  pub async fn run(&mut self, store: &mut RecordStore) -> Result<RunReport> {
    store.ensure_schema()?;

    let pending = store.load_pending();
    let mut report = RunReport { pending: pending.len(), ..RunReport::default() };
    if pending.is_empty() {
      info!("All papers have been summarized!");
      return Ok(report);
    }

    let total = pending.len();
    info!("Found {} papers to summarize in {:?}", total, store.path());

    if self.preflight {
      self.pacer.wait_if_needed(self.clock).await;
      self.client.probe().await.map_err(|e| {
        error!("API availability check failed: {}", e);
        AbstractorError::ServiceUnavailable(e.to_string())
      })?;
      debug!("API availability check passed");
    }

    for (index, record) in pending.iter().enumerate() {
      let counter = index + 1;
      let prompt = Prompt::for_record(record);

      self.pacer.wait_if_needed(self.clock).await;
      let outcome = self.policy.run(self.client, self.clock, &mut self.pacer, &prompt).await;
      store.apply_update(&record.link, &outcome.annotation())?;

      match outcome {
        Outcome::Success(summary) => {
          report.succeeded += 1;
          info!("Summarized paper {}/{}: {}", counter, total, record.title);
          info!("Summary: {}...", preview(&summary));
        },
        Outcome::RecoverableError(reason) => {
          report.failed += 1;
          error!("Error processing paper {}/{}: {}", counter, total, reason);
        },
        Outcome::FatalError(reason) => {
          error!("Fatal error occurred on paper {}/{}: {}", counter, total, reason);
          report.halted = Some(reason);
          return Ok(report);
        },
      }
    }

    info!(
      "Finished summarizing: {} succeeded, {} failed out of {}",
      report.succeeded, report.failed, total
    );
    Ok(report)
  }
}

/// First [`SUMMARY_PREVIEW_CHARS`] characters of a summary.
fn preview(summary: &str) -> String { summary.chars().take(SUMMARY_PREVIEW_CHARS).collect() }
