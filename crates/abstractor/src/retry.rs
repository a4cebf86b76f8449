//! Bounded, classification-aware retries around one generative call per record.
//!
//! Each record goes through a small state machine:
//!
//! ```text
//!                 Success
//!   Attempting(n) ───────────────────────────────▶ Succeeded
//!        │  Blocked | InvalidInput
//!        ├───────────────────────────────────────▶ GaveUp
//!        │  QuotaExceeded | Transient, n < max-1
//!        ├── sleep(retry_delay * (n+1)) ─────────▶ Attempting(n+1)
//!        │  QuotaExceeded, n == max-1
//!        ├───────────────────────────────────────▶ Fatal
//!        │  Transient, n == max-1
//!        └───────────────────────────────────────▶ GaveUp
//! ```
//!
//! Quota exhaustion is a property of the account, so once the budget is spent on one record
//! every later record would fail the same way and the run halts. A transient failure is noise
//! specific to one record, so only that record gives up.
//!
//! [`RetryPolicy::transition`] is the pure transition function; [`RetryPolicy::run`] drives it
//! against a real client and clock.

use super::*;
use crate::{
  llm::{CallResult, SummaryClient},
  pacing::Pacer,
  prompt::Prompt,
};

/// Default number of attempts per record.
pub const MAX_RETRIES: u32 = 3;

/// Default base of the linear backoff.
pub const RETRY_DELAY: Duration = Duration::from_secs(120);

/// Result of processing one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
  /// The generated summary.
  Success(String),
  /// The record failed; mark it and carry on with the next one.
  RecoverableError(String),
  /// The record failed in a way that dooms the rest of the run; mark it and stop.
  FatalError(String),
}

impl Outcome {
  /// Value written to the record's `ai_abstract`.
  pub fn annotation(&self) -> String {
    match self {
      Self::Success(text) => text.clone(),
      Self::RecoverableError(reason) | Self::FatalError(reason) => format!("Error: {reason}"),
    }
  }

  /// Whether the run must stop after this record.
  pub fn is_fatal(&self) -> bool { matches!(self, Self::FatalError(_)) }
}

/// State of one record inside the retry controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptState {
  /// About to make attempt `n` (zero-based).
  Attempting(u32),
  /// Terminal: the service produced a summary.
  Succeeded(String),
  /// Terminal: this record will not get a summary in this run.
  GaveUp(String),
  /// Terminal: no record will get a summary in this run.
  Fatal(String),
}

impl AttemptState {
  /// Whether no further transition is possible.
  pub fn is_terminal(&self) -> bool { !matches!(self, Self::Attempting(_)) }
}

impl TryFrom<AttemptState> for Outcome {
  type Error = u32;

  /// Converts a terminal state, handing back the attempt index of a non-terminal one.
  fn try_from(state: AttemptState) -> core::result::Result<Self, Self::Error> {
    match state {
      AttemptState::Attempting(n) => Err(n),
      AttemptState::Succeeded(text) => Ok(Self::Success(text)),
      AttemptState::GaveUp(reason) => Ok(Self::RecoverableError(reason)),
      AttemptState::Fatal(reason) => Ok(Self::FatalError(reason)),
    }
  }
}

/// Retry budget and backoff for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
  /// Total attempts allowed per record, at least one
  max_retries: u32,
  /// Base of the linear backoff
  retry_delay: Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self { Self::new(MAX_RETRIES, RETRY_DELAY) }
}

impl RetryPolicy {
  /// Creates a policy. A budget of zero is raised to one attempt.
  pub fn new(max_retries: u32, retry_delay: Duration) -> Self {
    Self { max_retries: max_retries.max(1), retry_delay }
  }

  /// Total attempts allowed per record.
  pub fn max_retries(&self) -> u32 { self.max_retries }

  /// Delay between attempt `attempt` and attempt `attempt + 1`, saturating at [`Duration::MAX`].
  pub fn backoff(&self, attempt: u32) -> Duration {
    self.retry_delay.checked_mul(attempt.saturating_add(1)).unwrap_or(Duration::MAX)
  }

  /// Next state after attempt `attempt` produced `result`.
  pub fn transition(&self, attempt: u32, result: CallResult) -> AttemptState {
    let budget_left = attempt + 1 < self.max_retries;
    match result {
      Ok(text) => AttemptState::Succeeded(text),
      Err(CallError::Blocked(reason) | CallError::InvalidInput(reason)) =>
        AttemptState::GaveUp(reason),
      Err(CallError::QuotaExceeded(_) | CallError::Transient(_)) if budget_left =>
        AttemptState::Attempting(attempt + 1),
      Err(CallError::QuotaExceeded(reason)) => AttemptState::Fatal(reason),
      Err(CallError::Transient(reason)) => AttemptState::GaveUp(reason),
    }
  }

  /// Drives the state machine for one prompt until it reaches a terminal state.
  ///
  /// The caller is expected to have waited on `pacer` before the first attempt; every later
  /// attempt waits on it again after its backoff, so call starts stay paced across retries.
  pub async fn run(
    &self,
    client: &dyn SummaryClient,
    clock: &dyn Clock,
    pacer: &mut Pacer,
    prompt: &Prompt,
  ) -> Outcome {
    let mut state = AttemptState::Attempting(0);

    loop {
      let attempt = match Outcome::try_from(state) {
        Ok(outcome) => return outcome,
        Err(attempt) => attempt,
      };

      if attempt > 0 {
        pacer.wait_if_needed(clock).await;
      }

      let result = client.call(prompt).await;
      if let Err(e) = &result {
        warn!(
          "API call failed with {} error (attempt {}/{}): {}",
          e.kind(),
          attempt + 1,
          self.max_retries,
          e
        );
      }

      state = self.transition(attempt, result);
      match &state {
        AttemptState::Attempting(_) => {
          let delay = self.backoff(attempt);
          info!("Waiting {} seconds before retry...", delay.as_secs());
          clock.sleep(delay).await;
        },
        AttemptState::GaveUp(reason) | AttemptState::Fatal(reason) if attempt > 0 =>
          error!("Max retries exceeded after {} attempts: {}", attempt + 1, reason),
        _ => (),
      }
    }
  }
}
