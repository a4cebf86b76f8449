//! Minimum interval between outbound calls to the generative API.
//!
//! The interval is measured between the *completions* of consecutive [`Pacer::wait_if_needed`]
//! calls, and the caller issues its request right after each one returns, so in practice it is
//! the gap between request starts. How long a request takes to answer does not shorten the
//! next wait.

use std::time::Instant;

use super::*;

/// Default gap between two calls to the generative API.
pub const WAIT_BETWEEN_CALLS: Duration = Duration::from_secs(120);

/// Process-local pacing for a single caller.
#[derive(Debug, Clone)]
pub struct Pacer {
  /// Minimum gap between two calls
  interval:  Duration,
  /// When the previous [`Pacer::wait_if_needed`] returned
  last_call: Option<Instant>,
}

impl Pacer {
  /// Creates a pacer that has not yet let any call through.
  pub fn new(interval: Duration) -> Self { Self { interval, last_call: None } }

  /// The configured minimum gap.
  pub fn interval(&self) -> Duration { self.interval }

  /// Blocks until at least [`Pacer::interval`] has passed since the previous call returned.
  ///
  /// The first call never blocks. Returns how long it waited.
  pub async fn wait_if_needed(&mut self, clock: &dyn Clock) -> Duration {
    let mut waited = Duration::ZERO;

    if let Some(last_call) = self.last_call {
      let elapsed = clock.now().saturating_duration_since(last_call);
      if elapsed < self.interval {
        waited = self.interval - elapsed;
        info!("Waiting {:.1} seconds before next API call...", waited.as_secs_f64());
        clock.sleep(waited).await;
      }
    }

    self.last_call = Some(clock.now());
    waited
  }
}

impl Default for Pacer {
  fn default() -> Self { Self::new(WAIT_BETWEEN_CALLS) }
}
