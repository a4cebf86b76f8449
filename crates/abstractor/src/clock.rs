//! Time source for the pipeline's two suspension points.
//!
//! Pacing and retry backoff both need to read a monotonic clock and to block for a while. They
//! take a [`Clock`] instead of calling into `tokio::time` directly so that tests can drive them
//! with a [`FakeClock`], which returns immediately from [`Clock::sleep`] and simply advances its
//! own notion of "now".

use std::{
  sync::{Arc, Mutex},
  time::Instant,
};

use super::*;

/// Monotonic time plus the ability to block the caller.
#[async_trait]
pub trait Clock: Send + Sync {
  /// The current instant.
  fn now(&self) -> Instant;

  /// Suspends the caller for `duration`.
  async fn sleep(&self, duration: Duration);
}

/// [`Clock`] backed by the real monotonic clock and the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
  fn now(&self) -> Instant { Instant::now() }

  async fn sleep(&self, duration: Duration) { tokio::time::sleep(duration).await }
}

/// [`Clock`] whose time only moves when someone sleeps on it or calls [`FakeClock::advance`].
///
/// Every requested sleep is recorded, so tests can assert on the exact delays a component asked
/// for. Clones share the same timeline.
///
/// ```
/// # use std::time::Duration;
/// # use abstractor::clock::{Clock, FakeClock};
/// # tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(async {
/// let clock = FakeClock::new();
/// let start = clock.now();
/// clock.sleep(Duration::from_secs(120)).await;
/// assert_eq!(clock.now() - start, Duration::from_secs(120));
/// assert_eq!(clock.sleeps(), vec![Duration::from_secs(120)]);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct FakeClock {
  /// Shared timeline.
  inner: Arc<Mutex<FakeTimeline>>,
}

/// State behind a [`FakeClock`].
#[derive(Debug)]
struct FakeTimeline {
  /// The instant the clock was created at.
  origin:  Instant,
  /// How far the clock has moved past `origin`.
  elapsed: Duration,
  /// Every duration passed to `sleep`, in order.
  sleeps:  Vec<Duration>,
}

impl FakeClock {
  /// Creates a clock frozen at the current instant.
  pub fn new() -> Self {
    Self {
      inner: Arc::new(Mutex::new(FakeTimeline {
        origin:  Instant::now(),
        elapsed: Duration::ZERO,
        sleeps:  Vec::new(),
      })),
    }
  }

  /// Moves time forward without recording a sleep, e.g. to simulate a slow request.
  pub fn advance(&self, duration: Duration) { self.timeline().elapsed += duration; }

  /// Every sleep requested so far, in order.
  pub fn sleeps(&self) -> Vec<Duration> { self.timeline().sleeps.clone() }

  /// Duration since the clock was created.
  pub fn elapsed(&self) -> Duration { self.timeline().elapsed }

  /// Locks the timeline, recovering from a poisoned lock since the state is plain data.
  fn timeline(&self) -> std::sync::MutexGuard<'_, FakeTimeline> {
    self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }
}

impl Default for FakeClock {
  fn default() -> Self { Self::new() }
}

#[async_trait]
impl Clock for FakeClock {
  fn now(&self) -> Instant {
    let timeline = self.timeline();
    timeline.origin + timeline.elapsed
  }

  async fn sleep(&self, duration: Duration) {
    let mut timeline = self.timeline();
    timeline.elapsed += duration;
    timeline.sleeps.push(duration);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_fake_clock_shares_timeline_across_clones() {
    let clock = FakeClock::new();
    let other = clock.clone();
    let start = clock.now();

    other.sleep(Duration::from_secs(5)).await;
    clock.advance(Duration::from_secs(1));

    assert_eq!(clock.now() - start, Duration::from_secs(6));
    assert_eq!(clock.sleeps(), vec![Duration::from_secs(5)]);
    assert_eq!(other.elapsed(), Duration::from_secs(6));
  }

  #[tokio::test]
  async fn test_system_clock_sleeps() {
    let clock = SystemClock;
    let start = clock.now();
    clock.sleep(Duration::from_millis(5)).await;
    assert!(clock.now() - start >= Duration::from_millis(5));
  }
}
