//! Rate-limited poll cycles.

use std::time::Duration;

use log::debug;

use crate::config::Tuning;
use crate::driver::{Driver, PollReading};
use crate::errors::PollFailure;
use crate::retry::RetryPolicy;
use crate::runtime::Instant;

/// Throttles full poll cycles against one fixture.
///
/// Each fixture instance owns its own poller, so the window is per fixture.
#[derive(Debug, Clone)]
pub struct RateLimitedPoller {
    min_interval: Duration,
    retry: RetryPolicy,
    last_poll: Option<Instant>,
}

impl Default for RateLimitedPoller {
    fn default() -> Self {
        Self::new(&Tuning::default())
    }
}

impl RateLimitedPoller {
    pub fn new(tuning: &Tuning) -> Self {
        RateLimitedPoller {
            min_interval: tuning.min_poll_interval,
            retry: RetryPolicy::from(tuning),
            last_poll: None,
        }
    }

    pub fn last_poll(&self) -> Option<Instant> {
        self.last_poll
    }

    /// True when a non-forced cycle would run at `now`.
    pub fn is_due(&self, now: Instant) -> bool {
        self.last_poll
            .is_none_or(|last| now - last >= self.min_interval)
    }

    /// Run one poll cycle unless the window is still closed.
    ///
    /// Returns `None` when the call was throttled; nothing is touched in that
    /// case.
    pub async fn poll<D: Driver>(
        &mut self,
        driver: &D,
        host: &str,
    ) -> Option<Result<PollReading, PollFailure>> {
        if !self.is_due(Instant::now()) {
            debug!("{host}: refresh skipped, polled less than {:?} ago", self.min_interval);
            return None;
        }
        Some(self.force_poll(driver, host).await)
    }

    /// Run one poll cycle regardless of the window.
    ///
    /// The window restarts once the cycle finishes, successful or not.
    pub async fn force_poll<D: Driver>(
        &mut self,
        driver: &D,
        host: &str,
    ) -> Result<PollReading, PollFailure> {
        let outcome = self.retry.run(host, || driver.poll()).await;
        self.last_poll = Some(Instant::now());
        outcome
    }
}
