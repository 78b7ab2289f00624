//! Bounded retry of fixture polls.

use std::future::Future;
use std::time::Duration;

use log::debug;

use crate::config::Tuning;
use crate::driver::PollReading;
use crate::errors::{PollFailure, TransportError};
use crate::runtime;

/// How a single poll cycle retries the driver.
///
/// An attempt fails when the driver errors or when the fixture answers with
/// `online == false`. The delay is only slept between attempts, so a fully
/// failed cycle waits `(max_attempts - 1) * delay` on top of the I/O itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
    pub attempt_timeout: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&Tuning::default())
    }
}

impl From<&Tuning> for RetryPolicy {
    fn from(tuning: &Tuning) -> Self {
        RetryPolicy {
            max_attempts: tuning.max_retries,
            delay: tuning.retry_delay,
            attempt_timeout: tuning.attempt_timeout,
        }
    }
}

impl RetryPolicy {
    /// Run `op` until it yields an online reading or the attempts run out.
    ///
    /// On exhaustion the failure of the last attempt is returned.
    pub async fn run<F, Fut>(&self, host: &str, mut op: F) -> Result<PollReading, PollFailure>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<PollReading, TransportError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut last_failure = PollFailure::Offline;

        for attempt in 1..=max_attempts {
            let failure = match self.attempt(op()).await {
                Ok(reading) if reading.online => return Ok(reading),
                Ok(_) => PollFailure::Offline,
                Err(err) => PollFailure::Transport(err),
            };
            debug!("{host}: poll attempt {attempt}/{max_attempts} failed: {failure}");
            last_failure = failure;

            if attempt < max_attempts {
                runtime::sleep(self.delay).await;
            }
        }

        Err(last_failure)
    }

    async fn attempt<Fut>(&self, fut: Fut) -> Result<PollReading, TransportError>
    where
        Fut: Future<Output = Result<PollReading, TransportError>>,
    {
        match self.attempt_timeout {
            Some(limit) => runtime::timeout(limit, fut)
                .await
                .map_err(|_| TransportError::Timeout(limit))?,
            None => fut.await,
        }
    }
}

#[cfg(all(test, feature = "runtime-tokio"))]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::runtime::Instant;

    fn reading(online: bool) -> PollReading {
        PollReading {
            online,
            power: true,
            brightness: 100,
            color_temp: 3000,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_at_first_success() {
        let calls = Cell::new(0);
        let start = Instant::now();
        let res = RetryPolicy::default()
            .run("test", || {
                calls.set(calls.get() + 1);
                let online = calls.get() == 2;
                async move { Ok(reading(online)) }
            })
            .await;

        assert_eq!(res.unwrap(), reading(true));
        assert_eq!(calls.get(), 2);
        assert_eq!(start.elapsed(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_sleeps_between_attempts_only() {
        let calls = Cell::new(0);
        let start = Instant::now();
        let res = RetryPolicy::default()
            .run("test", || {
                calls.set(calls.get() + 1);
                async { Ok(reading(false)) }
            })
            .await;

        assert!(matches!(res, Err(PollFailure::Offline)));
        assert_eq!(calls.get(), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_keeps_last_error() {
        let calls = Cell::new(0);
        let res = RetryPolicy::default()
            .run("test", || {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move {
                    if n < 3 {
                        Ok(reading(false))
                    } else {
                        Err(TransportError::Other("refused".into()))
                    }
                }
            })
            .await;

        match res {
            Err(PollFailure::Transport(err)) => {
                assert_eq!(err, TransportError::Other("refused".into()));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_timeout_counts_as_failure() {
        let policy = RetryPolicy {
            max_attempts: 2,
            delay: Duration::from_millis(100),
            attempt_timeout: Some(Duration::from_millis(500)),
        };
        let start = Instant::now();
        let res = policy
            .run("test", || async {
                runtime::sleep(Duration::from_secs(60)).await;
                Ok(reading(true))
            })
            .await;

        assert!(matches!(
            res,
            Err(PollFailure::Transport(TransportError::Timeout(_)))
        ));
        assert_eq!(start.elapsed(), Duration::from_millis(1100));
    }
}
