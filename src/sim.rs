//! An in-memory fixture for demos and tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::driver::{Driver, PollReading, WriteCommand};
use crate::errors::TransportError;
use crate::runtime;

type Result<T> = std::result::Result<T, TransportError>;

/// How the simulated fixture answers a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    /// Answers with its state and `online = true`.
    Up,
    /// Answers, but reports `online = false`.
    Offline,
    /// Does not answer; polls and writes fail with a transport error.
    Down,
}

#[derive(Debug)]
struct SimState {
    device: PollReading,
    link: Link,
    script: VecDeque<Link>,
    fail_writes: bool,
    writes: Vec<WriteCommand>,
}

/// A fixture that lives in memory.
///
/// Writes are applied to the simulated device, so a verifying poll sees them.
/// Individual polls can be scripted with [`SimulatedDriver::queue`] to inject
/// failures; once the script runs out the default [`Link`] applies.
#[derive(Debug)]
pub struct SimulatedDriver {
    state: Mutex<SimState>,
    polls: AtomicUsize,
    latency: Duration,
}

impl SimulatedDriver {
    pub fn new(power: bool, brightness: i64, color_temp: i64) -> Self {
        SimulatedDriver {
            state: Mutex::new(SimState {
                device: PollReading {
                    online: true,
                    power,
                    brightness,
                    color_temp,
                },
                link: Link::Up,
                script: VecDeque::new(),
                fail_writes: false,
                writes: Vec::new(),
            }),
            polls: AtomicUsize::new(0),
            latency: Duration::ZERO,
        }
    }

    /// A fixture that is on and answering.
    pub fn online(brightness: i64, color_temp: i64) -> Self {
        Self::new(true, brightness, color_temp)
    }

    /// A fixture that answers every poll with `online = false`.
    pub fn offline() -> Self {
        let driver = Self::new(false, 10, 2700);
        driver.set_link(Link::Offline);
        driver
    }

    /// Delay every driver call by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn set_link(&self, link: Link) {
        self.lock().link = link;
    }

    /// Script the answers of the next polls, ahead of the default link.
    pub fn queue(&self, links: impl IntoIterator<Item = Link>) {
        self.lock().script.extend(links);
    }

    /// Change the device state behind the engine's back.
    pub fn set_device(&self, power: bool, brightness: i64, color_temp: i64) {
        let mut state = self.lock();
        state.device.power = power;
        state.device.brightness = brightness;
        state.device.color_temp = color_temp;
    }

    pub fn fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    pub fn poll_count(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    /// Every write the driver accepted or rejected, in order.
    pub fn writes(&self) -> Vec<WriteCommand> {
        self.lock().writes.clone()
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn delay(&self) {
        if !self.latency.is_zero() {
            runtime::sleep(self.latency).await;
        }
    }
}

impl Driver for SimulatedDriver {
    async fn poll(&self) -> Result<PollReading> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        self.delay().await;

        let mut state = self.lock();
        let link = state.script.pop_front().unwrap_or(state.link);
        match link {
            Link::Up => Ok(PollReading {
                online: true,
                ..state.device
            }),
            Link::Offline => Ok(PollReading {
                online: false,
                ..state.device
            }),
            Link::Down => Err(TransportError::socket(
                "receive",
                std::io::Error::new(std::io::ErrorKind::TimedOut, "receive timeout"),
            )),
        }
    }

    async fn write(&self, command: WriteCommand) -> Result<()> {
        self.delay().await;

        let mut state = self.lock();
        state.writes.push(command);
        if state.fail_writes || state.link == Link::Down {
            return Err(TransportError::Other(format!("{command} rejected")));
        }
        match command {
            WriteCommand::Power(on) => state.device.power = on,
            WriteCommand::Brightness(b) => state.device.brightness = i64::from(b.value()),
            WriteCommand::ColorTemp(k) => state.device.color_temp = i64::from(k.kelvin()),
        }
        Ok(())
    }
}

#[cfg(all(test, feature = "runtime-tokio"))]
mod tests {
    use super::*;
    use crate::types::Brightness;

    #[tokio::test]
    async fn test_script_runs_before_default_link() {
        let driver = SimulatedDriver::online(100, 3000);
        driver.queue([Link::Down, Link::Offline]);

        assert!(driver.poll().await.is_err());
        assert!(!driver.poll().await.unwrap().online);
        assert!(driver.poll().await.unwrap().online);
        assert_eq!(driver.poll_count(), 3);
    }

    #[tokio::test]
    async fn test_writes_apply_to_device() {
        let driver = SimulatedDriver::online(100, 3000);
        driver
            .write(WriteCommand::Brightness(Brightness::clamped(200)))
            .await
            .unwrap();
        assert_eq!(driver.poll().await.unwrap().brightness, 200);

        driver.fail_writes(true);
        assert!(driver.write(WriteCommand::Power(false)).await.is_err());
        assert!(driver.poll().await.unwrap().power);
        assert_eq!(driver.writes().len(), 2);
    }
}
