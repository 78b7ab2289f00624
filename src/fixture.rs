//! A single reconciled fixture.

use std::sync::{Arc, Mutex as SyncMutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use log::{debug, error, warn};
use serde_json::{Value, json};

use crate::availability::{Availability, AvailabilityRecord, AvailabilityTracker};
use crate::config::{FixtureConfig, Tuning};
use crate::driver::{Driver, Field, PollReading, WriteCommand};
use crate::errors::{Error, PollFailure, TransportError};
use crate::history::{EventHistory, EventKind};
use crate::poller::RateLimitedPoller;
use crate::runtime::{self, JoinHandle, Mutex};
use crate::status::DeviceState;
use crate::types::{Brightness, ColorMode, Kelvin};

type Result<T> = std::result::Result<T, Error>;

/// What a command ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The fixture was unavailable; nothing was written.
    Skipped,
    /// A write failed. It counted as one failure and no verifying poll ran.
    WriteFailed { field: Field },
    /// The writes went through and the verifying poll ran.
    Verified(Availability),
}

#[derive(Debug)]
struct Shared {
    state: DeviceState,
    tracker: AvailabilityTracker,
    history: EventHistory,
}

/// A network light whose state is cached locally and reconciled with the device.
///
/// Reads never touch the network. [`Fixture::refresh`] polls the fixture at most
/// once per `min_poll_interval`; commands write to the fixture and then always
/// poll it to learn what actually happened. Transport failures never escape:
/// they feed a debounced `available` flag instead.
///
/// Poll cycles and commands on one fixture run one at a time, and a command's
/// write, settle delay and verifying poll are never interleaved with anything
/// else.
///
/// # Example
///
/// ```
/// use opple_lights_rs::{Fixture, FixtureConfig, SimulatedDriver};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let config = FixtureConfig::new("192.168.1.20", "AA:BB:CC:DD:EE:FF", Some("Desk"));
/// let fixture = Fixture::new(config, SimulatedDriver::online(120, 4000)).unwrap();
/// assert!(!fixture.available());
///
/// fixture.refresh().await;
/// assert!(fixture.available());
/// assert_eq!(fixture.brightness().value(), 120);
/// # });
/// ```
#[derive(Debug)]
pub struct Fixture<D> {
    config: FixtureConfig,
    tuning: Tuning,
    driver: D,
    // held for a whole poll cycle or command
    cycle: Mutex<RateLimitedPoller>,
    // only locked for short commits, never across an await
    shared: SyncMutex<Shared>,
}

impl<D: Driver> Fixture<D> {
    pub fn new(config: FixtureConfig, driver: D) -> Result<Self> {
        Self::with_tuning(config, Tuning::default(), driver)
    }

    pub fn with_tuning(config: FixtureConfig, tuning: Tuning, driver: D) -> Result<Self> {
        config.validate()?;
        tuning.validate()?;

        Ok(Fixture {
            cycle: Mutex::new(RateLimitedPoller::new(&tuning)),
            shared: SyncMutex::new(Shared {
                state: DeviceState::default(),
                tracker: AvailabilityTracker::new(tuning.failure_threshold),
                history: EventHistory::new(),
            }),
            config,
            tuning,
            driver,
        })
    }

    pub fn config(&self) -> &FixtureConfig {
        &self.config
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn host(&self) -> &str {
        &self.config.host
    }

    pub fn unique_id(&self) -> String {
        self.config.unique_id()
    }

    /// Snapshot of the cached state.
    pub fn state(&self) -> DeviceState {
        self.shared().state
    }

    pub fn available(&self) -> bool {
        self.state().available
    }

    pub fn is_on(&self) -> bool {
        self.state().power_on
    }

    pub fn brightness(&self) -> Brightness {
        self.state().brightness
    }

    pub fn color_temp(&self) -> Kelvin {
        self.state().color_temp
    }

    pub fn availability(&self) -> Availability {
        self.shared().tracker.state()
    }

    pub fn record(&self) -> AvailabilityRecord {
        self.shared().tracker.record()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.shared().tracker.consecutive_failures()
    }

    pub fn color_mode(&self) -> ColorMode {
        ColorMode::ColorTemp
    }

    pub fn supported_color_modes(&self) -> &'static [ColorMode] {
        &[ColorMode::ColorTemp]
    }

    pub fn min_color_temp(&self) -> Kelvin {
        Kelvin { kelvin: Kelvin::MIN }
    }

    pub fn max_color_temp(&self) -> Kelvin {
        Kelvin { kelvin: Kelvin::MAX }
    }

    pub fn history(&self) -> EventHistory {
        self.shared().history.clone()
    }

    pub fn clear_history(&self) {
        self.shared().history.clear();
    }

    /// Returns diagnostics including identity, state, availability and history.
    pub fn diagnostics(&self) -> Value {
        let shared = self.shared();
        json!({
            "name": self.config.name,
            "host": self.config.host,
            "unique_id": self.config.unique_id(),
            "state": shared.state,
            "availability": shared.tracker.state(),
            "record": shared.tracker.record(),
            "failure_threshold": shared.tracker.failure_threshold(),
            "history": shared.history.summary(),
        })
    }

    /// Poll the fixture unless it was polled within the last `min_poll_interval`.
    ///
    /// Returns the availability after the cycle, or `None` when the call was
    /// throttled and the cached state was left as is.
    pub async fn refresh(&self) -> Option<Availability> {
        let mut poller = self.cycle.lock().await;
        let outcome = poller.poll(&self.driver, self.host()).await?;
        Some(self.commit(outcome.as_ref()))
    }

    /// Turn the light on, optionally setting brightness and color temperature.
    ///
    /// Parameters are clamped into the supported ranges. The power write is
    /// skipped when the cached state already says the light is on.
    pub async fn turn_on(&self, brightness: Option<i64>, color_temp: Option<i64>) -> CommandOutcome {
        self.command("turn on", |state| {
            let mut writes = Vec::with_capacity(3);
            if !state.power_on {
                writes.push(WriteCommand::Power(true));
            }
            if let Some(level) = brightness {
                writes.push(WriteCommand::Brightness(Brightness::clamped(level)));
            }
            if let Some(kelvin) = color_temp {
                writes.push(WriteCommand::ColorTemp(Kelvin::clamped(kelvin)));
            }
            writes
        })
        .await
    }

    pub async fn turn_off(&self) -> CommandOutcome {
        self.command("turn off", |_| vec![WriteCommand::Power(false)])
            .await
    }

    pub async fn set_brightness(&self, brightness: i64) -> CommandOutcome {
        self.turn_on(Some(brightness), None).await
    }

    pub async fn set_color_temp(&self, color_temp: i64) -> CommandOutcome {
        self.turn_on(None, Some(color_temp)).await
    }

    /// Write, let the fixture settle, then poll it to learn the real state.
    async fn command<F>(&self, label: &str, plan: F) -> CommandOutcome
    where
        F: FnOnce(&DeviceState) -> Vec<WriteCommand>,
    {
        let mut poller = self.cycle.lock().await;

        let state = self.state();
        if !state.available {
            warn!("{}: unavailable, ignoring {label}", self.host());
            self.shared().history.record(EventKind::Skipped, label);
            return CommandOutcome::Skipped;
        }

        for command in plan(&state) {
            if let Err(error) = self.write(command).await {
                error!("{}: {label} failed writing {command}: {error}", self.host());
                let failure = PollFailure::Write {
                    field: command.field(),
                    error,
                };
                self.commit(Err(&failure));
                return CommandOutcome::WriteFailed {
                    field: command.field(),
                };
            }
            debug!("{}: wrote {command}", self.host());
            self.shared()
                .history
                .record(EventKind::Write, command.to_string());
        }

        runtime::sleep(self.tuning.settle_delay).await;
        let outcome = poller.force_poll(&self.driver, self.host()).await;
        CommandOutcome::Verified(self.commit(outcome.as_ref()))
    }

    async fn write(&self, command: WriteCommand) -> std::result::Result<(), TransportError> {
        match self.tuning.attempt_timeout {
            Some(limit) => runtime::timeout(limit, self.driver.write(command))
                .await
                .map_err(|_| TransportError::Timeout(limit))?,
            None => self.driver.write(command).await,
        }
    }

    /// Fold one cycle outcome into the state and record in a single step.
    fn commit(&self, outcome: std::result::Result<&PollReading, &PollFailure>) -> Availability {
        let mut shared = self.shared();
        let Shared {
            state,
            tracker,
            history,
        } = &mut *shared;

        let before = tracker.state();
        let after = tracker.observe(state, outcome);

        match outcome {
            Ok(_) => {
                debug!(
                    "{}: online, power={} brightness={} color_temp={}",
                    self.host(),
                    state.power(),
                    state.brightness,
                    state.color_temp
                );
                history.record(
                    EventKind::PollSuccess,
                    format!(
                        "power={} brightness={} color_temp={}",
                        state.power(),
                        state.brightness,
                        state.color_temp
                    ),
                );
            }
            Err(failure) => {
                let kind = match failure {
                    PollFailure::Write { .. } => EventKind::WriteFailure,
                    _ => EventKind::PollFailure,
                };
                history.record(kind, failure.to_string());
            }
        }

        match after {
            Availability::Offline if before != Availability::Offline => warn!(
                "{}: {} consecutive failures, marking unavailable",
                self.host(),
                tracker.consecutive_failures()
            ),
            Availability::Degraded { failures } => debug!(
                "{}: temporarily unreachable ({failures} failures), keeping last state",
                self.host()
            ),
            _ => {}
        }
        after
    }

    fn shared(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<D: Driver + 'static> Fixture<D> {
    /// Call [`Fixture::refresh`] every `interval` in a background task.
    ///
    /// The task ends on its own once the fixture is dropped; abort the handle
    /// to stop it earlier. Aborting never leaves the cached state half updated.
    pub fn spawn_refresh_loop(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let fixture: Weak<Self> = Arc::downgrade(self);
        runtime::spawn(async move {
            loop {
                let Some(fixture) = fixture.upgrade() else {
                    break;
                };
                fixture.refresh().await;
                drop(fixture);
                runtime::sleep(interval).await;
            }
        })
    }
}
