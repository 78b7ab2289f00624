//! # opple_lights_rs
//!
//! A resilient, runtime-agnostic state cache for Opple network lights.
//!
//! Opple fixtures answer queries over a lossy network link: polls time out,
//! writes occasionally bounce, and a fixture that looked dead a second ago is
//! fine again now. This crate keeps a locally cached view of one fixture and
//! reconciles it with the device, so a host (a home automation bridge, a CLI,
//! a dashboard) can read state without touching the network and send commands
//! without caring about transient failures.
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use opple_lights_rs::{Fixture, FixtureConfig};
//!
//! async fn control_light<D: opple_lights_rs::Driver + 'static>(driver: D) -> Result<(), Box<dyn std::error::Error>> {
//!     let config = FixtureConfig::new("192.168.1.20", "AA:BB:CC:DD:EE:FF", Some("Living Room"));
//!     let fixture = Arc::new(Fixture::new(config, driver)?);
//!
//!     // Keep the cache fresh in the background
//!     let _refresh = fixture.spawn_refresh_loop(Duration::from_secs(30));
//!
//!     // Commands never fail; they report what happened
//!     fixture.turn_on(Some(180), Some(4000)).await;
//!     println!("on: {}, available: {}", fixture.is_on(), fixture.available());
//!     Ok(())
//! }
//! ```
//!
//! ## How state is reconciled
//!
//! - **Retries**: a poll cycle tries the fixture up to 3 times, 1 s apart. A
//!   reply with `online = false` counts as a failed attempt.
//! - **Debounce**: the fixture is only reported unavailable after 2 failed
//!   cycles in a row, and comes back on the first success. While degraded the
//!   last known power, brightness and color temperature are kept.
//! - **Rate limit**: [`Fixture::refresh`] polls at most once every 5 s.
//! - **Verify after write**: commands clamp their parameters, write them, wait
//!   300 ms for the fixture to settle, then always poll to capture what the
//!   fixture actually did. A failed write counts as one failure.
//! - **Serialization**: cycles and commands on one fixture never interleave.
//!
//! All of the timings above are configurable through [`Tuning`].
//!
//! ## Drivers
//!
//! The wire protocol lives behind the [`Driver`] trait. Blocking drivers can
//! implement [`BlockingDriver`] and be wrapped in [`Unblocking`], which runs
//! them on the runtime's blocking pool. [`SimulatedDriver`] is an in-memory
//! fixture for demos and tests.
//!
//! ## Feature Flags
//!
//! - `runtime-tokio` (default): Use the tokio async runtime
//! - `runtime-async-std`: Use the async-std runtime
//! - `runtime-smol`: Use the smol runtime

mod availability;
mod config;
mod driver;
mod errors;
mod fixture;
mod history;
mod poller;
mod retry;
pub mod runtime;
mod sim;
mod status;
mod types;

// Re-export public API
pub use availability::{Availability, AvailabilityRecord, AvailabilityTracker};
pub use config::{FixtureConfig, Tuning};
pub use driver::{BlockingDriver, Driver, Field, PollReading, Unblocking, WriteCommand};
pub use errors::{Error, PollFailure, TransportError};
pub use fixture::{CommandOutcome, Fixture};
pub use history::{EventHistory, EventKind, HistoryEntry, HistorySummary};
pub use poller::RateLimitedPoller;
pub use retry::RetryPolicy;
pub use sim::{Link, SimulatedDriver};
pub use status::DeviceState;
pub use types::{Brightness, ColorMode, Kelvin, PowerMode, clamp_brightness, clamp_color_temp};
