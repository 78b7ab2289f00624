//! The device driver boundary.
//!
//! The engine never speaks the fixture's wire protocol itself. It consumes a
//! [`Driver`] that can query the fixture and write single fields to it, and
//! treats every failure the driver reports as transient.

use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

use crate::errors::TransportError;
use crate::runtime;
use crate::types::{Brightness, Kelvin};

type Result<T> = std::result::Result<T, TransportError>;

/// One answer to a poll, as reported by the fixture.
///
/// Numeric fields are raw; they are clamped into range when captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollReading {
    pub online: bool,
    pub power: bool,
    pub brightness: i64,
    pub color_temp: i64,
}

/// A field of the fixture that can be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Field {
    Power,
    Brightness,
    ColorTemp,
}

/// A single-field write, already validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum WriteCommand {
    Power(bool),
    Brightness(Brightness),
    ColorTemp(Kelvin),
}

impl WriteCommand {
    /// The field this command writes.
    pub fn field(&self) -> Field {
        match self {
            WriteCommand::Power(_) => Field::Power,
            WriteCommand::Brightness(_) => Field::Brightness,
            WriteCommand::ColorTemp(_) => Field::ColorTemp,
        }
    }
}

impl std::fmt::Display for WriteCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteCommand::Power(on) => write!(f, "power={}", if *on { "on" } else { "off" }),
            WriteCommand::Brightness(b) => write!(f, "brightness={b}"),
            WriteCommand::ColorTemp(k) => write!(f, "color_temp={k}"),
        }
    }
}

/// Async access to one fixture.
///
/// Both operations may take arbitrarily long and may fail; the engine bounds
/// and retries them.
pub trait Driver: Send + Sync {
    /// Query the fixture's current state.
    fn poll(&self) -> impl Future<Output = Result<PollReading>> + Send;

    /// Write one field to the fixture.
    fn write(&self, command: WriteCommand) -> impl Future<Output = Result<()>> + Send;
}

impl<D: Driver> Driver for Arc<D> {
    fn poll(&self) -> impl Future<Output = Result<PollReading>> + Send {
        (**self).poll()
    }

    fn write(&self, command: WriteCommand) -> impl Future<Output = Result<()>> + Send {
        (**self).write(command)
    }
}

/// A driver whose operations block the calling thread.
///
/// Wrap it in [`Unblocking`] to use it as a [`Driver`].
pub trait BlockingDriver: Send + Sync + 'static {
    fn poll(&self) -> Result<PollReading>;

    fn write(&self, command: WriteCommand) -> Result<()>;
}

/// Runs a [`BlockingDriver`] on the runtime's blocking pool.
#[derive(Debug)]
pub struct Unblocking<B>(Arc<B>);

impl<B: BlockingDriver> Unblocking<B> {
    pub fn new(driver: B) -> Self {
        Unblocking(Arc::new(driver))
    }

    pub fn inner(&self) -> &B {
        &self.0
    }
}

impl<B> Clone for Unblocking<B> {
    fn clone(&self) -> Self {
        Unblocking(Arc::clone(&self.0))
    }
}

impl<B: BlockingDriver> Driver for Unblocking<B> {
    async fn poll(&self) -> Result<PollReading> {
        let driver = Arc::clone(&self.0);
        runtime::unblock(move || driver.poll()).await
    }

    async fn write(&self, command: WriteCommand) -> Result<()> {
        let driver = Arc::clone(&self.0);
        runtime::unblock(move || driver.write(command)).await
    }
}
