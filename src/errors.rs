use std::time::Duration;

use crate::driver::Field;

/// Errors raised while building a fixture from configuration.
///
/// Device communication never surfaces as an [`Error`]: transport problems are
/// absorbed by the reconciliation engine and only show up through the
/// fixture's availability flag and the log.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failed to serialize data to JSON.
    #[error("failed to dump json: {0:?}")]
    JsonDump(serde_json::Error),

    /// Failed to deserialize JSON data.
    #[error("failed to load json: {0:?}")]
    JsonLoad(serde_json::Error),

    /// A configuration value is unusable.
    #[error("invalid config `{field}`: {reason}")]
    InvalidConfig { field: String, reason: String },
}

impl Error {
    /// Create a new invalid config error
    pub fn invalid_config(field: &str, reason: &str) -> Self {
        Error::InvalidConfig {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// A query or write failed at the device driver boundary.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The device did not answer in time.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// A socket operation failed while talking to the device.
    #[error("socket {action} error: {err:?}")]
    Socket { action: String, err: std::io::Error },

    /// The device answered with something that could not be decoded.
    #[error("malformed reply: {0}")]
    MalformedReply(String),

    /// Any other driver-specific failure.
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Create a new socket error
    pub fn socket(action: &str, err: std::io::Error) -> Self {
        TransportError::Socket {
            action: action.to_string(),
            err,
        }
    }
}

/// Why a poll cycle (or a command) counted as a failure.
///
/// This is the failure half of a poll outcome: the retry loop produces it, the
/// availability tracker consumes it, and the diagnostics keep the last one.
#[derive(Debug, thiserror::Error)]
pub enum PollFailure {
    /// Every attempt failed; carries the error of the last one.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The device answered but reported itself offline.
    #[error("device reported offline")]
    Offline,

    /// A command write failed; counted as one failure tick, never retried.
    #[error("write of {field} failed: {error}")]
    Write { field: Field, error: TransportError },
}

/// Hacky implementation of PartialEq for testing
#[cfg(test)]
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}

#[cfg(test)]
impl PartialEq for TransportError {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}
