//! Fixture configuration and engine tuning.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_with::{DurationMilliSeconds, serde_as};

use crate::errors::Error;

type Result<T> = std::result::Result<T, Error>;

/// Identity of one fixture, as configured by the host.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct FixtureConfig {
    /// Network address of the fixture.
    pub host: String,
    /// MAC address; the stable identifier the unique id is derived from.
    pub mac: String,
    #[serde(default = "FixtureConfig::default_name")]
    pub name: String,
}

impl FixtureConfig {
    pub const DEFAULT_NAME: &'static str = "Opple Light";

    pub fn new(host: &str, mac: &str, name: Option<&str>) -> Self {
        FixtureConfig {
            host: host.to_string(),
            mac: mac.to_string(),
            name: name.map_or_else(Self::default_name, String::from),
        }
    }

    /// Parse and validate a configuration from JSON.
    ///
    /// # Examples
    ///
    /// ```
    /// use opple_lights_rs::FixtureConfig;
    ///
    /// let config = FixtureConfig::from_json(r#"{"host": "192.168.1.20", "mac": "AA:BB:CC:DD:EE:FF"}"#).unwrap();
    /// assert_eq!(config.name, "Opple Light");
    /// assert_eq!(config.unique_id(), "opple_AABBCCDDEEFF");
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(Error::JsonLoad)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(Error::JsonDump)
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::invalid_config("host", "must not be empty"));
        }
        let digits: Vec<char> = self
            .mac
            .chars()
            .filter(|c| *c != ':' && *c != '-')
            .collect();
        if digits.len() != 12 || !digits.iter().all(char::is_ascii_hexdigit) {
            return Err(Error::invalid_config("mac", "expected 12 hex digits"));
        }
        Ok(())
    }

    /// Stable id for the host framework: `opple_` followed by the MAC without colons.
    pub fn unique_id(&self) -> String {
        format!("opple_{}", self.mac.replace(':', ""))
    }

    fn default_name() -> String {
        Self::DEFAULT_NAME.to_string()
    }
}

/// Timing and threshold knobs of the reconciliation engine.
///
/// Defaults match what Opple fixtures tolerate: a poll at most every five
/// seconds, three attempts one second apart, offline after two failed cycles.
#[serde_as]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Tuning {
    /// Refreshes closer together than this are skipped.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub min_poll_interval: Duration,
    /// Poll attempts per cycle.
    pub max_retries: u32,
    /// Pause between two poll attempts.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub retry_delay: Duration,
    /// Consecutive failed cycles before the fixture is reported unavailable.
    pub failure_threshold: u32,
    /// Pause between a successful write and the verifying poll.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub settle_delay: Duration,
    /// Upper bound on a single driver call. None waits forever.
    #[serde_as(as = "Option<DurationMilliSeconds<u64>>")]
    pub attempt_timeout: Option<Duration>,
}

impl Default for Tuning {
    fn default() -> Self {
        Tuning {
            min_poll_interval: Duration::from_secs(5),
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            failure_threshold: 2,
            settle_delay: Duration::from_millis(300),
            attempt_timeout: None,
        }
    }
}

impl Tuning {
    pub fn from_json(json: &str) -> Result<Self> {
        let tuning: Self = serde_json::from_str(json).map_err(Error::JsonLoad)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_retries == 0 {
            return Err(Error::invalid_config("max_retries", "must be at least 1"));
        }
        if self.failure_threshold == 0 {
            return Err(Error::invalid_config(
                "failure_threshold",
                "must be at least 1",
            ));
        }
        if self.attempt_timeout == Some(Duration::ZERO) {
            return Err(Error::invalid_config("attempt_timeout", "must not be zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_id_strips_colons() {
        let config = FixtureConfig::new("10.0.0.7", "a4:c1:38:00:11:22", Some("Desk"));
        assert_eq!(config.unique_id(), "opple_a4c138001122");
        assert_eq!(config.name, "Desk");
    }

    #[test]
    fn test_validate_rejects_bad_mac() {
        for mac in ["", "AA:BB:CC", "GG:BB:CC:DD:EE:FF", "AA:BB:CC:DD:EE:FF:00"] {
            let config = FixtureConfig::new("10.0.0.7", mac, None);
            assert!(config.validate().is_err(), "{mac}");
        }
        assert!(FixtureConfig::new("10.0.0.7", "AA-BB-CC-DD-EE-FF", None).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_host() {
        let err = FixtureConfig::from_json(r#"{"host": " ", "mac": "AABBCCDDEEFF"}"#).unwrap_err();
        assert_eq!(
            err,
            Error::invalid_config("host", "must not be empty")
        );
    }

    #[test]
    fn test_config_round_trips() {
        let config = FixtureConfig::new("10.0.0.7", "AABBCCDDEEFF", None);
        let json = config.to_json().unwrap();
        assert_eq!(FixtureConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_tuning_defaults_and_overrides() {
        let tuning = Tuning::from_json(r#"{"retry_delay": 250, "attempt_timeout": 2000}"#).unwrap();
        assert_eq!(tuning.retry_delay, Duration::from_millis(250));
        assert_eq!(tuning.attempt_timeout, Some(Duration::from_secs(2)));
        assert_eq!(tuning.max_retries, 3);
        assert_eq!(tuning.min_poll_interval, Duration::from_secs(5));
        assert_eq!(tuning.settle_delay, Duration::from_millis(300));
    }

    #[test]
    fn test_tuning_rejects_zero_budget() {
        assert!(Tuning::from_json(r#"{"max_retries": 0}"#).is_err());
        assert!(Tuning::from_json(r#"{"failure_threshold": 0}"#).is_err());
    }
}
