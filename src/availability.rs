//! Debounced availability tracking.
//!
//! Raw poll outcomes are noisy: a single dropped packet should not make the
//! fixture flicker to unavailable in the host UI. The tracker only reports a
//! fixture offline after `failure_threshold` failed cycles in a row, and
//! brings it back on the very first success.

use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::driver::PollReading;
use crate::errors::PollFailure;
use crate::status::DeviceState;

/// Where the hysteresis machine currently sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(tag = "state", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Availability {
    /// Last cycle succeeded.
    Online,
    /// Some failures, still below the threshold.
    Degraded { failures: u32 },
    /// Threshold reached, or never seen online yet.
    Offline,
}

/// Counters behind the availability flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityRecord {
    /// Sticky: set on success, never cleared.
    pub last_known_available: bool,
    pub consecutive_failures: u32,
}

/// Hysteresis state machine turning poll outcomes into the `available` flag.
#[derive(Debug, Clone)]
pub struct AvailabilityTracker {
    record: AvailabilityRecord,
    state: Availability,
    failure_threshold: u32,
}

impl Default for AvailabilityTracker {
    fn default() -> Self {
        Self::new(Self::DEFAULT_FAILURE_THRESHOLD)
    }
}

impl AvailabilityTracker {
    pub const DEFAULT_FAILURE_THRESHOLD: u32 = 2;

    pub fn new(failure_threshold: u32) -> Self {
        AvailabilityTracker {
            record: AvailabilityRecord::default(),
            state: Availability::Offline,
            failure_threshold: failure_threshold.max(1),
        }
    }

    pub fn state(&self) -> Availability {
        self.state
    }

    pub fn record(&self) -> AvailabilityRecord {
        self.record
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.record.consecutive_failures
    }

    pub fn failure_threshold(&self) -> u32 {
        self.failure_threshold
    }

    /// Feed one cycle outcome into the machine and fold it into `device`.
    ///
    /// Returns the new state.
    pub fn observe(
        &mut self,
        device: &mut DeviceState,
        outcome: Result<&PollReading, &PollFailure>,
    ) -> Availability {
        match outcome {
            Ok(reading) => self.record_success(device, reading),
            Err(_) => self.record_failure(device),
        }
    }

    /// A cycle succeeded: recover immediately and capture the reading.
    pub fn record_success(&mut self, device: &mut DeviceState, reading: &PollReading) -> Availability {
        self.record.consecutive_failures = 0;
        self.record.last_known_available = true;
        self.state = Availability::Online;
        device.available = true;
        device.capture(reading);
        self.state
    }

    /// A cycle failed: count it and only go offline once the threshold is hit.
    ///
    /// The device fields keep their last known values either way.
    pub fn record_failure(&mut self, device: &mut DeviceState) -> Availability {
        self.record.consecutive_failures = self.record.consecutive_failures.saturating_add(1);
        let failures = self.record.consecutive_failures;

        if failures < self.failure_threshold {
            self.state = Availability::Degraded { failures };
            device.available = self.record.last_known_available;
        } else {
            self.state = Availability::Offline;
            device.available = false;
        }
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn online(brightness: i64, color_temp: i64) -> PollReading {
        PollReading {
            online: true,
            power: true,
            brightness,
            color_temp,
        }
    }

    #[test]
    fn test_starts_offline() {
        let tracker = AvailabilityTracker::default();
        assert_eq!(tracker.state(), Availability::Offline);
        assert_eq!(tracker.record(), AvailabilityRecord::default());
    }

    #[test]
    fn test_single_failure_is_debounced() {
        let mut tracker = AvailabilityTracker::default();
        let mut device = DeviceState::default();
        tracker.record_success(&mut device, &online(100, 3000));

        assert_eq!(
            tracker.record_failure(&mut device),
            Availability::Degraded { failures: 1 }
        );
        assert!(device.available);
        assert_eq!(device.brightness.value(), 100);
    }

    #[test]
    fn test_threshold_goes_offline() {
        let mut tracker = AvailabilityTracker::default();
        let mut device = DeviceState::default();
        tracker.record_success(&mut device, &online(100, 3000));
        tracker.record_failure(&mut device);

        assert_eq!(tracker.record_failure(&mut device), Availability::Offline);
        assert!(!device.available);
        assert!(tracker.record().last_known_available);
        assert_eq!(device.color_temp.kelvin(), 3000);
    }

    #[test]
    fn test_degraded_before_first_success_stays_unavailable() {
        let mut tracker = AvailabilityTracker::default();
        let mut device = DeviceState::default();

        tracker.record_failure(&mut device);
        assert!(!device.available);
    }

    #[test]
    fn test_single_success_recovers() {
        let mut tracker = AvailabilityTracker::default();
        let mut device = DeviceState::default();
        for _ in 0..7 {
            tracker.record_failure(&mut device);
        }
        assert_eq!(tracker.consecutive_failures(), 7);

        let failure = PollFailure::Offline;
        tracker.observe(&mut device, Err(&failure));
        assert_eq!(tracker.consecutive_failures(), 8);

        let reading = online(120, 4000);
        assert_eq!(tracker.observe(&mut device, Ok(&reading)), Availability::Online);
        assert_eq!(tracker.consecutive_failures(), 0);
        assert!(device.available);
        assert_eq!(device.brightness.value(), 120);
        assert_eq!(device.color_temp.kelvin(), 4000);
    }

    #[test]
    fn test_threshold_of_one_has_no_degraded_state() {
        let mut tracker = AvailabilityTracker::new(1);
        let mut device = DeviceState::default();
        tracker.record_success(&mut device, &online(100, 3000));

        assert_eq!(tracker.record_failure(&mut device), Availability::Offline);
        assert!(!device.available);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(Availability::Degraded { failures: 1 }.to_string(), "degraded");
    }
}
