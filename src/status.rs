//! Cached fixture state.

use serde::{Deserialize, Serialize};

use crate::driver::PollReading;
use crate::types::{Brightness, Kelvin, PowerMode};

/// The last known state of a fixture, as exposed to the host.
///
/// Only the reconciliation engine writes it. `brightness` and `color_temp`
/// are always inside the fixture's supported ranges.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceState {
    pub power_on: bool,
    pub brightness: Brightness,
    pub color_temp: Kelvin,
    /// Debounced connectivity flag.
    pub available: bool,
}

impl DeviceState {
    pub fn power(&self) -> PowerMode {
        PowerMode::from(self.power_on)
    }

    /// Overwrite the light fields from a successful reading.
    ///
    /// Values the fixture reports out of range are clamped.
    pub(crate) fn capture(&mut self, reading: &PollReading) {
        self.power_on = reading.power;
        self.brightness = Brightness::clamped(reading.brightness);
        self.color_temp = Kelvin::clamped(reading.color_temp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_respects_ranges() {
        let state = DeviceState::default();
        assert!(!state.power_on);
        assert!(!state.available);
        assert_eq!(state.brightness.value(), Brightness::MIN);
        assert_eq!(state.color_temp.kelvin(), Kelvin::MIN);
        assert_eq!(state.power(), PowerMode::Off);
    }

    #[test]
    fn test_capture_clamps_reported_values() {
        let mut state = DeviceState::default();
        state.capture(&PollReading {
            online: true,
            power: true,
            brightness: 0,
            color_temp: 6500,
        });
        assert_eq!(state.power(), PowerMode::On);
        assert_eq!(state.brightness.value(), 10);
        assert_eq!(state.color_temp.kelvin(), 5700);
        assert!(!state.available);
    }
}
