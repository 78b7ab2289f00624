//! Power and color mode for light control.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

/// Power state for a light.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum PowerMode {
    /// Turn the light on
    On,
    /// Turn the light off
    Off,
}

impl From<bool> for PowerMode {
    fn from(on: bool) -> Self {
        if on { PowerMode::On } else { PowerMode::Off }
    }
}

impl From<PowerMode> for bool {
    fn from(mode: PowerMode) -> Self {
        matches!(mode, PowerMode::On)
    }
}

/// Color modes a fixture can be driven in.
///
/// Opple fixtures only support tunable white.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ColorMode {
    ColorTemp,
}
