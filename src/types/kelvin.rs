//! Color temperature control.

use serde::{Deserialize, Serialize};

/// Clamps a raw color temperature into the range the fixture accepts (2700K-5700K).
pub fn clamp_color_temp(kelvin: i64) -> u16 {
    // the clamp bounds fit in u16, so the cast cannot truncate
    kelvin.clamp(i64::from(Kelvin::MIN), i64::from(Kelvin::MAX)) as u16
}

/// Color temperature in Kelvin, with valid values from 2700K to 5700K.
///
/// Lower values produce warmer light, higher values cooler light:
/// - 2700K: Warm white (incandescent-like)
/// - 4000K: Neutral white
/// - 5700K: Cool white
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "u16", into = "u16")]
pub struct Kelvin {
    pub(crate) kelvin: u16,
}

impl Default for Kelvin {
    fn default() -> Self {
        Kelvin { kelvin: Self::MIN }
    }
}

impl Kelvin {
    pub const MIN: u16 = 2700;
    pub const MAX: u16 = 5700;

    /// Create a new Kelvin with the default value (2700K).
    ///
    /// # Examples
    ///
    /// ```
    /// use opple_lights_rs::Kelvin;
    ///
    /// assert_eq!(Kelvin::new().kelvin(), 2700);
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the kelvin value.
    pub fn kelvin(&self) -> u16 {
        self.kelvin
    }

    /// Create a new Kelvin with the given value.
    ///
    /// Returns `None` if value is outside the valid range (2700-5700).
    ///
    /// # Examples
    ///
    /// ```
    /// use opple_lights_rs::Kelvin;
    ///
    /// assert!(Kelvin::create(2699).is_none());
    /// assert!(Kelvin::create(2700).is_some());
    /// assert!(Kelvin::create(5700).is_some());
    /// assert!(Kelvin::create(5701).is_none());
    /// ```
    pub fn create(kelvin: u16) -> Option<Self> {
        if (Self::MIN..=Self::MAX).contains(&kelvin) {
            Some(Kelvin { kelvin })
        } else {
            None
        }
    }

    /// Builds a color temperature from any integer, clamping into 2700-5700.
    pub fn clamped(kelvin: i64) -> Self {
        Kelvin {
            kelvin: clamp_color_temp(kelvin),
        }
    }
}

impl TryFrom<u16> for Kelvin {
    type Error = String;

    fn try_from(kelvin: u16) -> Result<Self, Self::Error> {
        Self::create(kelvin)
            .ok_or_else(|| format!("color temperature {kelvin}K outside {}-{}K", Self::MIN, Self::MAX))
    }
}

impl From<Kelvin> for u16 {
    fn from(kelvin: Kelvin) -> Self {
        kelvin.kelvin
    }
}

impl std::fmt::Display for Kelvin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}K", self.kelvin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_color_temp() {
        assert_eq!(clamp_color_temp(0), 2700);
        assert_eq!(clamp_color_temp(2699), 2700);
        assert_eq!(clamp_color_temp(4000), 4000);
        assert_eq!(clamp_color_temp(5701), 5700);
        assert_eq!(clamp_color_temp(i64::MAX), 5700);
        assert_eq!(clamp_color_temp(i64::MIN), 2700);
    }

    #[test]
    fn test_display() {
        assert_eq!(Kelvin::clamped(4000).to_string(), "4000K");
    }
}
