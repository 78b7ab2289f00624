//! Brightness control for Opple lights.

use serde::{Deserialize, Serialize};

/// Clamps a raw brightness level into the range the fixture accepts (10-255).
pub fn clamp_brightness(value: i64) -> u8 {
    // the clamp bounds fit in u8, so the cast cannot truncate
    value.clamp(i64::from(Brightness::MIN), i64::from(Brightness::MAX)) as u8
}

/// Brightness level from 10 to 255.
///
/// Out-of-range values are not representable: [`Brightness::clamped`] pulls
/// them to the nearest bound and [`Brightness::create`] rejects them.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "u8", into = "u8")]
pub struct Brightness {
    pub(crate) value: u8,
}

impl Default for Brightness {
    fn default() -> Self {
        Brightness { value: Self::MIN }
    }
}

impl Brightness {
    pub const MIN: u8 = 10;
    pub const MAX: u8 = 255;

    /// The lowest brightness, same as [`Brightness::default`].
    ///
    /// ```
    /// use opple_lights_rs::Brightness;
    ///
    /// assert_eq!(Brightness::new().value(), 10);
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    /// Returns None if value is outside valid range (10-255).
    ///
    /// # Examples
    ///
    /// ```
    /// use opple_lights_rs::Brightness;
    ///
    /// assert!(Brightness::create(9).is_none());
    /// assert_eq!(Brightness::create(10).unwrap().value(), 10);
    /// ```
    pub fn create(value: u8) -> Option<Self> {
        if Self::is_valid(value) {
            Some(Brightness { value })
        } else {
            None
        }
    }

    /// Builds a brightness from any integer, clamping into 10-255.
    ///
    /// # Examples
    ///
    /// ```
    /// use opple_lights_rs::Brightness;
    ///
    /// assert_eq!(Brightness::clamped(300).value(), 255);
    /// assert_eq!(Brightness::clamped(-4).value(), 10);
    /// assert_eq!(Brightness::clamped(120).value(), 120);
    /// ```
    pub fn clamped(value: i64) -> Self {
        Brightness {
            value: clamp_brightness(value),
        }
    }

    fn is_valid(value: u8) -> bool {
        (Self::MIN..=Self::MAX).contains(&value)
    }
}

impl TryFrom<u8> for Brightness {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::create(value).ok_or_else(|| {
            format!(
                "brightness {value} outside {}-{}",
                Self::MIN,
                Self::MAX
            )
        })
    }
}

impl From<Brightness> for u8 {
    fn from(brightness: Brightness) -> Self {
        brightness.value
    }
}

impl std::fmt::Display for Brightness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}
