//! Value types for light control parameters.

mod brightness;
mod kelvin;
mod power;

pub use brightness::{Brightness, clamp_brightness};
pub use kelvin::{Kelvin, clamp_color_temp};
pub use power::{ColorMode, PowerMode};
