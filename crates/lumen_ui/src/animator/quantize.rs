//! Discrete-step quantization of animated values.

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Float ulps of the step ratio within which a value counts as on a step.
const SNAP_ULPS: f32 = 4.0;

/// Rounding policy used when snapping a value to a discrete step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rounding {
    /// Round toward negative infinity.
    #[default]
    Floor,
    /// Round toward positive infinity.
    Ceil,
    /// Round toward zero.
    Truncate,
    /// Round to the nearest step, halves away from zero.
    Round,
}

impl Rounding {
    /// Returns the mode's property-style name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Floor => "floor",
            Self::Ceil => "ceil",
            Self::Truncate => "truncate",
            Self::Round => "round",
        }
    }

    fn apply(self, value: f32) -> f32 {
        match self {
            Self::Floor => value.floor(),
            Self::Ceil => value.ceil(),
            Self::Truncate => value.trunc(),
            Self::Round => value.round(),
        }
    }
}

impl FromStr for Rounding {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "floor" => Ok(Self::Floor),
            "ceil" => Ok(Self::Ceil),
            "truncate" | "trunc" => Ok(Self::Truncate),
            "round" => Ok(Self::Round),
            other => Err(ConfigError::UnknownRounding(other.to_owned())),
        }
    }
}

impl fmt::Display for Rounding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Snaps `value` to a multiple of `step`.
///
/// A non-positive step leaves the value untouched. Values within a few ulps
/// of a multiple snap to it before rounding, so feeding the result back in
/// returns it unchanged. The tolerance covers only division error, so the
/// rounding mode holds at any magnitude.
#[must_use]
pub fn quantize(value: f32, step: f32, rounding: Rounding) -> f32 {
    if step <= 0.0 || !step.is_finite() {
        return value;
    }
    let ratio = value / step;
    let nearest = ratio.round();
    let tolerance = SNAP_ULPS * f32::EPSILON * ratio.abs().max(1.0);
    let steps = if (ratio - nearest).abs() <= tolerance {
        nearest
    } else {
        rounding.apply(ratio)
    };
    steps * step
}
