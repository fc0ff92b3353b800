//! Waveform kinds and the pure waveform functions.

use std::f32::consts::TAU;
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// The function an animator evaluates each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Waveform {
    /// `t * s * A`
    #[default]
    Linear,
    /// `sin(t * s * 360deg) * A`
    Sine,
    /// `A` for the first half of each period, `-A` for the second.
    Square,
    /// Rising ramp from `-A` to `A` centered on each period boundary.
    Saw,
    /// Piecewise-linear ramp, period 1, peaks at `+-A`.
    Triangle,
    /// Uniform random value in `[-|s*A|, |s*A|]`.
    Noise,
    /// Pursues `+|A|` while the cursor is over the owner, `-|A|` otherwise.
    Hover,
    /// User supplied function.
    Custom,
}

/// How a waveform interprets the sign of `speed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedPolicy {
    /// Negative speed reverses direction.
    Signed,
    /// Only the magnitude is used.
    NonNegative,
}

impl Waveform {
    /// Returns the waveform's property-style name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Sine => "sine",
            Self::Square => "square",
            Self::Saw => "saw",
            Self::Triangle => "triangle",
            Self::Noise => "noise",
            Self::Hover => "hover",
            Self::Custom => "custom",
        }
    }

    /// Speed sign handling for this waveform.
    #[must_use]
    pub const fn speed_policy(self) -> SpeedPolicy {
        match self {
            Self::Hover | Self::Noise => SpeedPolicy::NonNegative,
            _ => SpeedPolicy::Signed,
        }
    }

    /// Hover runs until disabled, every other waveform honours `periods`.
    #[must_use]
    pub const fn expires(self) -> bool {
        !matches!(self, Self::Hover)
    }

    /// Evaluates the stateless waveforms. Returns `None` for the stateful
    /// kinds (noise, hover, custom), which the animator evaluates itself.
    #[must_use]
    pub fn evaluate(self, time: f32, speed: f32, amplitude: f32) -> Option<f32> {
        let phase = time * speed;
        Some(match self {
            Self::Linear => phase * amplitude,
            Self::Sine => (phase * TAU).sin() * amplitude,
            Self::Square => {
                if frac(phase) < 0.5 {
                    amplitude
                } else {
                    -amplitude
                }
            }
            Self::Saw => (frac(phase + 0.5) - 0.5) * 2.0 * amplitude,
            Self::Triangle => triangle(phase) * amplitude,
            Self::Noise | Self::Hover | Self::Custom => return None,
        })
    }
}

/// Fractional part in `[0, 1)`, also for negative input.
#[must_use]
pub fn frac(value: f32) -> f32 {
    value.rem_euclid(1.0)
}

/// Unit triangle: 0 at the period start, +1 at a quarter, -1 at three quarters.
fn triangle(phase: f32) -> f32 {
    let f = frac(phase);
    if f < 0.25 {
        f * 4.0
    } else if f < 0.75 {
        2.0 - f * 4.0
    } else {
        f * 4.0 - 4.0
    }
}

impl FromStr for Waveform {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "linear" => Self::Linear,
            "sine" => Self::Sine,
            "square" => Self::Square,
            "saw" => Self::Saw,
            "triangle" => Self::Triangle,
            "noise" | "random" => Self::Noise,
            "hover" => Self::Hover,
            "custom" => Self::Custom,
            other => return Err(ConfigError::UnknownWaveform(other.to_owned())),
        })
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
