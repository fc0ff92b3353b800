//! Runtime configuration, loaded from TOML.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Defaults applied to newly created animators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimatorDefaults {
    /// Periods before expiry (negative runs forever).
    pub periods: f32,
    /// Waveform amplitude.
    pub amplitude: f32,
    /// Waveform speed.
    pub speed: f32,
}

impl Default for AnimatorDefaults {
    fn default() -> Self {
        Self {
            periods: 1.0,
            amplitude: 0.5,
            speed: 1.0,
        }
    }
}

/// UI runtime configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Acceleration magnitudes at or below this are ignored.
    pub acceleration_epsilon: f32,
    /// Reject unknown property names in `Scene::configure`.
    pub strict_properties: bool,
    /// Animator defaults.
    pub animator: AnimatorDefaults,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            acceleration_epsilon: 0.01,
            strict_properties: true,
            animator: AnimatorDefaults::default(),
        }
    }
}

impl UiConfig {
    /// Parses a TOML document. Missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or negative epsilon.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        if config.acceleration_epsilon.is_nan() || config.acceleration_epsilon < 0.0 {
            return Err(ConfigError::Parse(format!(
                "acceleration_epsilon must be non-negative, got {}",
                config.acceleration_epsilon
            )));
        }
        Ok(config)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Parse(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }
}
