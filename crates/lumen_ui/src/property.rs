//! String property parsing shared by nodes, animators and behaviors.
//!
//! External loaders configure everything through `name = value` string pairs;
//! these helpers turn the value side into typed data or a [`ConfigError`].

use crate::error::ConfigError;

/// Parses a float property value.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] for non-numeric or non-finite input.
pub fn parse_f32(name: &str, value: &str) -> Result<f32, ConfigError> {
    value
        .trim()
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| invalid(name, value))
}

/// Parses an integer property value.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] for non-integer input.
pub fn parse_i32(name: &str, value: &str) -> Result<i32, ConfigError> {
    value.trim().parse::<i32>().map_err(|_| invalid(name, value))
}

/// Parses a boolean property value (`true`/`false`/`1`/`0`).
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] for anything else.
pub fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim() {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        _ => Err(invalid(name, value)),
    }
}

/// Parses a byte channel (0-255).
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] when out of range.
pub fn parse_u8(name: &str, value: &str) -> Result<u8, ConfigError> {
    value.trim().parse::<u8>().map_err(|_| invalid(name, value))
}

/// Formats a boolean the way the parsers read it back.
#[must_use]
pub fn format_bool(value: bool) -> String {
    if value { "1" } else { "0" }.to_owned()
}

/// Builds an [`ConfigError::InvalidValue`].
#[must_use]
pub fn invalid(name: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        name: name.to_owned(),
        value: value.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("visible", "1"), Ok(true));
        assert_eq!(parse_bool("visible", "false"), Ok(false));
        assert!(parse_bool("visible", "yes").is_err());
    }

    #[test]
    fn test_parse_f32_rejects_non_finite() {
        assert_eq!(parse_f32("speed", " 2.5 "), Ok(2.5));
        assert!(parse_f32("speed", "inf").is_err());
        assert!(parse_f32("speed", "NaN").is_err());
        assert!(parse_f32("speed", "fast").is_err());
    }

    #[test]
    fn test_parse_u8_range() {
        assert_eq!(parse_u8("alpha", "255"), Ok(255));
        assert!(parse_u8("alpha", "256").is_err());
    }
}
