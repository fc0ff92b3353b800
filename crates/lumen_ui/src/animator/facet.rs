//! Facets: the numeric node properties an animator can drive.

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::node::Node;

/// One numeric property of a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Facet {
    /// Local X position.
    X,
    /// Local Y position.
    Y,
    /// Local width.
    Width,
    /// Local height.
    Height,
    /// Horizontal scale factor.
    ScaleX,
    /// Vertical scale factor.
    ScaleY,
    /// Rotation in degrees.
    Angle,
    /// Alpha channel (0-255).
    Alpha,
    /// Red channel (0-255).
    Red,
    /// Green channel (0-255).
    Green,
    /// Blue channel (0-255).
    Blue,
    /// A facet served by one of the node's behaviors (e.g. `frame`).
    Custom(String),
}

/// How an animator writes its computed value back to the owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WritePolicy {
    /// Write every frame.
    #[default]
    Simple,
    /// Clamp to [0, 255] and write only when the rounded byte changes.
    ByteClamped,
}

impl Facet {
    /// Returns the facet's property-style name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Width => "w",
            Self::Height => "h",
            Self::ScaleX => "scale_x",
            Self::ScaleY => "scale_y",
            Self::Angle => "angle",
            Self::Alpha => "alpha",
            Self::Red => "red",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Custom(name) => name,
        }
    }

    /// Returns true for the 8-bit color channels.
    #[must_use]
    pub const fn is_byte_channel(&self) -> bool {
        matches!(self, Self::Alpha | Self::Red | Self::Green | Self::Blue)
    }

    /// Default write policy: byte channels skip redundant writes.
    #[must_use]
    pub const fn default_policy(&self) -> WritePolicy {
        if self.is_byte_channel() {
            WritePolicy::ByteClamped
        } else {
            WritePolicy::Simple
        }
    }

    /// Reads the facet from a node, `None` if the node does not expose it.
    #[must_use]
    pub fn read(&self, node: &Node) -> Option<f32> {
        Some(match self {
            Self::X => node.rect.x,
            Self::Y => node.rect.y,
            Self::Width => node.rect.width,
            Self::Height => node.rect.height,
            Self::ScaleX => node.scale.x,
            Self::ScaleY => node.scale.y,
            Self::Angle => node.angle,
            Self::Alpha => f32::from(node.color.a),
            Self::Red => f32::from(node.color.r),
            Self::Green => f32::from(node.color.g),
            Self::Blue => f32::from(node.color.b),
            Self::Custom(name) => return node.behaviors().iter().find_map(|b| b.facet(name)),
        })
    }

    /// Writes the facet. Returns false if the node does not expose it.
    pub fn write(&self, node: &mut Node, value: f32) -> bool {
        match self {
            Self::X => node.rect.x = value,
            Self::Y => node.rect.y = value,
            Self::Width => node.rect.width = value,
            Self::Height => node.rect.height = value,
            Self::ScaleX => node.scale.x = value,
            Self::ScaleY => node.scale.y = value,
            Self::Angle => node.angle = value,
            Self::Alpha => node.color.a = to_byte(value),
            Self::Red => node.color.r = to_byte(value),
            Self::Green => node.color.g = to_byte(value),
            Self::Blue => node.color.b = to_byte(value),
            Self::Custom(name) => {
                return node
                    .behaviors_mut()
                    .iter_mut()
                    .any(|b| b.set_facet(name, value));
            }
        }
        true
    }
}

/// Clamps and rounds a float into a byte channel.
#[must_use]
pub fn to_byte(value: f32) -> u8 {
    value.clamp(0.0, 255.0).round() as u8
}

impl FromStr for Facet {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "x" => Self::X,
            "y" => Self::Y,
            "w" | "width" => Self::Width,
            "h" | "height" => Self::Height,
            "scale_x" => Self::ScaleX,
            "scale_y" => Self::ScaleY,
            "angle" => Self::Angle,
            "alpha" => Self::Alpha,
            "red" => Self::Red,
            "green" => Self::Green,
            "blue" => Self::Blue,
            "" => return Err(ConfigError::UnknownFacet(s.to_owned())),
            other => match other.strip_prefix("custom:").map(str::trim) {
                Some(name) if !name.is_empty() => Self::Custom(name.to_owned()),
                _ => return Err(ConfigError::UnknownFacet(other.to_owned())),
            },
        })
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom(name) => write!(f, "custom:{name}"),
            other => f.write_str(other.name()),
        }
    }
}

impl WritePolicy {
    /// Returns the policy's property-style name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::ByteClamped => "byte",
        }
    }
}

impl FromStr for WritePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "simple" => Ok(Self::Simple),
            "byte" | "byte_clamped" => Ok(Self::ByteClamped),
            other => Err(ConfigError::UnknownWritePolicy(other.to_owned())),
        }
    }
}
