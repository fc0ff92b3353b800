//! 8-bit RGBA color.
//!
//! Channels are bytes because animators drive them as integer steps and write
//! back only when the byte actually changes.

use bytemuck::{Pod, Zeroable};

/// RGBA color, one byte per channel.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct Color {
    /// Red component (0-255).
    pub r: u8,
    /// Green component (0-255).
    pub g: u8,
    /// Blue component (0-255).
    pub b: u8,
    /// Alpha component (0-255).
    pub a: u8,
}

impl Color {
    /// Transparent black.
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);
    /// Solid black.
    pub const BLACK: Self = Self::rgba(0, 0, 0, 255);
    /// Solid white.
    pub const WHITE: Self = Self::rgba(255, 255, 255, 255);

    /// Creates a color from RGBA bytes.
    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Creates an opaque color from RGB bytes.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    /// Creates a color from a packed value (0xRRGGBBAA).
    #[must_use]
    pub const fn hex(hex: u32) -> Self {
        let [r, g, b, a] = hex.to_be_bytes();
        Self::rgba(r, g, b, a)
    }

    /// Packs the color into 0xRRGGBBAA.
    #[must_use]
    pub const fn to_hex(self) -> u32 {
        u32::from_be_bytes([self.r, self.g, self.b, self.a])
    }

    /// Parses `RRGGBB` or `RRGGBBAA`, with an optional `#` or `0x` prefix.
    ///
    /// Six-digit input is opaque.
    #[must_use]
    pub fn parse_hex(text: &str) -> Option<Self> {
        let digits = text
            .strip_prefix('#')
            .or_else(|| text.strip_prefix("0x"))
            .unwrap_or(text);
        let value = u32::from_str_radix(digits, 16).ok()?;
        match digits.len() {
            6 => Some(Self::hex((value << 8) | 0xFF)),
            8 => Some(Self::hex(value)),
            _ => None,
        }
    }

    /// Returns a new color with different alpha.
    #[must_use]
    pub const fn with_alpha(self, a: u8) -> Self {
        Self::rgba(self.r, self.g, self.b, a)
    }

    /// Converts to normalized floats (0-1).
    #[must_use]
    pub fn to_array_f32(self) -> [f32; 4] {
        [
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
            f32::from(self.a) / 255.0,
        ]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_hex() {
        let color = Color::hex(0xFF00_80FF);
        assert_eq!(color, Color::rgba(255, 0, 128, 255));
        assert_eq!(color.to_hex(), 0xFF00_80FF);
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(Color::parse_hex("#102030"), Some(Color::rgb(16, 32, 48)));
        assert_eq!(Color::parse_hex("0x10203040"), Some(Color::rgba(16, 32, 48, 64)));
        assert_eq!(Color::parse_hex("12345"), None);
        assert_eq!(Color::parse_hex("zzzzzz"), None);
    }

    #[test]
    fn test_to_array_f32() {
        let [r, g, b, a] = Color::rgba(255, 0, 0, 255).to_array_f32();
        assert!((r - 1.0).abs() < 0.01);
        assert!(g.abs() < 0.01);
        assert!(b.abs() < 0.01);
        assert!((a - 1.0).abs() < 0.01);
    }
}
