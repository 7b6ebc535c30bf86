//! Linear RGB colors parsed from hex strings, used for plasma tinting.

use serde::{Deserialize, Serialize};

/// An RGB color with components in `[0, 1]`.
///
/// Serialized as a six-digit hex string (`"ffd06b"`), which is how block
/// data files spell colors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

/// Error returned when a hex color string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid hex color '{0}': expected six hex digits")]
pub struct ParseColorError(pub String);

impl Rgb {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Parse `"rrggbb"`, with or without a leading `#`.
    pub fn from_hex(hex: &str) -> Result<Self, ParseColorError> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(ParseColorError(hex.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map(|v| f32::from(v) / 255.0)
                .map_err(|_| ParseColorError(hex.to_string()))
        };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_hex(self) -> String {
        let byte = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!(
            "{:02x}{:02x}{:02x}",
            byte(self.r),
            byte(self.g),
            byte(self.b)
        )
    }

    /// Linear interpolation toward `other`; `t` is clamped to `[0, 1]`.
    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        Rgb::new(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
        )
    }
}

impl TryFrom<String> for Rgb {
    type Error = ParseColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Rgb::from_hex(&value)
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_hex()
    }
}
