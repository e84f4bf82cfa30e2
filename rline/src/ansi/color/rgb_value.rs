// Copyright (c) 2025 rline contributors. Licensed under Apache License, Version 2.0.

use std::fmt::{self, Debug};

/// A 24-bit RGB color. See [RGB color model] for more info.
///
/// [RGB color model]: https://en.wikipedia.org/wiki/RGB_color_model
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RgbValue {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl RgbValue {
    #[must_use]
    pub fn from_u8(red: u8, green: u8, blue: u8) -> Self { Self { red, green, blue } }

    /// Parses `#RGB` or `#RRGGBB` hex colors.
    ///
    /// # Panics
    /// Panics if `hex` is not a valid hex color. Use [`Self::try_from_hex_color`] for a
    /// fallible version.
    #[must_use]
    pub fn from_hex(hex: &str) -> Self {
        Self::try_from_hex_color(hex).unwrap_or_else(|| panic!("invalid hex color: {hex}"))
    }

    #[must_use]
    pub fn try_from_hex_color(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#')?;
        let (r, g, b) = match hex.len() {
            3 => {
                let mut chars = hex.chars();
                let r = chars.next()?;
                let g = chars.next()?;
                let b = chars.next()?;
                (
                    u8::from_str_radix(&format!("{r}{r}"), 16).ok()?,
                    u8::from_str_radix(&format!("{g}{g}"), 16).ok()?,
                    u8::from_str_radix(&format!("{b}{b}"), 16).ok()?,
                )
            }
            6 => (
                u8::from_str_radix(&hex[0..2], 16).ok()?,
                u8::from_str_radix(&hex[2..4], 16).ok()?,
                u8::from_str_radix(&hex[4..6], 16).ok()?,
            ),
            _ => return None,
        };
        Some(Self::from_u8(r, g, b))
    }
}

impl Debug for RgbValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }
}

impl From<u32> for RgbValue {
    fn from(value: u32) -> Self {
        Self {
            red: ((value >> 16) & 0xFF) as u8,
            green: ((value >> 8) & 0xFF) as u8,
            blue: (value & 0xFF) as u8,
        }
    }
}

impl From<RgbValue> for u32 {
    fn from(rgb: RgbValue) -> Self {
        (u32::from(rgb.red) << 16) | (u32::from(rgb.green) << 8) | u32::from(rgb.blue)
    }
}

impl From<(u8, u8, u8)> for RgbValue {
    fn from((red, green, blue): (u8, u8, u8)) -> Self { Self { red, green, blue } }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_parsing_short_and_long_forms() {
        assert_eq!(RgbValue::from_hex("#fff"), RgbValue::from_u8(255, 255, 255));
        assert_eq!(RgbValue::from_hex("#ff8000"), RgbValue::from_u8(255, 128, 0));
    }

    #[test]
    fn test_invalid_hex_returns_none() {
        assert_eq!(RgbValue::try_from_hex_color("gggggg"), None);
        assert_eq!(RgbValue::try_from_hex_color("#zzzzzz"), None);
        assert_eq!(RgbValue::try_from_hex_color("#ff000"), None);
    }

    #[test]
    fn test_u32_round_trip() {
        let rgb = RgbValue::from_u8(10, 20, 30);
        let encoded: u32 = rgb.into();
        assert_eq!(RgbValue::from(encoded), rgb);
    }
}
