// Copyright (c) 2025 rline contributors. Licensed under Apache License, Version 2.0.

//! Color model for a styled character: each of the foreground/background slots is in
//! one of three states — unset, indexed (0..=255), or 24-bit RGB — never more than one at
//! a time.

pub mod ansi_value;
pub mod convert;
pub mod rgb_value;

pub use ansi_value::AnsiValue;
pub use convert::round_rgb_to_ansi256;
pub use rgb_value::RgbValue;

/// One color slot (foreground or background) of a style.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum Color {
    #[default]
    Unset,
    Indexed(u8),
    Rgb(RgbValue),
}

impl Color {
    #[must_use]
    pub fn is_set(self) -> bool { !matches!(self, Color::Unset) }
}

impl From<RgbValue> for Color {
    fn from(value: RgbValue) -> Self { Color::Rgb(value) }
}

impl From<AnsiValue> for Color {
    fn from(value: AnsiValue) -> Self { Color::Indexed(value.index) }
}

/// How capability negotiation should coerce a color request, per §4.1 "Color
/// negotiation".
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum ForceColorMode {
    #[default]
    None,
    Force256,
    ForceTrueColor,
}

/// Terminal color capability, expressed as the number of distinct colors it can render.
/// `1 << 24` or greater means true color.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ColorCapability(pub u32);

impl ColorCapability {
    pub const BASIC_8: Self = Self(8);
    pub const INDEXED_256: Self = Self(256);
    pub const TRUE_COLOR: Self = Self(1 << 24);

    #[must_use]
    pub fn supports_true_color(self) -> bool { self.0 >= Self::TRUE_COLOR.0 }
}
