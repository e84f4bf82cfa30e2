// Copyright (c) 2025 rline contributors. Licensed under Apache License, Version 2.0.

use super::{RgbValue, convert::ANSI_COLOR_PALETTE};

/// A 256-color palette index (0..=255). Indices 0-7 are the base colors, 8-15 the bright
/// colors, 16-231 the 6x6x6 color cube, and 232-255 the grayscale ramp.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct AnsiValue {
    pub index: u8,
}

impl AnsiValue {
    #[must_use]
    pub fn new(index: u8) -> Self { Self { index } }

    #[must_use]
    pub fn as_rgb(self) -> RgbValue {
        RgbValue::from(ANSI_COLOR_PALETTE[usize::from(self.index)])
    }
}

impl From<u8> for AnsiValue {
    fn from(index: u8) -> Self { Self { index } }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0, 0, 0, 0)]
    #[test_case(255, 238, 238, 238)]
    fn test_as_rgb(index: u8, r: u8, g: u8, b: u8) {
        assert_eq!(AnsiValue::new(index).as_rgb(), RgbValue::from_u8(r, g, b));
    }
}
