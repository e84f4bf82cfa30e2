// Copyright (c) 2025 rline contributors. Licensed under Apache License, Version 2.0.

//! The style algebra: each attribute is `set`, `off` (explicit disable), or `default`
//! (inherited). Two styles combine per-field as "whichever side explicitly set the field
//! wins, preferring the right-hand side" — the tri-state equivalent of
//! `(a & ~b.mask) | (b.style & b.mask)`.

use crate::ansi::color::Color;

/// One of the eight boolean text attributes a [`StyleCode`] tracks explicitly.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Attr {
    Bold,
    Faint,
    Italic,
    Underline,
    Blink,
    Inverse,
    Conceal,
    CrossedOut,
}

/// A packed style: every field is either inherited (`None` / [`Color::Unset`]) or
/// explicitly set (`Some(bool)` / a concrete [`Color`]). The hidden flag suppresses
/// display width but is never emitted as an ANSI attribute.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct StyleCode {
    pub bold: Option<bool>,
    pub faint: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    pub blink: Option<bool>,
    pub inverse: Option<bool>,
    pub conceal: Option<bool>,
    pub crossed_out: Option<bool>,
    pub hidden: Option<bool>,
    pub fg: Color,
    pub bg: Color,
}

impl StyleCode {
    #[must_use]
    pub fn is_hidden(self) -> bool { self.hidden == Some(true) }

    fn attr_mut(&mut self, attr: Attr) -> &mut Option<bool> {
        match attr {
            Attr::Bold => &mut self.bold,
            Attr::Faint => &mut self.faint,
            Attr::Italic => &mut self.italic,
            Attr::Underline => &mut self.underline,
            Attr::Blink => &mut self.blink,
            Attr::Inverse => &mut self.inverse,
            Attr::Conceal => &mut self.conceal,
            Attr::CrossedOut => &mut self.crossed_out,
        }
    }

    #[must_use]
    pub fn attr(self, attr: Attr) -> Option<bool> {
        match attr {
            Attr::Bold => self.bold,
            Attr::Faint => self.faint,
            Attr::Italic => self.italic,
            Attr::Underline => self.underline,
            Attr::Blink => self.blink,
            Attr::Inverse => self.inverse,
            Attr::Conceal => self.conceal,
            Attr::CrossedOut => self.crossed_out,
        }
    }

    /// Explicitly turns `attr` on. Mask bit set, style bit set.
    #[must_use]
    pub fn set(mut self, attr: Attr) -> Self {
        *self.attr_mut(attr) = Some(true);
        self
    }

    /// Explicitly turns `attr` off. Mask bit set, style bit clear.
    #[must_use]
    pub fn off(mut self, attr: Attr) -> Self {
        *self.attr_mut(attr) = Some(false);
        self
    }

    /// Clears any explicit setting for `attr`, reverting to inherited/default. Mask bit
    /// clear.
    #[must_use]
    pub fn default_attr(mut self, attr: Attr) -> Self {
        *self.attr_mut(attr) = None;
        self
    }

    #[must_use]
    pub fn with_fg(mut self, color: Color) -> Self {
        self.fg = color;
        self
    }

    #[must_use]
    pub fn with_bg(mut self, color: Color) -> Self {
        self.bg = color;
        self
    }

    #[must_use]
    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = Some(hidden);
        self
    }

    /// Combines `self` with `other`, letting `other` win on every field it explicitly
    /// sets and falling back to `self` everywhere `other` is unset/default.
    #[must_use]
    pub fn combine(self, other: Self) -> Self {
        Self {
            bold: other.bold.or(self.bold),
            faint: other.faint.or(self.faint),
            italic: other.italic.or(self.italic),
            underline: other.underline.or(self.underline),
            blink: other.blink.or(self.blink),
            inverse: other.inverse.or(self.inverse),
            conceal: other.conceal.or(self.conceal),
            crossed_out: other.crossed_out.or(self.crossed_out),
            hidden: other.hidden.or(self.hidden),
            fg: if other.fg.is_set() { other.fg } else { self.fg },
            bg: if other.bg.is_set() { other.bg } else { self.bg },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_off_default_round_trip() {
        let style = StyleCode::default().set(Attr::Bold);
        assert_eq!(style.attr(Attr::Bold), Some(true));

        let style = style.off(Attr::Bold);
        assert_eq!(style.attr(Attr::Bold), Some(false));

        let style = style.default_attr(Attr::Bold);
        assert_eq!(style.attr(Attr::Bold), None);
    }

    #[test]
    fn test_combine_prefers_right_hand_explicit_fields() {
        let base = StyleCode::default().set(Attr::Bold).set(Attr::Italic);
        let overlay = StyleCode::default().off(Attr::Bold);
        let combined = base.combine(overlay);
        assert_eq!(combined.attr(Attr::Bold), Some(false));
        assert_eq!(combined.attr(Attr::Italic), Some(true));
    }

    #[test]
    fn test_combine_leaves_unset_fields_inherited() {
        let base = StyleCode::default().with_fg(Color::Indexed(9));
        let overlay = StyleCode::default();
        assert_eq!(base.combine(overlay).fg, Color::Indexed(9));
    }

    #[test]
    fn test_only_one_color_mode_per_slot() {
        let style = StyleCode::default()
            .with_fg(Color::Indexed(1))
            .with_fg(Color::Rgb(crate::ansi::color::RgbValue::from_u8(1, 2, 3)));
        // Last write wins; only one representation is ever live at a time.
        assert_eq!(
            style.fg,
            Color::Rgb(crate::ansi::color::RgbValue::from_u8(1, 2, 3))
        );
    }

    #[test]
    fn test_styles_compare_by_code_and_mask() {
        let a = StyleCode::default().set(Attr::Bold);
        let b = StyleCode::default().off(Attr::Bold);
        assert_ne!(a, b);
        assert_eq!(a, StyleCode::default().set(Attr::Bold));
    }
}
