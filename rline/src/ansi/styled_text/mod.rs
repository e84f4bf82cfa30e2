// Copyright (c) 2025 rline contributors. Licensed under Apache License, Version 2.0.

//! The immutable styled character sequence [`StyledText`] and its mutable
//! [`builder::StyledTextBuilder`].

pub mod builder;

use crate::ansi::style::StyleCode;
use std::sync::Arc;
use unicode_width::UnicodeWidthChar;

/// One code point paired with the style it carries.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct StyledChar {
    pub ch: char,
    pub style: StyleCode,
}

/// An immutable, zero-copy-sliceable sequence of styled characters.
///
/// Subsequences (via [`Self::substring`]) share the same backing buffer; only the
/// offset/length window differs. The builder that produced a [`StyledText`] can keep
/// being mutated afterwards without affecting sequences already published, because
/// publishing always takes a fresh [`Arc`] snapshot of the builder's buffer.
#[derive(Clone, Debug)]
pub struct StyledText {
    buf: Arc<[StyledChar]>,
    start: usize,
    end: usize,
}

impl StyledText {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            buf: Arc::from(Vec::new().into_boxed_slice()),
            start: 0,
            end: 0,
        }
    }

    pub(crate) fn from_arc(buf: Arc<[StyledChar]>) -> Self {
        let end = buf.len();
        Self { buf, start: 0, end }
    }

    #[must_use]
    pub fn len(&self) -> usize { self.end - self.start }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.start == self.end }

    fn chars_slice(&self) -> &[StyledChar] { &self.buf[self.start..self.end] }

    #[must_use]
    pub fn char_at(&self, index: usize) -> Option<char> {
        self.chars_slice().get(index).map(|sc| sc.ch)
    }

    #[must_use]
    pub fn style_at(&self, index: usize) -> Option<StyleCode> {
        self.chars_slice().get(index).map(|sc| sc.style)
    }

    pub fn iter(&self) -> impl Iterator<Item = StyledChar> + '_ {
        self.chars_slice().iter().copied()
    }

    /// Zero-copy subsequence `[start, end)`. Shares the underlying buffer.
    ///
    /// # Panics
    /// Panics if `start > end` or `end > self.len()`.
    #[must_use]
    pub fn substring(&self, start: usize, end: usize) -> Self {
        assert!(start <= end && end <= self.len(), "invalid subsequence bounds");
        Self {
            buf: Arc::clone(&self.buf),
            start: self.start + start,
            end: self.start + end,
        }
    }

    /// Sum of per-character display widths (double for East-Asian wide, zero for
    /// combining marks and hidden characters).
    #[must_use]
    pub fn column_length(&self) -> usize {
        self.chars_slice().iter().map(|sc| display_width(*sc)).sum()
    }

    /// The column-addressed subsequence `[start_col, stop_col)`, clipped at the first
    /// newline. Never splits a wide character in half: a character whose width would
    /// straddle `start_col`/`stop_col` is simply excluded.
    #[must_use]
    pub fn column_subsequence(&self, start_col: usize, stop_col: usize) -> Self {
        let mut col = 0usize;
        let mut out = Vec::new();
        for sc in self.chars_slice() {
            if sc.ch == '\n' {
                break;
            }
            let w = display_width(*sc);
            if col >= start_col && col + w <= stop_col {
                out.push(*sc);
            }
            col += w;
            if col >= stop_col {
                break;
            }
        }
        Self::from_arc(Arc::from(out.into_boxed_slice()))
    }

    /// Splits into successive `cols`-wide segments (word-wrap is not performed; this is a
    /// hard column wrap). `include_newlines` keeps `\n` characters in the output
    /// segments; `delay_wrap` defers emitting a trailing wrap boundary that lands exactly
    /// on a newline, so the newline itself ends the segment rather than an empty segment
    /// following it.
    #[must_use]
    pub fn column_split(&self, cols: usize, include_newlines: bool, delay_wrap: bool) -> Vec<Self> {
        assert!(cols > 0, "columns must be positive");
        let mut segments = Vec::new();
        let mut current = Vec::new();
        let mut col = 0usize;

        for sc in self.chars_slice() {
            if sc.ch == '\n' {
                if include_newlines {
                    current.push(*sc);
                }
                segments.push(Self::from_arc(Arc::from(current.into_boxed_slice())));
                current = Vec::new();
                col = 0;
                continue;
            }
            let w = display_width(*sc);
            if col + w > cols && !current.is_empty() {
                segments.push(Self::from_arc(Arc::from(std::mem::take(&mut current).into_boxed_slice())));
                col = 0;
            }
            current.push(*sc);
            col += w;
            if col >= cols && !delay_wrap {
                segments.push(Self::from_arc(Arc::from(std::mem::take(&mut current).into_boxed_slice())));
                col = 0;
            }
        }
        if !current.is_empty() || segments.is_empty() {
            segments.push(Self::from_arc(Arc::from(current.into_boxed_slice())));
        }
        segments
    }

    /// Returns a new sequence where every character whose run matches `regex` is painted
    /// with `style` (combined on top of its existing style).
    #[must_use]
    pub fn style_matches(&self, regex: &regex::Regex, style: StyleCode) -> Self {
        let plain: String = self.iter().map(|sc| sc.ch).collect();
        let mut matched = vec![false; self.len()];
        for m in regex.find_iter(&plain) {
            let (start_char, end_char) = byte_range_to_char_range(&plain, m.start(), m.end());
            for slot in matched.iter_mut().take(end_char).skip(start_char) {
                *slot = true;
            }
        }

        let out: Vec<StyledChar> = self
            .chars_slice()
            .iter()
            .zip(matched)
            .map(|(sc, hit)| {
                if hit {
                    StyledChar {
                        ch: sc.ch,
                        style: sc.style.combine(style),
                    }
                } else {
                    *sc
                }
            })
            .collect();
        Self::from_arc(Arc::from(out.into_boxed_slice()))
    }
}

fn byte_range_to_char_range(s: &str, byte_start: usize, byte_end: usize) -> (usize, usize) {
    let mut start_char = 0;
    let mut end_char = 0;
    let mut char_index = 0;
    for (byte_index, _) in s.char_indices() {
        if byte_index == byte_start {
            start_char = char_index;
        }
        if byte_index == byte_end {
            end_char = char_index;
        }
        char_index += 1;
    }
    if byte_end == s.len() {
        end_char = char_index;
    }
    (start_char, end_char)
}

#[must_use]
pub fn display_width(sc: StyledChar) -> usize {
    if sc.style.is_hidden() {
        return 0;
    }
    UnicodeWidthChar::width(sc.ch).unwrap_or(0)
}
