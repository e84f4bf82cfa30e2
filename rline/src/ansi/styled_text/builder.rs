// Copyright (c) 2025 rline contributors. Licensed under Apache License, Version 2.0.

use super::{StyledChar, StyledText};
use crate::ansi::style::StyleCode;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuilderError {
    #[error("tab stops cannot be changed after content has been appended")]
    TabsLockedAfterContent,
}

/// Mutable, single-threaded builder for a [`StyledText`]. Appends inherit the builder's
/// current style; [`Self::build`] publishes an immutable snapshot that subsequent
/// mutation of the builder never affects.
#[derive(Debug, Default)]
pub struct StyledTextBuilder {
    buf: Vec<StyledChar>,
    current_style: StyleCode,
    tabs: Option<Vec<usize>>,
}

impl StyledTextBuilder {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Sets fixed tab stops. Fails once any character has been appended.
    pub fn set_tabs(&mut self, tabs: Vec<usize>) -> Result<(), BuilderError> {
        if !self.buf.is_empty() {
            return Err(BuilderError::TabsLockedAfterContent);
        }
        self.tabs = Some(tabs);
        Ok(())
    }

    #[must_use]
    pub fn tabs(&self) -> Option<&[usize]> { self.tabs.as_deref() }

    /// Appends plain text; every character inherits [`Self::current_style`].
    pub fn append_plain(&mut self, text: &str) -> &mut Self {
        for ch in text.chars() {
            self.buf.push(StyledChar {
                ch,
                style: self.current_style,
            });
        }
        self
    }

    /// Appends an already-styled sequence. Each character's style is combined with the
    /// builder's current style, so the current style only fills in fields the appended
    /// text left unset.
    pub fn append_styled_text(&mut self, other: &StyledText) -> &mut Self {
        for sc in other.iter() {
            self.buf.push(StyledChar {
                ch: sc.ch,
                style: self.current_style.combine(sc.style),
            });
        }
        self
    }

    /// Replaces the current style outright.
    pub fn style(&mut self, new_style: impl Into<StyleCode>) -> &mut Self {
        self.current_style = new_style.into();
        self
    }

    /// Functional update of the current style.
    pub fn update_style(&mut self, f: impl FnOnce(StyleCode) -> StyleCode) -> &mut Self {
        self.current_style = f(self.current_style);
        self
    }

    /// Pushes `style` as the current style for the duration of `body`, then restores the
    /// prior style on every exit path (including early return via `?` inside `body`).
    pub fn styled<E>(
        &mut self,
        style: StyleCode,
        body: impl FnOnce(&mut Self) -> Result<(), E>,
    ) -> Result<(), E> {
        let previous = self.current_style;
        self.current_style = style;
        let result = body(self);
        self.current_style = previous;
        result
    }

    /// Publishes the buffer accumulated so far as an immutable [`StyledText`]. The
    /// builder keeps its own buffer and may keep being appended to; the published
    /// sequence is backed by its own snapshot and never observes later mutation.
    #[must_use]
    pub fn build(&self) -> StyledText {
        StyledText::from_arc(Arc::from(self.buf.clone().into_boxed_slice()))
    }
}

impl From<StyleCode> for StyleCode {
    fn from(value: StyleCode) -> Self { value }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ansi::style::Attr;

    #[test]
    fn test_tabs_locked_after_first_append() {
        let mut builder = StyledTextBuilder::new();
        builder.append_plain("a");
        assert!(builder.set_tabs(vec![4, 8]).is_err());
    }

    #[test]
    fn test_styled_scope_restores_on_every_exit_path() {
        let mut builder = StyledTextBuilder::new();
        builder.update_style(|s| s.set(Attr::Bold));
        let _ = builder.styled(StyleCode::default().set(Attr::Italic), |b| -> Result<(), ()> {
            b.append_plain("x");
            Err(())
        });
        assert_eq!(builder.current_style.attr(Attr::Bold), Some(true));
        assert_eq!(builder.current_style.attr(Attr::Italic), None);
    }

    #[test]
    fn test_append_styled_preserves_styles_modulo_current_mask() {
        let mut inner = StyledTextBuilder::new();
        inner.update_style(|s| s.set(Attr::Italic));
        inner.append_plain("hi");
        let inner_text = inner.build();

        let mut outer = StyledTextBuilder::new();
        outer.update_style(|s| s.set(Attr::Bold));
        outer.append_styled_text(&inner_text);
        let combined = outer.build();
        assert_eq!(combined.style_at(0).unwrap().attr(Attr::Italic), Some(true));
        assert_eq!(combined.style_at(0).unwrap().attr(Attr::Bold), Some(true));
    }
}
