// Copyright (c) 2025 rline contributors. Licensed under Apache License, Version 2.0.

//! Component A: the attributed character sequence, its style algebra, and the ANSI SGR
//! renderer/parser pair, per §4.1.

pub mod color;
pub mod renderer;
pub mod style;
pub mod styled_text;

pub use color::{AnsiValue, Color, ColorCapability, ForceColorMode, RgbValue};
pub use renderer::{from_ansi, strip_ansi, to_ansi};
pub use style::{Attr, StyleCode};
pub use styled_text::builder::{BuilderError, StyledTextBuilder};
pub use styled_text::{display_width, StyledChar, StyledText};
