// Copyright (c) 2025 rline contributors. Licensed under Apache License, Version 2.0.

//! The command description record (§3 "Command description").

use std::collections::BTreeMap;

use crate::ansi::StyledText;

/// One positional argument slot: a name (optionally `[bracketed]` to mark it optional)
/// and its description lines.
#[derive(Clone, Debug)]
pub struct PositionalArg {
    pub name: String,
    pub description: Vec<StyledText>,
}

impl PositionalArg {
    #[must_use]
    pub fn new(name: impl Into<String>, description: Vec<StyledText>) -> Self {
        Self {
            name: name.into(),
            description,
        }
    }

    /// An optional positional's name is bracketed, e.g. `[outfile]`.
    #[must_use]
    pub fn is_optional(&self) -> bool { self.name.starts_with('[') }
}

/// A resolved description for one command: its main blurb, its positional argument
/// slots in order, and a pattern-keyed map of option descriptions.
#[derive(Clone, Debug, Default)]
pub struct CommandDescription {
    pub main: Vec<StyledText>,
    pub positionals: Vec<PositionalArg>,
    /// Sorted so pattern lookups and rendering are deterministic; a key may list several
    /// comma/space-separated aliases and carry a `=PLACEHOLDER` suffix marking the option
    /// as value-taking.
    pub options: BTreeMap<String, Vec<StyledText>>,
    pub valid: bool,
    pub is_command: bool,
    pub is_subcommand: bool,
    pub highlighted: bool,
    pub error_pattern: Option<String>,
    pub error_index: Option<usize>,
}

impl CommandDescription {
    #[must_use]
    pub fn new(main: Vec<StyledText>) -> Self {
        Self {
            main,
            valid: true,
            is_command: true,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_positionals(mut self, positionals: Vec<PositionalArg>) -> Self {
        self.positionals = positionals;
        self
    }

    #[must_use]
    pub fn with_option(mut self, pattern: impl Into<String>, description: Vec<StyledText>) -> Self {
        self.options.insert(pattern.into(), description);
        self
    }
}

/// Whether an option pattern's key declares a value placeholder (`-o, --output=FILE`).
#[must_use]
pub fn option_takes_value(key: &str) -> bool { key.contains('=') }

/// Finds the option entry whose key has a whitespace-separated alias token starting with
/// `opt` (§4.3 "Option description pattern matching").
#[must_use]
pub fn find_option<'a>(
    options: &'a BTreeMap<String, Vec<StyledText>>,
    opt: &str,
) -> Option<(&'a str, &'a Vec<StyledText>)> {
    options
        .iter()
        .find(|(key, _)| {
            key.split_whitespace()
                .any(|token| token.trim_end_matches(',').starts_with(opt))
        })
        .map(|(key, lines)| (key.as_str(), lines))
}
