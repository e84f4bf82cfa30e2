// Copyright (c) 2025 rline contributors. Licensed under Apache License, Version 2.0.

//! The tail-tip suggestion engine (§4.3 "Tail tip formation"). Drives both the status-bar
//! description and the ghost-text completion suffix shown while a command line is typed.

use crate::ansi::StyledText;

use super::command_description::{find_option, option_takes_value, CommandDescription};

/// Which mechanism currently owns the ghost-text suffix after the cursor.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SuggestionSource {
    /// The regular tab-completer is live; no canned tail tip is being shown.
    Completer,
    /// This engine is driving the ghost text directly.
    TailTip,
}

/// The rendered state produced by [`update`] for one keystroke.
#[derive(Clone, Debug, Default)]
pub struct TailTipState {
    pub tail_tip: String,
    pub completer_enabled: bool,
    pub status: Vec<StyledText>,
    pub error_pattern: Option<String>,
    pub error_index: Option<usize>,
}

impl TailTipState {
    #[must_use]
    pub fn suggestion_source(&self) -> SuggestionSource {
        if self.tail_tip.is_empty() { SuggestionSource::Completer } else { SuggestionSource::TailTip }
    }
}

/// Counts completed positional arguments in `args[1..]`: every token that isn't itself an
/// option and doesn't immediately follow a short option whose pattern takes a value.
fn count_positional_args(args: &[String], options: &std::collections::BTreeMap<String, Vec<StyledText>>) -> usize {
    let mut count = 0;
    let mut skip_next = false;
    for token in args.iter().skip(1) {
        if skip_next {
            skip_next = false;
            continue;
        }
        if token.starts_with('-') {
            if let Some((key, _)) = find_option(options, token) {
                if option_takes_value(key) && !token.contains('=') {
                    skip_next = true;
                }
            }
            continue;
        }
        count += 1;
    }
    count
}

/// Computes the tail-tip/status state for a COMMAND-context line, given its already
/// resolved [`CommandDescription`].
///
/// `args` is the tokenized line (token 0 is the command name, per [`super::context::tokenize`]);
/// `line`/`cursor` locate the edit point; `backward_delete` marks a keystroke that erased a
/// character rather than inserted one.
#[must_use]
pub fn do_command_tail_tip(
    desc: &CommandDescription,
    args: &[String],
    line: &str,
    cursor: usize,
    backward_delete: bool,
) -> TailTipState {
    let mut state = TailTipState { completer_enabled: true, ..Default::default() };
    state.error_pattern = desc.error_pattern.clone();
    state.error_index = desc.error_index;

    let mut argnum = count_positional_args(args, &desc.options);
    if backward_delete {
        state.completer_enabled = false;
        // §9 Open Question (ii): erasing the character between two value-taking short
        // options is ambiguous about which option absorbed the deleted value. Treated as
        // a no-op (argnum still decremented by one) until a regression demands otherwise.
        argnum = argnum.saturating_sub(1);
    }

    let cursor_after_space = line[..cursor].ends_with(' ');
    let last_token = args.last().map(String::as_str).unwrap_or("");

    if !cursor_after_space {
        state.status = if last_token.starts_with('-') {
            super::layout::render_option_filtered(&desc.options, last_token, desc.main.len().max(1))
        } else {
            desc.main.clone()
        };
        return state;
    }

    if last_token.starts_with('-') {
        if last_token.len() >= 3 && !last_token.starts_with("--") {
            let first_opt = format!("-{}", last_token.chars().nth(1).unwrap());
            if let Some((key, description)) = find_option(&desc.options, &first_opt) {
                if option_takes_value(key) {
                    state.status = description.clone();
                    state.completer_enabled = true;
                    return state;
                }
            }
            let last_opt = format!("-{}", last_token.chars().last().unwrap());
            if let Some((_, description)) = find_option(&desc.options, &last_opt) {
                state.status = description.clone();
            }
            state.tail_tip.clear();
        } else if let Some((key, description)) = find_option(&desc.options, last_token) {
            state.status = description.clone();
            if key.contains('=') {
                state.completer_enabled = true;
            }
        }
        return state;
    }

    if desc.positionals.is_empty() {
        state.status = desc.main.clone();
        return state;
    }

    let idx = argnum.saturating_sub(1);
    state.status = desc
        .positionals
        .get(idx)
        .map(|p| p.description.clone())
        .or_else(|| {
            args.iter()
                .rev()
                .nth(1)
                .filter(|tok| tok.starts_with('-'))
                .and_then(|tok| find_option(&desc.options, tok))
                .map(|(_, d)| d.clone())
        })
        .unwrap_or_else(|| desc.main.clone());

    let remaining: String = desc
        .positionals
        .iter()
        .skip(idx)
        .map(|p| format!("{} ", p.name))
        .collect();
    state.tail_tip = remaining;

    if let Some(last_positional) = desc.positionals.last() {
        if last_positional.is_optional() {
            state.tail_tip = format!("{} ", last_positional.name);
            state.status = last_positional.description.clone();
        }
    }

    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ansi::StyledTextBuilder;
    use crate::describe::command_description::PositionalArg;

    fn lines(text: &str) -> Vec<StyledText> {
        let mut b = StyledTextBuilder::new();
        b.append_plain(text);
        vec![b.build()]
    }

    fn cp_desc() -> CommandDescription {
        CommandDescription::new(lines("copy a file"))
            .with_positionals(vec![
                PositionalArg::new("src", lines("source file")),
                PositionalArg::new("dst", lines("destination file")),
            ])
            .with_option("-r, --recursive", lines("recurse into directories"))
    }

    fn abc_desc() -> CommandDescription {
        CommandDescription::new(lines("cmd")).with_positionals(vec![
            PositionalArg::new("A", lines("first")),
            PositionalArg::new("B", lines("second")),
            PositionalArg::new("C", lines("third")),
        ])
    }

    #[test]
    fn test_one_arg_consumed_tail_tip_shows_remaining_two() {
        let line = "cmd valA ";
        let args = crate::describe::context::tokenize(line);
        let state = do_command_tail_tip(&abc_desc(), &args, line, line.len(), false);
        assert_eq!(state.tail_tip, "B C ");
    }

    #[test]
    fn test_two_args_consumed_tail_tip_shows_remaining_one() {
        let line = "cmd valA valB ";
        let args = crate::describe::context::tokenize(line);
        let state = do_command_tail_tip(&abc_desc(), &args, line, line.len(), false);
        assert_eq!(state.tail_tip, "C ");
    }

    #[test]
    fn test_no_args_consumed_tail_tip_shows_all_three() {
        let line = "cmd ";
        let args = crate::describe::context::tokenize(line);
        let state = do_command_tail_tip(&abc_desc(), &args, line, line.len(), false);
        assert_eq!(state.tail_tip, "A B C ");
    }

    #[test]
    fn test_cp_one_positional_consumed_shows_dst() {
        let line = "cp foo ";
        let args = crate::describe::context::tokenize(line);
        let state = do_command_tail_tip(&cp_desc(), &args, line, line.len(), false);
        assert_eq!(state.tail_tip, "dst ");
    }

    #[test]
    fn test_cp_dash_with_no_trailing_space_filters_options() {
        let line = "cp -";
        let args = crate::describe::context::tokenize(line);
        let state = do_command_tail_tip(&cp_desc(), &args, line, line.len(), false);
        assert!(!state.status.is_empty());
        assert!(state.tail_tip.is_empty());
    }
}
