// Copyright (c) 2025 rline contributors. Licensed under Apache License, Version 2.0.

//! Buffer context classification (§4.3 "Context classification").

/// The three shapes a cursor position inside a command line can take.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ContextKind {
    /// Positioned where a top-level command name (or its args) is expected.
    Command,
    /// Inside an unclosed method-call-style parenthesis.
    Method,
    /// Immediately after a closing paren — JLine's own grammar for "syntax" context.
    Syntax,
}

/// Classifies `line`/`cursor` into a context and the command string that context names.
///
/// `args` is the pre-tokenized argument list for `line` (token 0 is the command name);
/// `command_of` resolves a typed token (possibly an alias) to its canonical command name.
#[must_use]
pub fn evaluate_command_line(
    line: &str,
    args: &[String],
    cursor: usize,
    command_of: impl Fn(&str) -> String,
) -> (String, ContextKind) {
    let head = &line[..cursor];

    if head.chars().next_back() == Some(')') {
        return (head.to_string(), ContextKind::Syntax);
    }

    // An unclosed open paren takes priority over the command heuristic below — being
    // inside `foo(` must classify as METHOD even once the command-name token is long
    // since typed.
    let mut balance: i32 = 0;
    for (idx, ch) in head.char_indices().rev() {
        match ch {
            ')' => balance += 1,
            '(' => {
                balance -= 1;
                if balance < 0 {
                    return (head[..idx].to_string(), ContextKind::Method);
                }
            }
            _ => {}
        }
    }

    if cursor == line.len() && !args.is_empty() && (head.ends_with(' ') || args.len() > 1) {
        return (command_of(&args[0]), ContextKind::Command);
    }

    (head.to_string(), ContextKind::Method)
}

/// Tokenizes a line on whitespace, the way a simple command-line parser would. A
/// trailing separator yields a trailing empty token, matching the convention completion
/// engines use to represent "the word under the cursor hasn't started yet".
#[must_use]
pub fn tokenize(line: &str) -> Vec<String> {
    let mut tokens: Vec<String> = line.split_whitespace().map(str::to_string).collect();
    if line.ends_with(char::is_whitespace) {
        tokens.push(String::new());
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(token: &str) -> String { token.to_string() }

    #[test]
    fn test_unclosed_paren_classifies_method() {
        let line = "foo bar(";
        let args = tokenize(line);
        let (command, context) = evaluate_command_line(line, &args, line.len(), identity);
        assert_eq!(context, ContextKind::Method);
        assert_eq!(command, "foo bar");
    }

    #[test]
    fn test_char_before_cursor_close_paren_classifies_syntax() {
        let line = "foo bar )";
        let args = tokenize(line);
        let (_, context) = evaluate_command_line(line, &args, line.len(), identity);
        assert_eq!(context, ContextKind::Syntax);
    }

    #[test]
    fn test_trailing_space_with_one_arg_classifies_command() {
        let line = "foo bar ";
        let args = tokenize(line);
        let (command, context) = evaluate_command_line(line, &args, line.len(), identity);
        assert_eq!(context, ContextKind::Command);
        assert_eq!(command, "foo");
    }

    #[test]
    fn test_tokenize_trailing_space_adds_empty_slot() {
        assert_eq!(tokenize("cmd foo "), vec!["cmd", "foo", ""]);
        assert_eq!(tokenize("cmd"), vec!["cmd"]);
    }
}
