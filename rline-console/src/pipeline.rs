// Copyright (c) 2025 rline contributors. Licensed under Apache License, Version 2.0.

//! Pipeline parsing (§4.4 "Dispatch", "Operator semantics"). Operators are required to be
//! whitespace-separated tokens, matching every example the specification gives; this
//! keeps the parser a simple token scanner rather than a full shell grammar.

use crate::error::RegistryError;

/// One parsed command: its name and full argv (token 0 is the command name itself, so
/// `args[0] == command`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stage {
    pub command: String,
    pub args: Vec<String>,
}

/// How consecutive stages are connected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Connector {
    /// Left's stdout feeds right's stdin; both stages run concurrently.
    Pipe,
    /// Left's captured stdout becomes a single trailing argument to right; left runs to
    /// completion first.
    Flip,
    /// Right runs only if left's exit code was 0.
    And,
    /// Right runs only if left's exit code was non-zero.
    Or,
}

/// Whether a trailing redirect truncates or appends to its target file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RedirectMode {
    Truncate,
    Append,
}

/// A fully parsed pipeline: an alternating chain of stages and connectors, an optional
/// trailing output redirect, and whether it was suffixed with `&` for background
/// scheduling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pipeline {
    pub stages: Vec<Stage>,
    /// `connectors[i]` joins `stages[i]` to `stages[i + 1]`; always `stages.len() - 1` long.
    pub connectors: Vec<Connector>,
    pub redirect: Option<(RedirectMode, String)>,
    pub background: bool,
}

fn connector_for(token: &str) -> Option<Connector> {
    match token {
        "|" => Some(Connector::Pipe),
        "|;" => Some(Connector::Flip),
        "&&" => Some(Connector::And),
        "||" => Some(Connector::Or),
        _ => None,
    }
}

/// Parses `line` into a [`Pipeline`]. This is the "injected parser" §4.4 refers to — the
/// registry calls it but doesn't hardcode shell grammar itself.
pub fn parse(line: &str) -> Result<Pipeline, RegistryError> {
    let mut tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.is_empty() {
        return Err(RegistryError::PipelineParse { reason: "empty pipeline".to_string() });
    }

    let background = if tokens.last() == Some(&"&") {
        tokens.pop();
        true
    } else {
        false
    };
    if tokens.is_empty() {
        return Err(RegistryError::PipelineParse { reason: "pipeline has no stages before '&'".to_string() });
    }

    let redirect_idx = tokens.iter().position(|t| *t == ">" || *t == ">>");
    let (body, redirect) = if let Some(idx) = redirect_idx {
        let mode = if tokens[idx] == ">>" { RedirectMode::Append } else { RedirectMode::Truncate };
        let path = tokens
            .get(idx + 1)
            .ok_or_else(|| RegistryError::PipelineParse { reason: "redirect operator missing a target path".to_string() })?;
        if idx + 2 != tokens.len() {
            return Err(RegistryError::PipelineParse {
                reason: "redirect must be the last element of the pipeline".to_string(),
            });
        }
        (&tokens[..idx], Some((mode, (*path).to_string())))
    } else {
        (&tokens[..], None)
    };

    let mut stages = Vec::new();
    let mut connectors = Vec::new();
    let mut current: Vec<String> = Vec::new();

    for token in body {
        if let Some(connector) = connector_for(token) {
            if current.is_empty() {
                return Err(RegistryError::PipelineParse { reason: format!("operator {token:?} with no preceding stage") });
            }
            stages.push(stage_from(std::mem::take(&mut current))?);
            connectors.push(connector);
        } else {
            current.push((*token).to_string());
        }
    }
    if current.is_empty() {
        return Err(RegistryError::PipelineParse { reason: "operator with no following stage".to_string() });
    }
    stages.push(stage_from(current)?);

    Ok(Pipeline { stages, connectors, redirect, background })
}

fn stage_from(args: Vec<String>) -> Result<Stage, RegistryError> {
    let command = args.first().cloned().ok_or_else(|| RegistryError::PipelineParse { reason: "empty stage".to_string() })?;
    Ok(Stage { command, args })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_and_or_chain() {
        let pipeline = parse("echo ok && false || echo recover").unwrap();
        assert_eq!(pipeline.stages.len(), 3);
        assert_eq!(pipeline.connectors, vec![Connector::And, Connector::Or]);
        assert_eq!(pipeline.stages[0].command, "echo");
        assert_eq!(pipeline.stages[0].args, vec!["echo", "ok"]);
    }

    #[test]
    fn test_parses_pipe() {
        let pipeline = parse("a | b").unwrap();
        assert_eq!(pipeline.connectors, vec![Connector::Pipe]);
    }

    #[test]
    fn test_parses_flip() {
        let pipeline = parse("a |; b").unwrap();
        assert_eq!(pipeline.connectors, vec![Connector::Flip]);
    }

    #[test]
    fn test_parses_redirect_and_background() {
        let pipeline = parse("a | b >> out.log &").unwrap();
        assert!(pipeline.background);
        assert_eq!(pipeline.redirect, Some((RedirectMode::Append, "out.log".to_string())));
        assert_eq!(pipeline.stages.len(), 2);
    }

    #[test]
    fn test_dangling_operator_is_a_parse_error() {
        assert!(parse("a &&").is_err());
        assert!(parse("&& a").is_err());
    }
}
