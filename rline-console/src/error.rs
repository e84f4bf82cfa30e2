// Copyright (c) 2025 rline contributors. Licensed under Apache License, Version 2.0.

//! Registry-level error types (§7 "Registry misuse").

/// Failures the registry detects synchronously, independent of any provider's own
/// command-execution errors.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum RegistryError {
    #[error("a provider named {name:?} is already registered")]
    #[diagnostic(code(rline_console::registry::duplicate_name))]
    DuplicateProviderName { name: String },

    #[error("alias {alias:?} targets unknown command {target:?}")]
    #[diagnostic(code(rline_console::registry::unknown_alias_target))]
    UnknownAliasTarget { alias: String, target: String },

    #[error("no provider or alias resolves command {name:?}")]
    #[diagnostic(code(rline_console::registry::unknown_command))]
    UnknownCommand { name: String },

    #[error("failed to parse pipeline: {reason}")]
    #[diagnostic(code(rline_console::registry::pipeline_parse))]
    PipelineParse { reason: String },

    #[error("startup initialization failed")]
    #[diagnostic(code(rline_console::registry::initialize_failed))]
    InitializeFailed(#[source] miette::Report),

    #[error("terminal I/O failure")]
    #[diagnostic(code(rline_console::registry::terminal_io))]
    TerminalIo(#[from] std::io::Error),
}

/// A non-fatal failure raised by a provider's `invoke`/`description`/etc. call. These are
/// captured, routed through [`crate::registry::Registry::trace`], and reflected in the
/// session's exit code — they never abort the registry.
#[derive(Debug, thiserror::Error)]
#[error("command {command:?} failed: {source}")]
pub struct CommandError {
    pub command: String,
    #[source]
    pub source: miette::Report,
}
