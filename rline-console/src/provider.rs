// Copyright (c) 2025 rline contributors. Licensed under Apache License, Version 2.0.

//! The [`CommandProvider`] trait and the completion candidate it contributes (§4.4
//! "Responsibility").

use std::collections::BTreeMap;
use std::sync::Arc;

use rline::CommandDescription;

use crate::error::CommandError;
use crate::session::Session;

/// A single proposed completion, tagged with the provider that offered it.
#[derive(Clone, Debug)]
pub struct Candidate {
    pub value: String,
    pub display: String,
    pub group: String,
    pub descr: Option<String>,
    pub complete: bool,
}

impl Candidate {
    #[must_use]
    pub fn new(value: impl Into<String>, group: impl Into<String>, descr: Option<String>) -> Self {
        let value = value.into();
        Self {
            display: value.clone(),
            value,
            group: group.into(),
            descr,
            complete: true,
        }
    }
}

/// A completer: given the partial word being typed, proposes candidates.
pub trait Completer: Send + Sync {
    fn complete(&self, partial: &str) -> Vec<Candidate>;
}

/// Something a provider exposes to the aggregator about one of its commands.
#[derive(Clone, Debug, Default)]
pub struct CommandInfo {
    pub summary: String,
    pub is_subcommand: bool,
}

/// A source of commands the registry can aggregate. Implemented once per logical command
/// group (builtins, a plugin, a scripting surface, ...); the aggregator owns any number of
/// providers and resolves names across all of them in registration order.
pub trait CommandProvider: Send + Sync {
    /// This provider's own name, used as the `group` tag on its candidates and as the
    /// key rejected by [`RegistryError::DuplicateProviderName`].
    fn name(&self) -> &str;

    /// Every command name this provider answers to, canonical names only (no aliases).
    fn command_names(&self) -> Vec<String>;

    /// Alias → canonical command name, scoped to this provider.
    fn alias_map(&self) -> BTreeMap<String, String> { BTreeMap::new() }

    fn info(&self, name: &str) -> Option<CommandInfo>;

    fn has(&self, name: &str) -> bool { self.command_names().iter().any(|n| n == name) }

    /// Command name → list of completers for that command's argument positions. `Arc`
    /// rather than `Box` so the aggregator can hand the same completer out again under an
    /// alias entry without cloning provider state.
    fn compile_completers(&self) -> BTreeMap<String, Vec<Arc<dyn Completer>>> { BTreeMap::new() }

    /// Resolves a full [`CommandDescription`] for the given already-tokenized arguments
    /// (token 0 is the command name), or `None` if this provider doesn't recognize it.
    fn description(&self, args: &[String]) -> Option<CommandDescription>;

    /// Executes `name` with `args` (token 0 is the command name) against `session`,
    /// returning the process-style exit code on success.
    fn invoke(&self, session: &mut Session, name: &str, args: &[String]) -> Result<i32, CommandError>;
}
