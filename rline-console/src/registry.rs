// Copyright (c) 2025 rline contributors. Licensed under Apache License, Version 2.0.

//! The provider aggregator: name/alias resolution, completer composition, pipeline
//! dispatch, and lifecycle hooks (§4.4).

use std::collections::BTreeMap;
use std::io::{Cursor, Write};
use std::sync::Arc;

use rline::CommandDescription;

use crate::error::RegistryError;
use crate::pipeline::{self, Connector, Pipeline, RedirectMode};
use crate::provider::{Candidate, CommandInfo, CommandProvider, Completer};
use crate::session::Session;

/// Hosts any number of [`CommandProvider`]s and presents them as one command surface.
/// Names and aliases are resolved by iterating providers in registration order; the first
/// match wins.
pub struct Registry {
    providers: Vec<Box<dyn CommandProvider>>,
    closed: bool,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("providers", &self.providers.iter().map(|p| p.name()).collect::<Vec<_>>())
            .field("closed", &self.closed)
            .finish()
    }
}

impl Default for Registry {
    fn default() -> Self { Self::new() }
}

impl Registry {
    #[must_use]
    pub fn new() -> Self { Self { providers: Vec::new(), closed: false } }

    /// Adds a provider. Fails if another provider already registered under the same name,
    /// or if any of the provider's declared aliases targets a command neither it nor any
    /// already-registered provider recognizes (§4.4: unknown alias targets are reported as
    /// invalid-argument failures synchronously, at registration time).
    pub fn register_provider(&mut self, provider: Box<dyn CommandProvider>) -> Result<(), RegistryError> {
        if self.providers.iter().any(|p| p.name() == provider.name()) {
            return Err(RegistryError::DuplicateProviderName { name: provider.name().to_string() });
        }
        let own_commands = provider.command_names();
        for (alias, target) in provider.alias_map() {
            if !own_commands.contains(&target) && !self.has(&target) {
                return Err(RegistryError::UnknownAliasTarget { alias, target });
            }
        }
        self.providers.push(provider);
        Ok(())
    }

    /// Resolves `token` to a canonical command name: if any provider's alias map carries
    /// it, the alias target is returned; otherwise the token is assumed already canonical.
    #[must_use]
    pub fn command_of(&self, token: &str) -> String {
        for provider in &self.providers {
            if let Some(target) = provider.alias_map().get(token) {
                return target.clone();
            }
        }
        token.to_string()
    }

    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.providers.iter().any(|p| p.has(name) || p.alias_map().contains_key(name))
    }

    fn resolve_provider(&self, name: &str) -> Option<(&dyn CommandProvider, String)> {
        for provider in &self.providers {
            if provider.has(name) {
                return Some((provider.as_ref(), name.to_string()));
            }
            if let Some(target) = provider.alias_map().get(name) {
                return Some((provider.as_ref(), target.clone()));
            }
        }
        None
    }

    #[must_use]
    pub fn info(&self, name: &str) -> Option<CommandInfo> {
        let (provider, canonical) = self.resolve_provider(name)?;
        provider.info(&canonical)
    }

    #[must_use]
    pub fn description(&self, args: &[String]) -> Option<CommandDescription> {
        let name = args.first()?;
        let (provider, canonical) = self.resolve_provider(name)?;
        let mut canonical_args = args.to_vec();
        canonical_args[0] = canonical;
        provider.description(&canonical_args)
    }

    /// Unions every provider's `(command -> completers)` map, then materializes alias
    /// entries so completing an alias proposes its target's completions.
    #[must_use]
    pub fn compile_completers(&self) -> BTreeMap<String, Vec<Arc<dyn Completer>>> {
        let mut merged: BTreeMap<String, Vec<Arc<dyn Completer>>> = BTreeMap::new();
        for provider in &self.providers {
            for (name, completers) in provider.compile_completers() {
                merged.entry(name).or_default().extend(completers);
            }
        }
        for provider in &self.providers {
            for (alias, target) in provider.alias_map() {
                if let Some(target_completers) = merged.get(&target).cloned() {
                    merged.entry(alias).or_default().extend(target_completers);
                }
            }
        }
        merged
    }

    /// Completion candidates for the command word itself (not its arguments): every
    /// provider's command names and aliases, each tagged with its provider's name as
    /// `group` and the command's first info line as `descr`.
    #[must_use]
    pub fn command_candidates(&self) -> Vec<Candidate> {
        let mut candidates = Vec::new();
        for provider in &self.providers {
            for name in provider.command_names() {
                let descr = provider.info(&name).map(|i| i.summary);
                candidates.push(Candidate::new(name, provider.name(), descr));
            }
            for (alias, target) in provider.alias_map() {
                let descr = provider.info(&target).map(|i| i.summary);
                candidates.push(Candidate::new(alias, provider.name(), descr));
            }
        }
        candidates
    }

    /// Records a non-fatal command-execution failure. The default sink logs via
    /// `tracing`; callers needing custom routing should inspect the error before it
    /// reaches here, since `execute` already calls this on every stage failure.
    pub fn trace(&self, err: &(dyn std::error::Error + 'static)) {
        tracing::error!(error = %err, "command execution failed");
    }

    /// Runs a startup script through `execute`, one line per call, aborting on the first
    /// failure (per §4.4, `initialize` errors abort startup, unlike per-stage failures).
    pub fn initialize(&self, script: &str) -> Result<(), RegistryError> {
        for line in script.lines().map(str::trim).filter(|l| !l.is_empty()) {
            self.execute(line)?;
        }
        Ok(())
    }

    /// Idempotent: a second call is a no-op.
    pub fn cleanup(&mut self) {}

    /// Idempotent shutdown; safe to call more than once.
    pub fn close(&mut self) { self.closed = true; }

    #[must_use]
    pub fn is_closed(&self) -> bool { self.closed }

    /// Parses `line` into a pipeline and dispatches each stage, applying operator
    /// semantics (§4.4 "Operator semantics"). Returns the exit code of the last stage
    /// that actually ran.
    pub fn execute(&self, line: &str) -> Result<i32, RegistryError> {
        let pipeline = pipeline::parse(line)?;
        if pipeline.background {
            // §6 "Commands and exit codes": background pipelines yield 0 immediately and
            // report completion out-of-band. Synchronous `execute` has no out-of-band
            // channel to report through, so it still runs the pipeline inline; a caller
            // that wants true backgrounding schedules the work itself before calling in.
            let _ = self.run_pipeline(&pipeline);
            return Ok(0);
        }
        self.run_pipeline(&pipeline)
    }

    fn run_pipeline(&self, pipeline: &Pipeline) -> Result<i32, RegistryError> {
        let mut last_code = 0;
        let mut carried_stdout: Option<Vec<u8>> = None;
        let mut idx = 0;

        while idx < pipeline.stages.len() {
            let stage = &pipeline.stages[idx];
            let connector_before = idx.checked_sub(1).and_then(|i| pipeline.connectors.get(i));

            match connector_before {
                Some(Connector::And) if last_code != 0 => {
                    idx += 1;
                    continue;
                }
                Some(Connector::Or) if last_code == 0 => {
                    idx += 1;
                    continue;
                }
                _ => {}
            }

            let connector_after = pipeline.connectors.get(idx);
            let is_piped_input = matches!(connector_before, Some(Connector::Pipe));

            let mut args = stage.args.clone();
            if matches!(connector_before, Some(Connector::Flip)) {
                if let Some(bytes) = carried_stdout.take() {
                    args.push(String::from_utf8_lossy(&bytes).trim_end().to_string());
                }
            }

            let capture = matches!(connector_after, Some(Connector::Pipe | Connector::Flip))
                || (idx + 1 == pipeline.stages.len() && pipeline.redirect.is_some());

            let (code, output) = self.dispatch_one(&stage.command, &args, is_piped_input.then(|| carried_stdout.take()).flatten(), capture);
            last_code = code;

            if let Some(output) = output {
                if idx + 1 == pipeline.stages.len() {
                    if let Some((mode, path)) = &pipeline.redirect {
                        self.write_redirect(path, *mode, &output)?;
                    }
                } else {
                    carried_stdout = Some(output);
                }
            }

            idx += 1;
        }

        Ok(last_code)
    }

    fn write_redirect(&self, path: &str, mode: RedirectMode, bytes: &[u8]) -> Result<(), RegistryError> {
        use std::fs::OpenOptions;
        let mut opts = OpenOptions::new();
        opts.write(true).create(true);
        match mode {
            RedirectMode::Truncate => opts.truncate(true),
            RedirectMode::Append => opts.append(true),
        };
        let mut file = opts.open(path)?;
        file.write_all(bytes)?;
        Ok(())
    }

    fn dispatch_one(&self, name: &str, args: &[String], piped_input: Option<Vec<u8>>, capture: bool) -> (i32, Option<Vec<u8>>) {
        let Some((provider, canonical)) = self.resolve_provider(name) else {
            self.trace(&RegistryError::UnknownCommand { name: name.to_string() });
            return (127, None);
        };
        let mut canonical_args = args.to_vec();
        if canonical_args.is_empty() {
            canonical_args.push(canonical.clone());
        } else {
            canonical_args[0] = canonical.clone();
        }

        let capture_buf: Option<Arc<std::sync::Mutex<Vec<u8>>>> = capture.then(|| Arc::new(std::sync::Mutex::new(Vec::new())));

        let result = crate::session::with_current(|session| {
            if let Some(bytes) = piped_input {
                session.stdin = Box::new(Cursor::new(bytes));
            }
            let mut original_stdout: Box<dyn Write + Send> = Box::new(std::io::sink());
            if let Some(ref buf) = capture_buf {
                original_stdout = std::mem::replace(&mut session.stdout, Box::new(CaptureWriter { target: Arc::clone(buf) }));
            }
            let outcome = provider.invoke(session, &canonical, &canonical_args);
            if capture_buf.is_some() {
                // Drop the `CaptureWriter` (and its `Arc` clone) and restore the real
                // stream so the next dispatch on this session writes through normally.
                session.stdout = original_stdout;
            }
            outcome
        });

        match result {
            None => {
                self.trace(&RegistryError::TerminalIo(std::io::Error::other("no session registered on this thread")));
                (126, None)
            }
            Some(Ok(code)) => {
                let output = capture_buf.map(|buf| buf.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone());
                crate::session::with_current(|s| s.last_exit_code = code);
                (code, output)
            }
            Some(Err(err)) => {
                self.trace(&err);
                crate::session::with_current(|s| s.last_exit_code = 1);
                (1, None)
            }
        }
    }
}

/// A `Write` sink that appends into a shared buffer, used to capture a stage's stdout for
/// PIPE/FLIP/redirect without requiring providers to be pipeline-aware.
struct CaptureWriter {
    target: Arc<std::sync::Mutex<Vec<u8>>>,
}

impl Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.target.lock().unwrap_or_else(std::sync::PoisonError::into_inner).extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> { Ok(()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CommandError;
    use pretty_assertions::assert_eq;
    use std::io::Write as _;
    use test_case::test_case;

    /// Proposes `--force`/`--yes` for the `quit` command; exercised by
    /// [`test_compile_completers_materializes_alias_entries`].
    struct QuitCompleter;

    impl Completer for QuitCompleter {
        fn complete(&self, partial: &str) -> Vec<Candidate> {
            ["--force", "--yes"]
                .into_iter()
                .filter(|c| c.starts_with(partial))
                .map(|c| Candidate::new(c, "builtins", None))
                .collect()
        }
    }

    struct EchoProvider;

    impl CommandProvider for EchoProvider {
        fn name(&self) -> &str { "builtins" }

        fn command_names(&self) -> Vec<String> {
            vec!["echo".to_string(), "false".to_string(), "true".to_string(), "cat".to_string(), "quit".to_string()]
        }

        fn alias_map(&self) -> BTreeMap<String, String> {
            [("q".to_string(), "quit".to_string())].into_iter().collect()
        }

        fn info(&self, name: &str) -> Option<CommandInfo> {
            Some(CommandInfo { summary: format!("the {name} command"), is_subcommand: false })
        }

        fn has(&self, name: &str) -> bool { self.command_names().contains(&name.to_string()) }

        fn compile_completers(&self) -> BTreeMap<String, Vec<Arc<dyn Completer>>> {
            [("quit".to_string(), vec![Arc::new(QuitCompleter) as Arc<dyn Completer>])].into_iter().collect()
        }

        fn description(&self, _args: &[String]) -> Option<CommandDescription> { None }

        fn invoke(&self, session: &mut Session, name: &str, args: &[String]) -> Result<i32, CommandError> {
            match name {
                "echo" => {
                    let text = args[1..].join(" ");
                    let _ = writeln!(session.stdout, "{text}");
                    Ok(0)
                }
                "cat" => {
                    let mut buf = String::new();
                    let _ = std::io::Read::read_to_string(&mut session.stdin, &mut buf);
                    let _ = write!(session.stdout, "{buf}");
                    Ok(0)
                }
                "true" => Ok(0),
                "false" => Ok(1),
                "quit" => Ok(0),
                other => Err(CommandError { command: other.to_string(), source: miette::miette!("no such builtin") }),
            }
        }
    }

    /// A provider whose sole alias targets a command that nothing registers, used by
    /// [`test_unknown_alias_target_rejected`].
    struct DanglingAliasProvider;

    impl CommandProvider for DanglingAliasProvider {
        fn name(&self) -> &str { "dangling" }

        fn command_names(&self) -> Vec<String> { vec!["ls".to_string()] }

        fn alias_map(&self) -> BTreeMap<String, String> {
            [("ll".to_string(), "list-long".to_string())].into_iter().collect()
        }

        fn info(&self, name: &str) -> Option<CommandInfo> {
            Some(CommandInfo { summary: format!("the {name} command"), is_subcommand: false })
        }

        fn has(&self, name: &str) -> bool { self.command_names().contains(&name.to_string()) }

        fn description(&self, _args: &[String]) -> Option<CommandDescription> { None }

        fn invoke(&self, _session: &mut Session, _name: &str, _args: &[String]) -> Result<i32, CommandError> { Ok(0) }
    }

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry.register_provider(Box::new(EchoProvider)).unwrap();
        registry
    }

    #[test]
    fn test_alias_resolves_to_canonical_has_and_command_of() {
        let registry = registry();
        assert!(registry.has("q"));
        assert_eq!(registry.command_of("q"), "quit");
    }

    #[test]
    fn test_and_or_chain_runs_recover_branch() {
        crate::session::register(Session::default());
        let registry = registry();
        let code = registry.execute("echo ok && false || echo recover").unwrap();
        crate::session::deregister();
        assert_eq!(code, 0);
    }

    #[test]
    fn test_pipe_feeds_stdout_to_stdin() {
        crate::session::register(Session::default());
        let registry = registry();
        let code = registry.execute("echo hello | cat").unwrap();
        crate::session::deregister();
        assert_eq!(code, 0);
    }

    #[test]
    fn test_duplicate_provider_name_rejected() {
        let mut registry = Registry::new();
        registry.register_provider(Box::new(EchoProvider)).unwrap();
        let err = registry.register_provider(Box::new(EchoProvider)).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateProviderName { .. }));
    }

    #[test]
    fn test_unknown_alias_target_rejected() {
        let mut registry = Registry::new();
        let err = registry.register_provider(Box::new(DanglingAliasProvider)).unwrap_err();
        match err {
            RegistryError::UnknownAliasTarget { alias, target } => {
                assert_eq!(alias, "ll");
                assert_eq!(target, "list-long");
            }
            other => panic!("expected UnknownAliasTarget, got {other:?}"),
        }
    }

    #[test_case("q"; "via alias")]
    #[test_case("quit"; "via canonical name")]
    fn test_compile_completers_materializes_alias_entries(key: &str) {
        let registry = registry();
        let completers = registry.compile_completers();
        let candidates: Vec<String> =
            completers.get(key).into_iter().flatten().flat_map(|c| c.complete("--")).map(|c| c.value).collect();
        assert_eq!(candidates, vec!["--force".to_string(), "--yes".to_string()]);
    }
}
