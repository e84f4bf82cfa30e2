// Copyright (c) 2025 rline contributors. Licensed under Apache License, Version 2.0.

//! Per-thread session state (§4.4 "Session lifetime").

use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use std::thread::ThreadId;

/// Which job, if any, currently owns the terminal's foreground.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct JobId(pub u64);

/// Everything a command invocation needs: streams, working directory, environment, the
/// last exit code observed on this thread, and the foreground job pointer. One `Session`
/// exists per reader thread.
///
/// Streams are boxed trait objects rather than the concrete `Stdin`/`Stdout` handles so
/// that pipeline execution (`|`, `|;`, `>`, `>>`) can splice in in-memory buffers between
/// stages without every provider needing to know it's part of a pipeline.
pub struct Session {
    pub stdin: Box<dyn Read + Send>,
    pub stdout: Box<dyn Write + Send>,
    pub stderr: Box<dyn Write + Send>,
    pub working_dir: PathBuf,
    pub env: HashMap<String, String>,
    pub last_exit_code: i32,
    pub foreground_job: Option<JobId>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("working_dir", &self.working_dir)
            .field("last_exit_code", &self.last_exit_code)
            .field("foreground_job", &self.foreground_job)
            .finish_non_exhaustive()
    }
}

impl Session {
    #[must_use]
    pub fn new(working_dir: PathBuf) -> Self {
        Self {
            stdin: Box::new(std::io::stdin()),
            stdout: Box::new(std::io::stdout()),
            stderr: Box::new(std::io::stderr()),
            working_dir,
            env: std::env::vars().collect(),
            last_exit_code: 0,
            foreground_job: None,
        }
    }
}

impl Default for Session {
    fn default() -> Self { Self::new(std::env::current_dir().unwrap_or_default()) }
}

/// The process-wide map from owning thread to its `Session`. Created once via
/// [`OnceLock`]; per-thread entries are only ever touched by their owning thread, so the
/// `Mutex` here only ever sees uncontended, momentary locking for map structural changes.
fn sessions() -> &'static Mutex<HashMap<ThreadId, Session>> {
    static SESSIONS: OnceLock<Mutex<HashMap<ThreadId, Session>>> = OnceLock::new();
    SESSIONS.get_or_init(|| Mutex::new(HashMap::new()))
}

fn lock_sessions() -> std::sync::MutexGuard<'static, HashMap<ThreadId, Session>> {
    sessions().lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Registers `session` as the current thread's session. Nested registration is not
/// supported; calling this again on the same thread replaces the previous session.
pub fn register(session: Session) {
    lock_sessions().insert(std::thread::current().id(), session);
}

/// Removes the current thread's session, if any.
pub fn deregister() {
    lock_sessions().remove(&std::thread::current().id());
}

/// Runs `f` against the current thread's session, if one is registered.
pub fn with_current<R>(f: impl FnOnce(&mut Session) -> R) -> Option<R> {
    let mut guard = lock_sessions();
    guard.get_mut(&std::thread::current().id()).map(f)
}

/// Whether the current thread has a registered session.
#[must_use]
pub fn has_current() -> bool {
    lock_sessions().contains_key(&std::thread::current().id())
}

/// RAII handle returned by [`bind`]; deregisters the bound session when dropped, even if
/// the scope exits via panic. Rust has no ambient-context primitive as cheap to scope as a
/// `with`/`using` block, so this is the "scoped acquisition that guarantees release on all
/// exit paths" the registry's thread-indexed session map calls for.
#[derive(Debug)]
#[must_use = "the session is deregistered as soon as this guard drops"]
pub struct SessionGuard(());

impl Drop for SessionGuard {
    fn drop(&mut self) { deregister(); }
}

/// Registers `session` on the current thread and returns a guard that deregisters it on
/// drop. Prefer this over bare [`register`]/[`deregister`] pairs around fallible work.
pub fn bind(session: Session) -> SessionGuard {
    register(session);
    SessionGuard(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_then_deregister_round_trips() {
        assert!(!has_current());
        register(Session::default());
        assert!(has_current());
        with_current(|s| s.last_exit_code = 7);
        assert_eq!(with_current(|s| s.last_exit_code), Some(7));
        deregister();
        assert!(!has_current());
    }

    #[test]
    fn test_rebinding_replaces_rather_than_nests() {
        register(Session::default());
        with_current(|s| s.last_exit_code = 3);
        register(Session::default());
        assert_eq!(with_current(|s| s.last_exit_code), Some(0));
        deregister();
    }
}
