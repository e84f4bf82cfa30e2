// Copyright (c) 2025 rline contributors. Licensed under Apache License, Version 2.0.

//! The three-tier description cache (§4.3 "Description retrieval").

use std::collections::HashMap;

use super::command_description::CommandDescription;
use super::context::ContextKind;

/// Holds the persistent, temporary, and volatile tiers a resolved [`CommandDescription`]
/// can land in, and applies the retrieval/caching rule from §4.3.
#[derive(Debug, Default)]
pub struct DescriptionCache {
    persistent: HashMap<String, CommandDescription>,
    /// `None` is the "resolved to null, don't recompute this line" sentinel.
    temporary: HashMap<String, Option<CommandDescription>>,
    volatile: HashMap<String, CommandDescription>,
}

impl DescriptionCache {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Looks up `command` across all three tiers in order (persistent, temporary,
    /// volatile), removing it from `volatile` on a hit. Returns `None` both when nothing
    /// is cached and when a null sentinel is cached in `temporary` — callers that need to
    /// distinguish "not cached, call the resolver" from "cached as null" should use
    /// [`Self::is_cached`] first.
    #[must_use]
    pub fn get(&mut self, command: &str) -> Option<CommandDescription> {
        if let Some(d) = self.persistent.get(command) {
            return Some(d.clone());
        }
        if let Some(slot) = self.temporary.get(command) {
            return slot.clone();
        }
        self.volatile.remove(command)
    }

    #[must_use]
    pub fn is_cached(&self, command: &str) -> bool {
        self.persistent.contains_key(command) || self.temporary.contains_key(command)
    }

    /// Returns the cached description for `command` if any tier already holds one
    /// (resolving nothing); otherwise calls `resolver` and files the result per §4.3:
    /// COMMAND context with caching off goes to `volatile` (single read, then evicted);
    /// COMMAND context with caching on goes to `persistent` if non-null, else a null
    /// sentinel goes to `temporary`; any other context always goes to `temporary`.
    pub fn resolve(
        &mut self,
        command: &str,
        context: ContextKind,
        caching: bool,
        resolver: impl FnOnce(&str) -> Option<CommandDescription>,
    ) -> Option<CommandDescription> {
        if self.is_cached(command) {
            return self.get(command);
        }
        if let Some(cached) = self.volatile.remove(command) {
            return Some(cached);
        }

        let result = resolver(command);
        match (context, caching) {
            (ContextKind::Command, false) => {
                if let Some(ref d) = result {
                    self.volatile.insert(command.to_string(), d.clone());
                }
            }
            (ContextKind::Command, true) => {
                if let Some(ref d) = result {
                    self.persistent.insert(command.to_string(), d.clone());
                } else {
                    self.temporary.insert(command.to_string(), None);
                }
            }
            _ => {
                self.temporary.insert(command.to_string(), result.clone());
            }
        }
        result
    }

    /// Registers a description ahead of time, outside the resolver path.
    pub fn register_persistent(&mut self, command: impl Into<String>, description: CommandDescription) {
        self.persistent.insert(command.into(), description);
    }

    /// Clears the per-line tier. Called when the current line is accepted.
    pub fn clear_temporary(&mut self) { self.temporary.clear(); }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CommandDescription { CommandDescription::new(Vec::new()) }

    #[test]
    fn test_volatile_result_is_returned_once_then_evicted() {
        let mut cache = DescriptionCache::new();
        let calls = std::cell::Cell::new(0);
        let resolve = |_: &str| {
            calls.set(calls.get() + 1);
            Some(sample())
        };
        assert!(cache.resolve("cp", ContextKind::Command, false, resolve).is_some());
        assert_eq!(calls.get(), 1);
        // Immediate next retrieval reuses the volatile entry without calling the resolver.
        assert!(cache.get("cp").is_some());
        // Having been read once, it's now evicted.
        assert!(cache.get("cp").is_none());
    }

    #[test]
    fn test_persistent_result_is_reused_indefinitely() {
        let mut cache = DescriptionCache::new();
        cache.resolve("cp", ContextKind::Command, true, |_| Some(sample()));
        assert!(cache.get("cp").is_some());
        assert!(cache.get("cp").is_some());
        assert!(cache.get("cp").is_some());
    }

    #[test]
    fn test_null_result_cached_in_temporary_is_not_recomputed() {
        let mut cache = DescriptionCache::new();
        let calls = std::cell::Cell::new(0);
        let resolve = |_: &str| {
            calls.set(calls.get() + 1);
            None
        };
        assert!(cache.resolve("unknown", ContextKind::Command, true, resolve).is_none());
        assert!(cache.resolve("unknown", ContextKind::Command, true, resolve).is_none());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_clear_temporary_allows_re_resolution_next_line() {
        let mut cache = DescriptionCache::new();
        cache.resolve("cp", ContextKind::Method, true, |_| Some(sample()));
        cache.clear_temporary();
        assert!(!cache.is_cached("cp"));
    }
}
