// Copyright (c) 2025 rline contributors. Licensed under Apache License, Version 2.0.

//! Close-mode policy (§4.2 "Close modes") governing access to a stream after `close()`.
//!
//! The source this was ported from defaults byte streams to strict and char streams to
//! warn; per §9 Open Question (i) we pick one default and document it here rather than
//! replicate the split: every stream in this crate defaults to [`CloseMode::Warn`] unless
//! the caller opts into `strict` explicitly.

use std::backtrace::Backtrace;
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

/// Policy governing access to a stream after `close()`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum CloseMode {
    Strict,
    #[default]
    Warn,
    Lenient,
}

impl CloseMode {
    /// Reads `RLINE_CLOSE_MODE` (`strict`/`warn`/`lenient`), falling back to the legacy
    /// boolean `RLINE_STRICT_CLOSE` (`true` -> strict, `false` -> warn), falling back to
    /// [`CloseMode::default`].
    #[must_use]
    pub fn from_env() -> Self { Self::from_lookup(|key| env::var(key).ok()) }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(raw) = lookup("RLINE_CLOSE_MODE") {
            return match raw.to_ascii_lowercase().as_str() {
                "strict" => Self::Strict,
                "warn" => Self::Warn,
                "lenient" => Self::Lenient,
                _ => Self::default(),
            };
        }
        if let Some(raw) = lookup("RLINE_STRICT_CLOSE") {
            return if raw.eq_ignore_ascii_case("true") {
                Self::Strict
            } else {
                Self::Warn
            };
        }
        Self::default()
    }
}

/// Error raised by strict-mode access to a closed stream.
#[derive(Debug, Error)]
#[error("stream accessed after close")]
pub struct ClosedStreamError;

/// Per-instance configuration pairing a [`CloseMode`] with the warn-once gate §4.2
/// requires ("Warn mode must emit at most one log record per stream instance").
#[derive(Debug)]
pub struct CloseModeConfig {
    mode: CloseMode,
    warned: AtomicBool,
}

impl CloseModeConfig {
    #[must_use]
    pub fn new(mode: CloseMode) -> Self {
        Self {
            mode,
            warned: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn from_env() -> Self { Self::new(CloseMode::from_env()) }

    #[must_use]
    pub fn mode(&self) -> CloseMode { self.mode }

    /// Called on every post-close access. Returns `Err` only in strict mode.
    pub fn on_closed_access(&self) -> Result<(), ClosedStreamError> {
        match self.mode {
            CloseMode::Strict => Err(ClosedStreamError),
            CloseMode::Warn => {
                if !self.warned.swap(true, Ordering::AcqRel) {
                    tracing::warn!(
                        backtrace = %Backtrace::capture(),
                        "stream accessed after close; enable RLINE_CLOSE_MODE=strict to fail fast instead"
                    );
                }
                Ok(())
            }
            CloseMode::Lenient => Ok(()),
        }
    }
}

impl Default for CloseModeConfig {
    fn default() -> Self { Self::new(CloseMode::default()) }
}
