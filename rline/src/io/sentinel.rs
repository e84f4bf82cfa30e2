// Copyright (c) 2025 rline contributors. Licensed under Apache License, Version 2.0.

//! Timeout and read-outcome sentinels. Timeouts and EOF/expiry are explicit values, never
//! exceptions — see §9 "Exception control flow".

use std::time::Duration;

/// A read/peek timeout. Zero and negative millisecond values both mean "block
/// indefinitely", per §5 "Cancellation and timeouts".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Timeout(Option<Duration>);

impl Timeout {
    pub const INFINITE: Self = Self(None);

    #[must_use]
    pub fn from_millis(ms: i64) -> Self {
        if ms <= 0 {
            Self(None)
        } else {
            Self(Some(Duration::from_millis(ms as u64)))
        }
    }

    #[must_use]
    pub fn duration(self) -> Option<Duration> { self.0 }

    #[must_use]
    pub fn is_infinite(self) -> bool { self.0.is_none() }
}

impl From<Duration> for Timeout {
    fn from(d: Duration) -> Self { Self(Some(d)) }
}

/// Result of a timed read/peek: a value, end-of-stream, or a timeout with no data ready.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadOutcome<T> {
    Value(T),
    Eof,
    Expired,
}

impl<T> ReadOutcome<T> {
    #[must_use]
    pub fn is_eof(&self) -> bool { matches!(self, Self::Eof) }

    #[must_use]
    pub fn is_expired(&self) -> bool { matches!(self, Self::Expired) }

    #[must_use]
    pub fn value(self) -> Option<T> {
        match self {
            Self::Value(v) => Some(v),
            Self::Eof | Self::Expired => None,
        }
    }
}
