// Copyright (c) 2025 rline contributors. Licensed under Apache License, Version 2.0.

//! Byte-stream view over a [`CharPump`] (§4.2 "Transcoder"). Encodes chars to UTF-8 as
//! they're served, with no unmappable-character case (UTF-8 represents all of Unicode) —
//! the policy only matters for malformed *input*, which the pump's own decoder already
//! resolved via `U+FFFD` substitution before chars ever reach the ring.

use std::sync::Arc;

use crate::io::close_mode::{CloseMode, CloseModeConfig, ClosedStreamError};
use crate::io::pump::CharPump;
use crate::io::sentinel::{ReadOutcome, Timeout};

/// Average UTF-8 bytes per char assumed by [`ByteTranscoder::available`] when no better
/// estimate is available; ASCII-heavy streams use 1, but command-line input frequently
/// carries a handful of multi-byte characters, so this leans conservative.
const AVERAGE_BYTES_PER_CHAR: usize = 1;

/// Presents the chars read from a [`CharPump`] as a byte stream, UTF-8 encoded.
#[derive(Debug)]
pub struct ByteTranscoder {
    pump: Arc<CharPump>,
    pending: Vec<u8>,
    pending_pos: usize,
    close_mode: CloseModeConfig,
}

impl ByteTranscoder {
    #[must_use]
    pub fn new(pump: Arc<CharPump>) -> Self { Self::with_close_mode(pump, CloseMode::default()) }

    /// Same as [`Self::new`], but with its own post-close access policy independent of the
    /// underlying pump's — the transcoder's notion of "closed" (pump closed *and* no
    /// pending decoded bytes left) differs from the pump's own, so it tracks the warn-once
    /// gate separately.
    #[must_use]
    pub fn with_close_mode(pump: Arc<CharPump>, mode: CloseMode) -> Self {
        Self {
            pump,
            pending: Vec::new(),
            pending_pos: 0,
            close_mode: CloseModeConfig::new(mode),
        }
    }

    fn has_pending(&self) -> bool { self.pending_pos < self.pending.len() }

    fn take_pending_byte(&mut self) -> u8 {
        let b = self.pending[self.pending_pos];
        self.pending_pos += 1;
        if self.pending_pos == self.pending.len() {
            self.pending.clear();
            self.pending_pos = 0;
        }
        b
    }

    /// Reads and consumes one byte, blocking at most `timeout` only when a fresh char must
    /// be pulled from the underlying pump. A call made while this transcoder is already
    /// closed (no pending bytes, pump closed) goes through its own
    /// [`CloseModeConfig::on_closed_access`] rather than the pump's (§4.2/§8 scenario 6).
    pub fn read(&mut self, timeout: Timeout) -> Result<ReadOutcome<u8>, ClosedStreamError> {
        if self.has_pending() {
            return Ok(ReadOutcome::Value(self.take_pending_byte()));
        }
        if self.pump.is_closed() {
            self.close_mode.on_closed_access()?;
            return Ok(ReadOutcome::Eof);
        }
        match self.pump.read(timeout) {
            Ok(ReadOutcome::Value(ch)) => {
                let mut buf = [0u8; 4];
                let encoded = ch.encode_utf8(&mut buf);
                self.pending = encoded.as_bytes().to_vec();
                self.pending_pos = 0;
                Ok(ReadOutcome::Value(self.take_pending_byte()))
            }
            Ok(ReadOutcome::Eof) => Ok(ReadOutcome::Eof),
            Ok(ReadOutcome::Expired) => Ok(ReadOutcome::Expired),
            Err(_) => {
                self.close_mode.on_closed_access()?;
                Ok(ReadOutcome::Eof)
            }
        }
    }

    /// Fills up to `out.len()` bytes, applying the same first-byte/1ms-drain policy as
    /// [`CharPump::read_buffered`].
    pub fn read_buffered(&mut self, out: &mut [u8], timeout: Timeout) -> Result<ReadOutcome<usize>, ClosedStreamError> {
        if out.is_empty() {
            return Ok(ReadOutcome::Value(0));
        }
        match self.read(timeout)? {
            ReadOutcome::Eof => Ok(ReadOutcome::Eof),
            ReadOutcome::Expired => Ok(ReadOutcome::Expired),
            ReadOutcome::Value(first) => {
                out[0] = first;
                let mut filled = 1;
                if !timeout.is_infinite() {
                    let drain = Timeout::from_millis(1);
                    while filled < out.len() {
                        match self.read(drain) {
                            Ok(ReadOutcome::Value(b)) => {
                                out[filled] = b;
                                filled += 1;
                            }
                            Ok(ReadOutcome::Expired | ReadOutcome::Eof) | Err(_) => break,
                        }
                    }
                }
                Ok(ReadOutcome::Value(filled))
            }
        }
    }

    /// Readable byte estimate: `readable_chars * average_bytes_per_char`, rounded down,
    /// plus whatever is already buffered from a partially-consumed char.
    #[must_use]
    pub fn available(&self) -> usize {
        (self.pump.available() * AVERAGE_BYTES_PER_CHAR) + (self.pending.len() - self.pending_pos)
    }

    pub fn close(&self) { self.pump.close(); }

    #[must_use]
    pub fn is_closed(&self) -> bool { self.pump.is_closed() && !self.has_pending() }
}
