// Copyright (c) 2025 rline contributors. Licensed under Apache License, Version 2.0.

//! Component B: the non-blocking stream primitive described in §4.2 — a bounded ring
//! that bridges a blocking platform source into `read(timeout)`/`peek(timeout)` style
//! access, plus the close-mode policy and the byte transcoder layered on top of it.

pub mod close_mode;
pub mod pump;
pub mod sentinel;
pub mod transcoder;

pub use close_mode::{CloseMode, CloseModeConfig, ClosedStreamError};
pub use pump::{BackgroundPump, CharPump, PumpClosed, PumpSpawnError};
pub use sentinel::{ReadOutcome, Timeout};
pub use transcoder::ByteTranscoder;
