// Copyright (c) 2025 rline contributors. Licensed under Apache License, Version 2.0.

//! Component D: the command provider registry, pipeline dispatch, and per-thread session
//! state that sits above `rline`'s text/I/O/description primitives.

pub mod error;
pub mod pipeline;
pub mod provider;
pub mod registry;
pub mod session;

pub use error::{CommandError, RegistryError};
pub use pipeline::{Connector, Pipeline, RedirectMode, Stage};
pub use provider::{Candidate, CommandInfo, CommandProvider, Completer};
pub use registry::Registry;
pub use session::{JobId, Session, SessionGuard};
