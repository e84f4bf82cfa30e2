// Copyright (c) 2025 rline contributors. Licensed under Apache License, Version 2.0.

//! `rline` is the hard core of an interactive line-editing toolkit: the attributed-text
//! model and its ANSI renderer, the non-blocking input pipeline that feeds a reader, and
//! the command-description ("tail tip") engine that a reader consults after every
//! keystroke.
//!
//! Concrete terminal back-ends, widget key bindings, the prompt UI, and the command
//! registry's own providers are external collaborators; see the `rline-console` crate for
//! the registry and dispatch layer that sits on top of this one.

pub mod ansi;
pub mod describe;
pub mod io;

pub use ansi::*;
pub use describe::*;
pub use io::*;
