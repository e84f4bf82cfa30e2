// Copyright (c) 2025 rline contributors. Licensed under Apache License, Version 2.0.

//! Component C: the command description engine — context classification, the cached
//! description record, tail-tip/status formation, and status-area layout, per §4.3.

pub mod cache;
pub mod command_description;
pub mod context;
pub mod layout;
pub mod tail_tip;

pub use cache::DescriptionCache;
pub use command_description::{find_option, option_takes_value, CommandDescription, PositionalArg};
pub use context::{evaluate_command_line, tokenize, ContextKind};
pub use layout::{pack_columns, render_main_description, render_option_filtered};
pub use tail_tip::{do_command_tail_tip, SuggestionSource, TailTipState};
