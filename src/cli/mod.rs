//! Command-line interface for lyriks.
//!
//! This module provides the `sync`, `fetch` and `fix` commands.

mod commands;

pub use commands::{Cli, Commands, run_command};
