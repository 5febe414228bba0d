//! CLI module for docstore
//!
//! Provides a command-line interface over one collection file:
//! - find, find-one, get: reads
//! - create, update, delete: writes

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{run, run_command};
pub use errors::{CliError, CliErrorCode, CliResult};
