//! # Postern CLI
//!
//! Two commands: `init` writes a configuration template, `serve` runs
//! the server.

pub mod args;
pub mod commands;
pub mod errors;

pub use args::{Cli, Command};
pub use errors::{CliError, CliResult};
