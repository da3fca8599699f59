//! CLI argument definitions using clap
//!
//! Commands:
//! - postern init --config <path>
//! - postern serve --config <path> [--port <port>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Postern - A strict, self-hostable email/password authentication service
#[derive(Parser, Debug)]
#[command(name = "postern")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a commented configuration template
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./postern.toml")]
        config: PathBuf,
    },

    /// Start the postern server
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./postern.toml")]
        config: PathBuf,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
