//! Clap-derived argument parsing for the `bpm` binary.

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "bpm", about = "Package manager for policy bundles", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Add or upgrade a requirement on the working bundle and resync the lock file.
    Get {
        /// Bundle source (typically a Git URL), e.g. `git://example.com/foo`.
        source: String,
        /// Version spec to install. Empty resolves to the remote's HEAD.
        #[arg(short, long, default_value = "")]
        version: String,
    },
    /// Print the `bpm` version and exit.
    Version,
}
