//! Command-line interface definition for karium.
//!
//! # Command Structure
//!
//! - `karium build [ROOT]` - Build the package at ROOT
//! - `karium check [ROOT]` - Resolve configuration and check manifest paths

mod commands;
mod tests;

use clap::Parser;

pub use commands::{BuildArgs, CheckArgs, Command};

/// karium - layered package builds
#[derive(Parser, Debug)]
#[command(
    name = "karium",
    version,
    about = "Build JavaScript/TypeScript packages from layered configuration",
    long_about = "karium resolves build configuration from build.config, package.json,\n\
                  presets and defaults, dispatches each entry to the typegen, mirror or\n\
                  bundle builder, and validates the result against the package manifest."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}
