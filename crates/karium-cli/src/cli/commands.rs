use clap::{Args, Subcommand};
use std::path::PathBuf;

/// Available karium subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the package
    ///
    /// Runs every configured entry through its builder, prints the output
    /// size report and validates the package. Exits with status 1 when the
    /// build produced warnings and `failOnWarn` is enabled.
    Build(BuildArgs),

    /// Resolve configuration without building
    ///
    /// Prints the normalized entries and reports files referenced by
    /// package.json that do not exist yet.
    Check(CheckArgs),
}

/// Arguments for the build command
#[derive(Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Project root (defaults to the current directory)
    #[arg(value_name = "ROOT")]
    pub root: Option<PathBuf>,

    /// Write pass-through stubs instead of building
    ///
    /// Bundle entries re-export their sources and mirror entries are
    /// symlinked, so the package can be used without rebuilding.
    #[arg(long)]
    pub stub: bool,

    /// Keep existing files in the output directories
    #[arg(long)]
    pub no_clean: bool,

    /// Report warnings without failing the build
    #[arg(long)]
    pub no_fail_on_warn: bool,
}

/// Arguments for the check command
#[derive(Args, Debug, Clone, Default)]
pub struct CheckArgs {
    /// Project root (defaults to the current directory)
    #[arg(value_name = "ROOT")]
    pub root: Option<PathBuf>,
}

impl BuildArgs {
    pub fn root(&self) -> PathBuf {
        self.root.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}

impl CheckArgs {
    pub fn root(&self) -> PathBuf {
        self.root.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}
