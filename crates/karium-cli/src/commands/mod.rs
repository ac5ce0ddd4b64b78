//! Command implementations for the karium CLI.
//!
//! - [`build`] - run the build pipeline and apply the warning gate
//! - [`check`] - resolve configuration without building
//!
//! Each command provides an `execute` function that takes the parsed
//! arguments and returns a Result.

pub mod build;
pub mod check;

use std::path::{Path, PathBuf};

use crate::error::{CliError, Result};

pub use build::execute as build_execute;
pub use check::execute as check_execute;

/// Absolute project root, which must be an existing directory.
pub(crate) fn project_root(root: &Path) -> Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    let root = cwd.join(root);
    if !root.is_dir() {
        return Err(CliError::FileNotFound(root));
    }
    Ok(root)
}
