//! Error handling for the karium CLI.
//!
//! Library errors convert into [`CliError`] through `#[from]`; `main`
//! turns the result into a miette report.

mod miette;

use std::path::PathBuf;
use thiserror::Error;

pub use self::miette::cli_error_to_miette;

/// Top-level CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Build pipeline failures, including the warning gate
    #[error(transparent)]
    Build(#[from] karium_build::BuildError),

    /// Project root that is not an existing directory
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// I/O errors from file system operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using `CliError` as the default error type.
pub type Result<T, E = CliError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_errors_are_transparent() {
        let err: CliError = karium_build::BuildError::FailedOnWarnings { count: 2 }.into();
        assert_eq!(err.to_string(), "Build finished with 2 warning(s)");
    }

    #[test]
    fn missing_root_names_the_path() {
        let err = CliError::FileNotFound(PathBuf::from("/work/pkg"));
        assert_eq!(err.to_string(), "File not found: /work/pkg");
    }
}
