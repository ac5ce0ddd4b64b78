use std::path::PathBuf;

use karium_config::{ConfigError, LoadError};

use crate::hooks::HookName;

/// Error types for karium-build operations.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Invalid or unloadable configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A schema or preset module could not be loaded.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// A hook handler failed.
    #[error("hook '{hook}' failed: {source}")]
    Hook {
        hook: HookName,
        #[source]
        source: anyhow::Error,
    },

    /// An external collaborator (bundler, mirror or schema tool) failed.
    #[error("{tool} failed: {source}")]
    Tool {
        tool: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// I/O error with context message.
    #[error("{message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Invalid output path (e.g., directory traversal attempt).
    #[error("Invalid output path: {0}")]
    InvalidOutputPath(String),

    /// Refusing to clean a directory that is, or contains, the project root.
    #[error("Refusing to clean '{}': it contains the project root '{}'", .dir.display(), .root.display())]
    UnsafeCleanTarget { dir: PathBuf, root: PathBuf },

    /// The build produced warnings and `failOnWarn` is set.
    #[error("Build finished with {count} warning(s)")]
    FailedOnWarnings { count: usize },
}

/// Result type alias for karium-build operations.
pub type Result<T> = std::result::Result<T, BuildError>;

impl BuildError {
    pub(crate) fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        BuildError::Io {
            message: message.into(),
            source,
        }
    }

    pub(crate) fn tool(tool: &'static str, source: anyhow::Error) -> Self {
        BuildError::Tool { tool, source }
    }
}

impl miette::Diagnostic for BuildError {
    fn code(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        Some(Box::new(match self {
            BuildError::Config(ConfigError::MissingEntryInput { .. }) => "MISSING_ENTRY_INPUT",
            BuildError::Config(_) => "INVALID_CONFIG",
            BuildError::Load(_) => "LOAD_ERROR",
            BuildError::Hook { .. } => "HOOK_ERROR",
            BuildError::Tool { .. } => "TOOL_ERROR",
            BuildError::Io { .. } => "IO_ERROR",
            BuildError::InvalidOutputPath(_) => "INVALID_OUTPUT_PATH",
            BuildError::UnsafeCleanTarget { .. } => "UNSAFE_CLEAN_TARGET",
            BuildError::FailedOnWarnings { .. } => "FAILED_ON_WARNINGS",
        }))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Error)
    }

    fn help(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        match self {
            BuildError::Config(ConfigError::MissingEntryInput { .. }) => Some(Box::new(
                "Every entry needs an `input`, e.g. `entries = [\"src/index\"]`",
            )),
            BuildError::Config(ConfigError::Load(_)) | BuildError::Load(_) => Some(Box::new(
                "Check the file for syntax errors. Supported formats are TOML and JSON.",
            )),
            BuildError::InvalidOutputPath(path) => Some(Box::new(format!(
                "The output path '{}' is invalid. Ensure it stays within the entry's output directory.",
                path
            ))),
            BuildError::UnsafeCleanTarget { .. } => Some(Box::new(
                "Point `outDir` at a subdirectory of the project, or set `clean = false`.",
            )),
            BuildError::FailedOnWarnings { .. } => Some(Box::new(
                "You can change this behavior by setting `failOnWarn: false`.",
            )),
            _ => None,
        }
    }
}
