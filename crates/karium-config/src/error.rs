//! Error types for configuration loading and normalization.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Failure to load a configuration or schema source module.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("module not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("invalid module {}: {message}", .path.display())]
    Invalid { path: PathBuf, message: String },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Entry without a resolvable `input`; carries the serialized entry.
    #[error("Missing entry input: {entry}")]
    MissingEntryInput { entry: String },

    #[error("invalid config value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    #[error("invalid external pattern '{pattern}': {source}")]
    InvalidExternal {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error(transparent)]
    Load(#[from] LoadError),
}
