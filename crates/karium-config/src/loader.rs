//! Pluggable loading of configuration and schema source modules.
//!
//! The build core never touches a concrete module format. Anything that can
//! turn a path into a JSON value implements [`ModuleLoader`]; the default
//! [`FileModuleLoader`] reads TOML and JSON files through figment.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Format, Json, Toml};
use serde_json::Value;

use crate::error::LoadError;

/// Capability for loading a module at `path` into a JSON value.
pub trait ModuleLoader: Send + Sync {
    /// Load the module. Fails with [`LoadError::NotFound`] when nothing
    /// exists at `path` and with [`LoadError::Invalid`] when the module
    /// cannot be parsed.
    fn load_module(&self, path: &Path) -> Result<Value, LoadError>;
}

/// Loads `.toml` and `.json` modules from disk.
///
/// A path without a matching file is retried with each supported extension
/// appended, so `./karium.preset` finds `./karium.preset.toml`.
#[derive(Debug, Clone)]
pub struct FileModuleLoader {
    extensions: Vec<String>,
}

impl FileModuleLoader {
    pub fn new() -> Self {
        Self {
            extensions: vec!["toml".to_string(), "json".to_string()],
        }
    }

    /// Override the extensions probed when `path` itself does not exist.
    pub fn with_extensions<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|ext| ext.into().trim_start_matches('.').to_string())
                .collect(),
        }
    }

    /// Find the file backing `path`, probing extensions in order.
    pub fn locate(&self, path: &Path) -> Option<PathBuf> {
        if path.is_file() {
            return Some(path.to_path_buf());
        }

        self.extensions.iter().find_map(|ext| {
            let mut candidate = OsString::from(path.as_os_str());
            candidate.push(".");
            candidate.push(ext);
            let candidate = PathBuf::from(candidate);
            candidate.is_file().then_some(candidate)
        })
    }
}

impl Default for FileModuleLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleLoader for FileModuleLoader {
    fn load_module(&self, path: &Path) -> Result<Value, LoadError> {
        let file = self
            .locate(path)
            .ok_or_else(|| LoadError::NotFound(path.to_path_buf()))?;

        tracing::debug!("Loading module from {}", file.display());

        let figment = match file.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Figment::from(Toml::file(&file)),
            Some("json") => Figment::from(Json::file(&file)),
            other => {
                return Err(LoadError::Invalid {
                    path: file.clone(),
                    message: format!(
                        "unsupported module format '{}'",
                        other.unwrap_or_default()
                    ),
                });
            }
        };

        figment.extract::<Value>().map_err(|e| LoadError::Invalid {
            path: file,
            message: e.to_string(),
        })
    }
}
