//! File-based config discovery
//!
//! Finds the project's build config file and package manifest. Both are
//! optional: an absent file yields an empty value, while a file that exists
//! but cannot be parsed is an error.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::ConfigLayer;
use crate::error::{ConfigError, LoadError, Result};
use crate::loader::{FileModuleLoader, ModuleLoader};
use crate::manifest::PackageManifest;

/// Base name of the project config file, probed with each loader extension.
pub const BUILD_CONFIG_NAME: &str = "build.config";

pub const MANIFEST_NAME: &str = "package.json";

/// Loads configuration sources from a project root.
///
/// # Example
///
/// ```no_run
/// use karium_config::ConfigDiscovery;
///
/// let discovery = ConfigDiscovery::new(".");
/// let layer = discovery.load_build_config().unwrap();
/// let pkg = discovery.load_manifest().unwrap();
/// ```
#[derive(Clone)]
pub struct ConfigDiscovery {
    root: PathBuf,
    loader: Arc<dyn ModuleLoader>,
}

impl ConfigDiscovery {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self::with_loader(root, Arc::new(FileModuleLoader::new()))
    }

    pub fn with_loader(root: impl AsRef<Path>, loader: Arc<dyn ModuleLoader>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            loader,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn loader(&self) -> &Arc<dyn ModuleLoader> {
        &self.loader
    }

    /// Load `build.config` from the root; empty when there is none.
    pub fn load_build_config(&self) -> Result<ConfigLayer> {
        match self.loader.load_module(&self.root.join(BUILD_CONFIG_NAME)) {
            Ok(value) => ConfigLayer::from_value(value),
            Err(LoadError::NotFound(_)) => {
                tracing::debug!("No {} in {}", BUILD_CONFIG_NAME, self.root.display());
                Ok(ConfigLayer::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Load a module relative to the root; `None` when it does not exist.
    pub fn load_optional(&self, relative: impl AsRef<Path>) -> Result<Option<ConfigLayer>> {
        match self.loader.load_module(&self.root.join(relative)) {
            Ok(value) => ConfigLayer::from_value(value).map(Some),
            Err(LoadError::NotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Load `package.json`; empty when there is none.
    pub fn load_manifest(&self) -> Result<PackageManifest> {
        let path = self.root.join(MANIFEST_NAME);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("No {} in {}", MANIFEST_NAME, self.root.display());
                return Ok(PackageManifest::default());
            }
            Err(source) => return Err(LoadError::Io { path, source }.into()),
        };

        serde_json::from_str(&content).map_err(|e| {
            ConfigError::from(LoadError::Invalid {
                path,
                message: format!("Invalid JSON: {}", e),
            })
        })
    }
}

impl std::fmt::Debug for ConfigDiscovery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigDiscovery")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}
