//! The mutable state threaded through one build.

use indexmap::IndexSet;
use karium_config::{BuildOptions, PackageManifest};
use serde::Serialize;

use crate::error::{BuildError, Result};
use crate::hooks::{HookArgs, HookName, Hooks};

/// An external module embedded in an output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleSize {
    pub id: String,
    pub bytes: u64,
}

/// One produced artifact.
///
/// `path` is relative to the build's `out_dir` with `/` separators.
/// `bytes` is `None` until the file is measured.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BuildManifestEntry {
    pub path: String,
    pub bytes: Option<u64>,
    pub chunk: bool,
    pub chunks: Vec<String>,
    pub exports: Vec<String>,
    pub modules: Vec<ModuleSize>,
}

impl BuildManifestEntry {
    pub fn entry(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn chunk(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            chunk: true,
            ..Self::default()
        }
    }
}

pub struct BuildContext {
    pub options: BuildOptions,
    pub pkg: PackageManifest,
    pub hooks: Hooks,
    pub build_entries: Vec<BuildManifestEntry>,
    pub warnings: IndexSet<String>,
    pub used_imports: IndexSet<String>,
}

impl BuildContext {
    pub fn new(options: BuildOptions, pkg: PackageManifest, hooks: Hooks) -> Self {
        Self {
            options,
            pkg,
            hooks,
            build_entries: Vec::new(),
            warnings: IndexSet::new(),
            used_imports: IndexSet::new(),
        }
    }

    /// Run every handler registered for `name` in order.
    ///
    /// Always suspends once, even without handlers. The handler list is
    /// snapshotted first, so handlers registered while the hook runs only
    /// apply to later calls.
    pub async fn call_hook(&mut self, name: HookName, args: &mut HookArgs<'_>) -> Result<()> {
        let handlers = self.hooks.handlers(name);
        if !handlers.is_empty() {
            tracing::debug!("Calling {} handler(s) for {}", handlers.len(), name);
        }

        for handler in handlers {
            handler
                .call(self, args)
                .await
                .map_err(|source| BuildError::Hook { hook: name, source })?;
        }

        tokio::task::yield_now().await;
        Ok(())
    }

    /// Call a hook that takes no payload.
    pub async fn call(&mut self, name: HookName) -> Result<()> {
        self.call_hook(name, &mut HookArgs::Context).await
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.insert(message.into());
    }

    pub fn find_entry(&self, path: &str) -> Option<&BuildManifestEntry> {
        self.build_entries.iter().find(|entry| entry.path == path)
    }
}

impl std::fmt::Debug for BuildContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildContext")
            .field("options", &self.options)
            .field("pkg", &self.pkg.name)
            .field("hooks", &self.hooks)
            .field("build_entries", &self.build_entries)
            .field("warnings", &self.warnings)
            .field("used_imports", &self.used_imports)
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::Path;

    use karium_config::{BuildOptions, ConfigLayer, PackageManifest, default_layer};

    use super::*;

    /// Context over default options rooted at `root`.
    pub fn context(root: &Path, pkg: PackageManifest) -> BuildContext {
        let options =
            BuildOptions::from_layer(root, default_layer(&pkg, false), &pkg).expect("options");
        BuildContext::new(options, pkg, Hooks::new())
    }

    pub fn context_with(root: &Path, layer: ConfigLayer) -> BuildContext {
        let pkg = PackageManifest::default();
        let merged = karium_config::merge_layers([layer, default_layer(&pkg, false)]);
        let mut options = BuildOptions::from_layer(root, merged, &pkg).expect("options");
        options.normalize_entries();
        BuildContext::new(options, pkg, Hooks::new())
    }
}
