//! The package manifest (`package.json`).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::ConfigLayer;
use crate::error::Result as ConfigResult;

/// Fields of `package.json` the build reads. Everything else is kept in
/// `extra` untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub module_type: Option<String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub dependencies: IndexMap<String, Value>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub peer_dependencies: IndexMap<String, Value>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub dev_dependencies: IndexMap<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub types: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typings: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bin: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exports: Option<Value>,

    /// Inline build configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buildkarium: Option<Value>,

    /// Legacy key for the inline build configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PackageManifest {
    /// The inline build configuration, `buildkarium` taking priority over
    /// `build`. The two are never merged.
    pub fn config_field(&self) -> Option<&Value> {
        self.buildkarium
            .as_ref()
            .filter(|value| !value.is_null())
            .or(self.build.as_ref().filter(|value| !value.is_null()))
    }

    /// The inline build configuration as a layer.
    pub fn config_layer(&self) -> ConfigResult<ConfigLayer> {
        match self.config_field() {
            Some(value) => ConfigLayer::from_value(value.clone()),
            None => Ok(ConfigLayer::default()),
        }
    }

    /// Last `/` segment of the package name.
    pub fn short_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .and_then(|name| name.rsplit('/').next())
            .filter(|name| !name.is_empty())
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }

    pub fn dependency_names(&self) -> Vec<String> {
        self.dependencies.keys().cloned().collect()
    }

    pub fn peer_dependency_names(&self) -> Vec<String> {
        self.peer_dependencies.keys().cloned().collect()
    }

    pub fn dev_dependency_names(&self) -> Vec<String> {
        self.dev_dependencies.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_known_fields_and_keeps_the_rest() {
        let manifest: PackageManifest = serde_json::from_value(json!({
            "name": "@scope/widget",
            "type": "module",
            "version": "1.2.3",
            "dependencies": { "react": "^18.0.0" },
            "exports": { ".": "./dist/index.mjs" },
            "bin": "./dist/cli.mjs"
        }))
        .unwrap();

        assert_eq!(manifest.short_name(), Some("widget"));
        assert_eq!(manifest.module_type.as_deref(), Some("module"));
        assert_eq!(manifest.dependency_names(), vec!["react"]);
        assert_eq!(manifest.extra["version"], json!("1.2.3"));
        assert_eq!(manifest.bin, Some(json!("./dist/cli.mjs")));
    }

    #[test]
    fn prefers_buildkarium_over_build() {
        let manifest: PackageManifest = serde_json::from_value(json!({
            "buildkarium": { "declaration": true },
            "build": { "declaration": false, "clean": false }
        }))
        .unwrap();

        let layer = manifest.config_layer().unwrap();
        assert_eq!(layer.declaration, Some(true));
        assert_eq!(layer.clean, None);
    }

    #[test]
    fn falls_back_to_build_field() {
        let manifest: PackageManifest =
            serde_json::from_value(json!({ "build": { "outDir": "lib" } })).unwrap();
        assert_eq!(
            manifest.config_layer().unwrap().out_dir,
            Some("lib".into())
        );
    }
}
