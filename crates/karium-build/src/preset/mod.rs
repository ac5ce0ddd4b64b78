//! Build configs and preset resolution.
//!
//! A [`BuildConfig`] is a data layer plus the hooks that come with it.
//! Config files and the manifest only ever produce data; embedding callers
//! build configs with hooks in code.

mod auto;

use std::fmt;
use std::sync::Arc;

use karium_config::{ConfigDiscovery, ConfigLayer, PackageManifest, PresetSpec};
use serde_json::Value;

use crate::error::Result;
use crate::hooks::Hooks;

pub use auto::{InferredEntries, auto_preset, infer_entries};

/// Name of the built-in preset used when nothing selects one.
pub const AUTO_PRESET: &str = "auto";

/// A configuration layer with hooks.
#[derive(Debug, Clone, Default)]
pub struct BuildConfig {
    pub layer: ConfigLayer,
    /// Only honored for inline configs; a preset's own preset is ignored.
    pub preset: Option<Preset>,
    pub hooks: Hooks,
}

impl BuildConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_layer(layer: ConfigLayer) -> Self {
        Self {
            layer,
            ..Self::default()
        }
    }

    pub fn with_preset(mut self, preset: impl Into<Preset>) -> Self {
        self.preset = Some(preset.into());
        self
    }

    pub fn with_hooks(mut self, hooks: Hooks) -> Self {
        self.hooks.extend(hooks);
        self
    }
}

pub type PresetFactory = Arc<dyn Fn() -> BuildConfig + Send + Sync>;

/// Where a preset's configuration comes from.
#[derive(Clone)]
pub enum Preset {
    /// The built-in entry-inferring preset.
    Auto,
    /// A built-in preset name, or a module path relative to the root.
    Named(String),
    Layer(ConfigLayer),
    Config(Box<BuildConfig>),
    /// Invoked with no arguments to produce the config.
    Factory(PresetFactory),
}

impl Preset {
    pub fn factory<F>(f: F) -> Self
    where
        F: Fn() -> BuildConfig + Send + Sync + 'static,
    {
        Self::Factory(Arc::new(f))
    }

    /// Turn the preset into a config, loading named presets through the
    /// discovery's module loader.
    ///
    /// A named preset that does not exist resolves to an empty config.
    pub fn resolve(self, discovery: &ConfigDiscovery) -> Result<BuildConfig> {
        let config = match self {
            Preset::Auto => auto_preset(),
            Preset::Named(name) if name == AUTO_PRESET => auto_preset(),
            Preset::Named(name) => match discovery.load_optional(&name)? {
                Some(layer) => BuildConfig::from_layer(layer),
                None => {
                    tracing::debug!("Preset '{}' not found, using an empty preset", name);
                    BuildConfig::default()
                }
            },
            Preset::Layer(layer) => BuildConfig::from_layer(layer),
            Preset::Config(config) => *config,
            Preset::Factory(factory) => factory(),
        };
        Ok(config)
    }
}

impl From<PresetSpec> for Preset {
    fn from(spec: PresetSpec) -> Self {
        match spec {
            PresetSpec::Name(name) => Preset::Named(name),
            PresetSpec::Inline(layer) => Preset::Layer(*layer),
        }
    }
}

impl From<&str> for Preset {
    fn from(name: &str) -> Self {
        Preset::Named(name.to_string())
    }
}

impl From<ConfigLayer> for Preset {
    fn from(layer: ConfigLayer) -> Self {
        Preset::Layer(layer)
    }
}

impl From<BuildConfig> for Preset {
    fn from(config: BuildConfig) -> Self {
        Preset::Config(Box::new(config))
    }
}

impl fmt::Debug for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Preset::Auto => f.write_str("Auto"),
            Preset::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Preset::Layer(layer) => f.debug_tuple("Layer").field(layer).finish(),
            Preset::Config(config) => f.debug_tuple("Config").field(config).finish(),
            Preset::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// Pick the preset for a build.
///
/// The build config file wins, then the manifest's `buildkarium` and
/// `build` fields (in that order, each checked on its own), then the inline
/// config (its typed preset before the one in its layer), then `auto`.
pub fn select_preset(file: &ConfigLayer, pkg: &PackageManifest, inline: &BuildConfig) -> Preset {
    if let Some(spec) = &file.preset {
        return spec.clone().into();
    }

    let manifest_preset = [&pkg.buildkarium, &pkg.build]
        .into_iter()
        .flatten()
        .find_map(|field| preset_spec(field));
    if let Some(spec) = manifest_preset {
        return spec.into();
    }

    inline
        .preset
        .clone()
        .or_else(|| inline.layer.preset.clone().map(Preset::from))
        .unwrap_or(Preset::Auto)
}

fn preset_spec(field: &Value) -> Option<PresetSpec> {
    let preset = field.get("preset").filter(|v| !v.is_null())?;
    serde_json::from_value(preset.clone()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::HookName;
    use serde_json::json;
    use tempfile::TempDir;

    fn manifest(value: Value) -> PackageManifest {
        serde_json::from_value(value).unwrap()
    }

    fn label(preset: &Preset) -> String {
        match preset {
            Preset::Named(name) => name.clone(),
            other => format!("{:?}", other),
        }
    }

    #[test]
    fn file_preset_wins() {
        let file = ConfigLayer::from_value(json!({ "preset": "./file-preset" })).unwrap();
        let pkg = manifest(json!({ "buildkarium": { "preset": "./pkg-preset" } }));
        let inline = BuildConfig::new().with_preset("./inline-preset");

        assert_eq!(label(&select_preset(&file, &pkg, &inline)), "./file-preset");
    }

    #[test]
    fn manifest_fields_are_checked_in_order() {
        let inline = BuildConfig::new().with_preset("./inline-preset");
        let empty = ConfigLayer::default();

        let pkg = manifest(json!({
            "buildkarium": { "declaration": true },
            "build": { "preset": "./legacy-preset" }
        }));
        assert_eq!(label(&select_preset(&empty, &pkg, &inline)), "./legacy-preset");

        let pkg = manifest(json!({
            "buildkarium": { "preset": "./pkg-preset" },
            "build": { "preset": "./legacy-preset" }
        }));
        assert_eq!(label(&select_preset(&empty, &pkg, &inline)), "./pkg-preset");
    }

    #[test]
    fn inline_then_auto() {
        let empty = ConfigLayer::default();
        let pkg = PackageManifest::default();

        let inline = BuildConfig::new().with_preset("./inline-preset");
        assert_eq!(label(&select_preset(&empty, &pkg, &inline)), "./inline-preset");
        assert!(matches!(
            select_preset(&empty, &pkg, &BuildConfig::new()),
            Preset::Auto
        ));
    }

    #[test]
    fn inline_layer_preset_is_honored() {
        let empty = ConfigLayer::default();
        let pkg = PackageManifest::default();

        let inline =
            BuildConfig::from_layer(ConfigLayer::from_value(json!({ "preset": "./my.preset" })).unwrap());
        assert_eq!(label(&select_preset(&empty, &pkg, &inline)), "./my.preset");

        let typed = inline.with_preset("./typed.preset");
        assert_eq!(label(&select_preset(&empty, &pkg, &typed)), "./typed.preset");
    }

    #[test]
    fn named_presets_load_from_root() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("karium.preset.toml"),
            "declaration = true\n[bundler]\ncjsBridge = true\n",
        )
        .unwrap();
        let discovery = ConfigDiscovery::new(dir.path());

        let config = Preset::from("./karium.preset").resolve(&discovery).unwrap();
        assert_eq!(config.layer.declaration, Some(true));
        assert_eq!(config.layer.bundler["cjsBridge"], json!(true));

        let missing = Preset::from("./nope").resolve(&discovery).unwrap();
        assert!(missing.layer.is_empty());
        assert!(missing.hooks.is_empty());
    }

    #[test]
    fn auto_and_factories_resolve() {
        let dir = TempDir::new().unwrap();
        let discovery = ConfigDiscovery::new(dir.path());

        let auto = Preset::from(AUTO_PRESET).resolve(&discovery).unwrap();
        assert_eq!(auto.hooks.len_for(HookName::BuildPrepare), 1);

        let factory = Preset::factory(|| {
            BuildConfig::from_layer(ConfigLayer {
                clean: Some(false),
                ..ConfigLayer::default()
            })
        });
        let config = factory.resolve(&discovery).unwrap();
        assert_eq!(config.layer.clean, Some(false));
    }
}
