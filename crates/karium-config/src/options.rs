//! Resolved build options.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::builtins::builtin_externals;
use crate::config::{ConfigLayer, EntrySpec};
use crate::entry::{BuildEntry, BuilderKind, resolve_path};
use crate::error::Result as ConfigResult;
use crate::external::External;
use crate::manifest::PackageManifest;

/// Fully merged configuration for one build invocation.
///
/// `out_dir` and every entry's `input`/`out_dir` are absolute.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildOptions {
    pub name: String,
    pub root_dir: PathBuf,
    pub entries: Vec<BuildEntry>,
    pub clean: bool,
    pub declaration: bool,
    pub out_dir: PathBuf,
    pub stub: bool,
    pub externals: Vec<External>,
    pub dependencies: Vec<String>,
    pub peer_dependencies: Vec<String>,
    pub dev_dependencies: Vec<String>,
    pub alias: IndexMap<String, String>,
    pub replace: IndexMap<String, String>,
    pub fail_on_warn: bool,
    /// Opaque bundler options.
    pub bundler: Map<String, Value>,
}

/// The lowest-precedence layer: values used when nothing else sets them.
pub fn default_layer(pkg: &PackageManifest, stub: bool) -> ConfigLayer {
    ConfigLayer {
        name: Some(pkg.short_name().unwrap_or("default").to_string()),
        clean: Some(true),
        declaration: Some(false),
        out_dir: Some(PathBuf::from("dist")),
        stub: Some(stub),
        externals: builtin_externals().map(External::Literal).collect(),
        fail_on_warn: Some(true),
        bundler: default_bundler_options(),
        ..ConfigLayer::default()
    }
}

fn default_bundler_options() -> Map<String, Value> {
    let value = json!({
        "emitCJS": false,
        "cjsBridge": false,
        "inlineDependencies": false,
        "replace": { "preventAssignment": true },
        "alias": {},
        "resolve": { "preferBuiltins": true },
        "json": { "preferConst": true },
        "commonjs": { "ignoreTryCatch": true },
        "esbuild": { "target": "es2020" },
        "dts": {
            "compilerOptions": { "preserveSymlinks": false },
            "respectExternal": true
        }
    });

    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

impl BuildOptions {
    /// Apply the post-merge fix-ups to a merged layer.
    ///
    /// Entries are normalized here except for declaration propagation,
    /// which happens in [`BuildOptions::normalize_entries`] once prepare
    /// hooks had their say.
    pub fn from_layer(
        root_dir: &Path,
        layer: ConfigLayer,
        pkg: &PackageManifest,
    ) -> ConfigResult<Self> {
        let out_dir = resolve_path(
            root_dir,
            &layer.out_dir.unwrap_or_else(|| PathBuf::from("dist")),
        );

        let entries = layer
            .entries
            .into_iter()
            .map(|spec| BuildEntry::from_spec(spec, root_dir, &out_dir, None))
            .collect::<ConfigResult<Vec<_>>>()?;

        let mut options = Self {
            name: layer.name.unwrap_or_else(|| "default".to_string()),
            root_dir: root_dir.to_path_buf(),
            entries,
            clean: layer.clean.unwrap_or(true),
            declaration: layer.declaration.unwrap_or(false),
            out_dir,
            stub: layer.stub.unwrap_or(false),
            externals: layer.externals,
            dependencies: Vec::new(),
            peer_dependencies: Vec::new(),
            dev_dependencies: Vec::new(),
            alias: layer.alias,
            replace: layer.replace,
            fail_on_warn: layer.fail_on_warn.unwrap_or(true),
            bundler: layer.bundler,
        };
        options.apply_manifest_dependencies(pkg);

        Ok(options)
    }

    /// Read dependency names from the manifest and mark runtime and peer
    /// dependencies as externals.
    pub fn apply_manifest_dependencies(&mut self, pkg: &PackageManifest) {
        self.dependencies = pkg.dependency_names();
        self.peer_dependencies = pkg.peer_dependency_names();
        self.dev_dependencies = pkg.dev_dependency_names();

        for name in self.dependencies.iter().chain(&self.peer_dependencies) {
            let external = External::literal(name.as_str());
            if !self.externals.contains(&external) {
                self.externals.push(external);
            }
        }
    }

    /// Normalize an entry against these options and append it.
    pub fn add_entry(&mut self, spec: impl Into<EntrySpec>) -> ConfigResult<()> {
        let entry = BuildEntry::from_spec(
            spec.into(),
            &self.root_dir,
            &self.out_dir,
            Some(self.declaration),
        )?;
        self.entries.push(entry);
        Ok(())
    }

    /// Re-run path resolution, `outDir` inheritance and declaration
    /// propagation over every entry.
    pub fn normalize_entries(&mut self) {
        self.out_dir = resolve_path(&self.root_dir, &self.out_dir);
        let declaration = Some(self.declaration);
        for entry in &mut self.entries {
            entry.normalize(&self.root_dir, &self.out_dir, declaration);
        }
    }

    /// Clones of the entries dispatched to `kind`, in declaration order.
    pub fn entries_for(&self, kind: BuilderKind) -> Vec<BuildEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.builder() == kind)
            .cloned()
            .collect()
    }

    /// A boolean flag from the bundler block; absent or non-boolean is false.
    pub fn bundler_flag(&self, key: &str) -> bool {
        self.bundler
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn set_bundler_flag(&mut self, key: &str, value: bool) {
        self.bundler.insert(key.to_string(), Value::Bool(value));
    }
}
