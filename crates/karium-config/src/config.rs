//! Raw configuration layers as they appear in config files, the package
//! manifest, presets and inline configuration.
//!
//! Every field is optional here; [`crate::BuildOptions`] is the resolved
//! form produced after all layers are merged.

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::entry::{BuilderKind, ModuleFormat};
use crate::error::{ConfigError, Result as ConfigResult};
use crate::external::External;
use crate::merge::Defaults;

/// One configuration layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigLayer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<PresetSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<EntrySpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clean: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declaration: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_dir: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stub: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub externals: Vec<External>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub alias: IndexMap<String, String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub replace: IndexMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_on_warn: Option<bool>,

    /// Bundler-specific options, passed through to the bundler untouched.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub bundler: Map<String, Value>,
}

impl ConfigLayer {
    /// Create from a loaded module value.
    ///
    /// `null` yields an empty layer so absent manifest fields need no
    /// special casing.
    pub fn from_value(value: Value) -> ConfigResult<Self> {
        if value.is_null() {
            return Ok(Self::default());
        }

        serde_json::from_value(value).map_err(|e| ConfigError::InvalidValue {
            field: "config".to_string(),
            message: e.to_string(),
        })
    }

    pub fn to_value(&self) -> ConfigResult<Value> {
        serde_json::to_value(self).map_err(|e| ConfigError::InvalidValue {
            field: "config".to_string(),
            message: e.to_string(),
        })
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl Defaults for ConfigLayer {
    fn with_defaults(self, lower: Self) -> Self {
        Self {
            preset: self.preset.with_defaults(lower.preset),
            name: self.name.with_defaults(lower.name),
            entries: self.entries.with_defaults(lower.entries),
            clean: self.clean.with_defaults(lower.clean),
            declaration: self.declaration.with_defaults(lower.declaration),
            out_dir: self.out_dir.with_defaults(lower.out_dir),
            stub: self.stub.with_defaults(lower.stub),
            externals: self.externals.with_defaults(lower.externals),
            alias: self.alias.with_defaults(lower.alias),
            replace: self.replace.with_defaults(lower.replace),
            fail_on_warn: self.fail_on_warn.with_defaults(lower.fail_on_warn),
            bundler: self.bundler.with_defaults(lower.bundler),
        }
    }
}

/// A preset reference inside a data layer: a name or an inline layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PresetSpec {
    Name(String),
    Inline(Box<ConfigLayer>),
}

/// An entry as written in configuration: `"src/index"` or an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntrySpec {
    Path(String),
    Object(EntryObject),
}

impl EntrySpec {
    /// Expand the string shorthand into an object with only `input` set.
    pub fn into_object(self) -> EntryObject {
        match self {
            EntrySpec::Path(input) => EntryObject {
                input: Some(input),
                ..EntryObject::default()
            },
            EntrySpec::Object(object) => object,
        }
    }
}

impl From<&str> for EntrySpec {
    fn from(input: &str) -> Self {
        EntrySpec::Path(input.to_string())
    }
}

impl From<EntryObject> for EntrySpec {
    fn from(object: EntryObject) -> Self {
        EntrySpec::Object(object)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub builder: Option<BuilderKind>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_dir: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declaration: Option<bool>,

    /// Typegen: default values the schema is resolved against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<Map<String, Value>>,

    /// Mirror: module format of the mirrored files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<ModuleFormat>,

    /// Mirror: extension for mirrored script files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<String>,

    /// Mirror: glob pattern(s) selecting files to mirror.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<Patterns>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Patterns {
    One(String),
    Many(Vec<String>),
}

impl Patterns {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Patterns::One(pattern) => vec![pattern],
            Patterns::Many(patterns) => patterns,
        }
    }
}
