//! Normalized build entries.

use std::fmt;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};

use path_clean::PathClean;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::{EntryObject, EntrySpec};
use crate::error::{ConfigError, Result as ConfigResult};

/// The output strategy an entry is dispatched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuilderKind {
    /// Schema, docs and declaration generation
    Typegen,
    /// Directory-preserving file-by-file transform
    Mirror,
    /// Module bundling
    Bundle,
}

impl BuilderKind {
    /// Cross-kind execution order.
    pub const ORDER: [BuilderKind; 3] = [BuilderKind::Typegen, BuilderKind::Mirror, BuilderKind::Bundle];

    pub fn as_str(&self) -> &'static str {
        match self {
            BuilderKind::Typegen => "typegen",
            BuilderKind::Mirror => "mirror",
            BuilderKind::Bundle => "bundle",
        }
    }
}

impl fmt::Display for BuilderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Module format for mirrored files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleFormat {
    Esm,
    Cjs,
}

/// Kind-specific entry settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "builder", rename_all = "lowercase")]
pub enum EntryKind {
    Typegen {
        defaults: Map<String, Value>,
    },
    Mirror {
        #[serde(skip_serializing_if = "Option::is_none")]
        format: Option<ModuleFormat>,
        #[serde(skip_serializing_if = "Option::is_none")]
        ext: Option<String>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        pattern: Vec<String>,
    },
    Bundle,
}

impl EntryKind {
    pub fn builder(&self) -> BuilderKind {
        match self {
            EntryKind::Typegen { .. } => BuilderKind::Typegen,
            EntryKind::Mirror { .. } => BuilderKind::Mirror,
            EntryKind::Bundle => BuilderKind::Bundle,
        }
    }
}

/// One unit of work. `input` and `out_dir` are absolute once normalized.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildEntry {
    pub input: PathBuf,
    pub name: String,
    pub out_dir: PathBuf,
    /// The entry's own `outDir` as configured. `None` follows the
    /// top-level `outDir` each time the entry is normalized.
    #[serde(skip)]
    pub own_out_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declaration: Option<bool>,
    #[serde(flatten)]
    pub kind: EntryKind,
}

impl BuildEntry {
    /// Normalize a configured entry.
    ///
    /// Fails with [`ConfigError::MissingEntryInput`] when the entry has no
    /// input. Without an explicit builder, an input ending in a path
    /// separator is mirrored and anything else is bundled.
    pub fn from_spec(
        spec: EntrySpec,
        root_dir: &Path,
        default_out_dir: &Path,
        default_declaration: Option<bool>,
    ) -> ConfigResult<Self> {
        let object = spec.into_object();
        let input = match object.input.as_deref() {
            Some(input) if !input.is_empty() => input.to_string(),
            _ => return Err(missing_input(&object)),
        };

        let name = object
            .name
            .clone()
            .unwrap_or_else(|| default_name(&input));

        let builder = object.builder.unwrap_or_else(|| {
            if input.ends_with('/') || input.ends_with(MAIN_SEPARATOR) {
                BuilderKind::Mirror
            } else {
                BuilderKind::Bundle
            }
        });

        let kind = match builder {
            BuilderKind::Typegen => EntryKind::Typegen {
                defaults: object.defaults.unwrap_or_default(),
            },
            BuilderKind::Mirror => EntryKind::Mirror {
                format: object.format,
                ext: object.ext,
                pattern: object.pattern.map(|p| p.into_vec()).unwrap_or_default(),
            },
            BuilderKind::Bundle => EntryKind::Bundle,
        };

        let own_out_dir = object.out_dir.map(PathBuf::from);
        let out_dir = resolve_path(root_dir, own_out_dir.as_deref().unwrap_or(default_out_dir));

        Ok(Self {
            input: resolve_path(root_dir, Path::new(&input)),
            name,
            out_dir,
            own_out_dir,
            declaration: object.declaration.or(default_declaration),
            kind,
        })
    }

    /// Re-apply path resolution and the top-level defaults.
    ///
    /// Idempotent; used after hooks had the chance to add or edit entries.
    /// Entries without an `outDir` of their own move to `default_out_dir`.
    pub fn normalize(
        &mut self,
        root_dir: &Path,
        default_out_dir: &Path,
        default_declaration: Option<bool>,
    ) {
        self.input = resolve_path(root_dir, &self.input);
        self.out_dir = resolve_path(root_dir, self.own_out_dir.as_deref().unwrap_or(default_out_dir));
        if self.declaration.is_none() {
            self.declaration = default_declaration;
        }
    }

    pub fn builder(&self) -> BuilderKind {
        self.kind.builder()
    }

    pub fn wants_declaration(&self) -> bool {
        self.declaration.unwrap_or(false)
    }

    /// Single-line JSON rendering for logs and error messages.
    pub fn dump(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{:?}", self))
    }
}

fn missing_input(object: &EntryObject) -> ConfigError {
    ConfigError::MissingEntryInput {
        entry: serde_json::to_string(object).unwrap_or_else(|_| format!("{:?}", object)),
    }
}

fn default_name(input: &str) -> String {
    Path::new(input)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.to_string())
}

/// Resolve `path` against `root` and clean `.`/`..` components.
pub fn resolve_path(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf().clean()
    } else {
        root.join(path).clean()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalize(spec: EntrySpec) -> ConfigResult<BuildEntry> {
        BuildEntry::from_spec(spec, Path::new("/project"), Path::new("/project/dist"), None)
    }

    #[test]
    fn shorthand_becomes_bundle_entry() {
        let entry = normalize("src/index".into()).unwrap();
        assert_eq!(entry.input, PathBuf::from("/project/src/index"));
        assert_eq!(entry.name, "index");
        assert_eq!(entry.out_dir, PathBuf::from("/project/dist"));
        assert_eq!(entry.builder(), BuilderKind::Bundle);
    }

    #[test]
    fn trailing_separator_selects_mirror() {
        let entry = normalize("src/runtime/".into()).unwrap();
        assert_eq!(entry.builder(), BuilderKind::Mirror);
        assert_eq!(entry.name, "runtime");
        assert_eq!(entry.input, PathBuf::from("/project/src/runtime"));
    }

    #[test]
    fn explicit_builder_wins_over_inference() {
        let entry = normalize(EntrySpec::Object(EntryObject {
            input: Some("src/schema/".into()),
            builder: Some(BuilderKind::Typegen),
            defaults: Some(json!({ "port": 3000 }).as_object().unwrap().clone()),
            ..Default::default()
        }))
        .unwrap();

        let EntryKind::Typegen { defaults } = &entry.kind else {
            panic!("expected typegen entry");
        };
        assert_eq!(defaults["port"], json!(3000));
    }

    #[test]
    fn missing_input_is_fatal() {
        let err = normalize(EntrySpec::Object(EntryObject {
            name: Some("orphan".into()),
            ..Default::default()
        }))
        .unwrap_err();

        match err {
            ConfigError::MissingEntryInput { entry } => assert!(entry.contains("orphan")),
            other => panic!("unexpected error: {other}"),
        }
        assert!(normalize(EntrySpec::Path(String::new())).is_err());
    }

    #[test]
    fn declaration_defaults_only_fill_unset_entries() {
        let root = Path::new("/project");
        let dist = Path::new("/project/dist");
        let inherited = BuildEntry::from_spec("src/a".into(), root, dist, Some(true)).unwrap();
        assert_eq!(inherited.declaration, Some(true));

        let explicit = BuildEntry::from_spec(
            EntrySpec::Object(EntryObject {
                input: Some("src/b".into()),
                declaration: Some(false),
                ..Default::default()
            }),
            root,
            dist,
            Some(true),
        )
        .unwrap();
        assert_eq!(explicit.declaration, Some(false));
    }

    #[test]
    fn normalize_is_idempotent() {
        let mut entry = BuildEntry::from_spec(
            EntrySpec::Object(EntryObject {
                input: Some("./src/../src/index".into()),
                out_dir: Some("out".into()),
                ..Default::default()
            }),
            Path::new("/project"),
            Path::new("/project/dist"),
            None,
        )
        .unwrap();
        let before = entry.clone();
        entry.normalize(Path::new("/project"), Path::new("/project/dist"), None);
        assert_eq!(entry, before);
        assert_eq!(entry.input, PathBuf::from("/project/src/index"));
        assert_eq!(entry.out_dir, PathBuf::from("/project/out"));
    }

    #[test]
    fn entries_without_out_dir_follow_the_default() {
        let mut inherited = normalize("src/index".into()).unwrap();
        let mut pinned = normalize(EntrySpec::Object(EntryObject {
            input: Some("src/cli".into()),
            out_dir: Some("bin".into()),
            ..Default::default()
        }))
        .unwrap();

        inherited.normalize(Path::new("/project"), Path::new("/project/lib"), None);
        pinned.normalize(Path::new("/project"), Path::new("/project/lib"), None);

        assert_eq!(inherited.out_dir, PathBuf::from("/project/lib"));
        assert_eq!(pinned.out_dir, PathBuf::from("/project/bin"));
    }
}
