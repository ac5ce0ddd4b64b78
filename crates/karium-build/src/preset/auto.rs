//! The `auto` preset: infer entries from the package manifest.

use std::path::Path;
use std::sync::LazyLock;

use karium_config::{EntryObject, ModuleFormat, PackageManifest};
use regex::Regex;
use serde_json::Value;
use walkdir::WalkDir;

use super::BuildConfig;
use crate::context::BuildContext;
use crate::hooks::{HookName, Hooks};

static OUTPUT_SLUG_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(\*[^/\\]*|\.d\.(m|c)?ts|\.\w+)$").ok());

static DTS_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\.d\.(m|c)?ts$").ok());

static SOURCE_EXT_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(\.d\.(m|c)?ts|\.\w+)$").ok());

/// A config whose only job is a `build:prepare` hook that fills in entries
/// when none are configured.
pub fn auto_preset() -> BuildConfig {
    let mut hooks = Hooks::new();
    hooks.on_fn(HookName::BuildPrepare, |ctx, _| prepare(ctx));
    BuildConfig {
        hooks,
        ..BuildConfig::default()
    }
}

fn prepare(ctx: &mut BuildContext) -> anyhow::Result<()> {
    if !ctx.options.entries.is_empty() {
        return Ok(());
    }

    let source_files = list_recursively(&ctx.options.root_dir.join("src"));
    let inferred = infer_entries(&ctx.pkg, &source_files, &ctx.options.root_dir);

    for warning in inferred.warnings {
        ctx.warn(warning);
    }
    if inferred.cjs {
        ctx.options.set_bundler_flag("emitCJS", true);
    }
    if inferred.dts {
        ctx.options.declaration = true;
    }
    for entry in inferred.entries {
        ctx.options.add_entry(entry)?;
    }

    if !ctx.options.entries.is_empty() {
        let names: Vec<String> = ctx
            .options
            .entries
            .iter()
            .map(|entry| {
                entry
                    .input
                    .strip_prefix(&ctx.options.root_dir)
                    .unwrap_or(&entry.input)
                    .display()
                    .to_string()
            })
            .collect();
        tracing::info!("Automatically detected entries: {}", names.join(", "));
    }
    Ok(())
}

/// What the manifest's output fields imply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InferredEntries {
    pub entries: Vec<EntryObject>,
    /// Some output is CommonJS.
    pub cjs: bool,
    /// Some output is a declaration file.
    pub dts: bool,
    pub warnings: Vec<String>,
}

struct Output {
    file: String,
    format: Option<ModuleFormat>,
}

/// Match the manifest's output files against `source_files`.
///
/// Source files are absolute paths with `/` separators; directories end
/// with `/`.
pub fn infer_entries(
    pkg: &PackageManifest,
    source_files: &[String],
    root_dir: &Path,
) -> InferredEntries {
    let mut source_files = source_files.to_vec();
    source_files.sort_by_key(|file| file.split('/').count());

    let mut outputs = Vec::new();
    if let Some(exports) = &pkg.exports {
        export_outputs(exports, &[], &mut outputs);
    }
    match &pkg.bin {
        Some(Value::String(bin)) => outputs.push(Output {
            file: bin.clone(),
            format: None,
        }),
        Some(Value::Object(bins)) => {
            outputs.extend(bins.values().filter_map(Value::as_str).map(|file| Output {
                file: file.to_string(),
                format: None,
            }))
        }
        _ => {}
    }
    if let Some(main) = pkg.main.as_ref().and_then(Value::as_str) {
        outputs.push(Output {
            file: main.to_string(),
            format: None,
        });
    }
    if let Some(module) = pkg.module.as_ref().and_then(Value::as_str) {
        outputs.push(Output {
            file: module.to_string(),
            format: Some(ModuleFormat::Esm),
        });
    }
    if let Some(types) = pkg
        .types
        .as_ref()
        .or(pkg.typings.as_ref())
        .and_then(Value::as_str)
    {
        outputs.push(Output {
            file: types.to_string(),
            format: None,
        });
    }

    let esm_package = pkg.module_type.as_deref() == Some("module");
    for output in outputs.iter_mut().filter(|output| output.format.is_none()) {
        let is_js = output.file.ends_with(".js");
        if (esm_package && is_js) || output.file.ends_with(".mjs") {
            output.format = Some(ModuleFormat::Esm);
        } else if (!esm_package && is_js) || output.file.ends_with(".cjs") {
            output.format = Some(ModuleFormat::Cjs);
        }
    }

    let mut inferred = InferredEntries::default();
    for output in outputs {
        let slug = strip(&OUTPUT_SLUG_RE, &output.file);
        let is_dir = slug.ends_with('/');
        if is_dir && (slug == "./" || slug == "/") {
            continue;
        }

        let input = entrypoint_paths(&slug)
            .iter()
            .find_map(|candidate| find_source(&source_files, candidate, is_dir));

        let Some(input) = input else {
            if !root_dir.join(&output.file).exists() {
                inferred
                    .warnings
                    .push(format!("Could not find entrypoint for `{}`", output.file));
            }
            continue;
        };

        if output.format == Some(ModuleFormat::Cjs) {
            inferred.cjs = true;
        }
        if DTS_RE.as_ref().is_some_and(|re| re.is_match(&output.file)) {
            inferred.dts = true;
        }

        let index = match inferred
            .entries
            .iter()
            .position(|entry| entry.input.as_deref() == Some(input.as_str()))
        {
            Some(index) => index,
            None => {
                inferred.entries.push(EntryObject {
                    input: Some(input),
                    ..EntryObject::default()
                });
                inferred.entries.len() - 1
            }
        };
        if is_dir {
            let entry = &mut inferred.entries[index];
            entry.out_dir = Some(slug.clone());
            entry.format = output.format;
        }
    }
    inferred
}

fn export_outputs(exports: &Value, conditions: &[&str], out: &mut Vec<Output>) {
    match exports {
        Value::String(file) => out.push(Output {
            file: file.clone(),
            format: Some(ModuleFormat::Esm),
        }),
        Value::Object(map) => {
            for (condition, value) in map {
                if condition.ends_with(".json") {
                    continue;
                }
                match value {
                    Value::String(file) => out.push(Output {
                        file: file.clone(),
                        format: Some(export_format(condition, conditions)),
                    }),
                    other => {
                        let mut nested = conditions.to_vec();
                        nested.push(condition);
                        export_outputs(other, &nested, out);
                    }
                }
            }
        }
        _ => {}
    }
}

/// `import` is ESM and `require` is CommonJS; anything else defers to the
/// enclosing conditions, outermost first, and defaults to ESM.
fn export_format(condition: &str, previous: &[&str]) -> ModuleFormat {
    match condition {
        "import" => ModuleFormat::Esm,
        "require" => ModuleFormat::Cjs,
        _ => match previous.split_first() {
            Some((next, rest)) => export_format(next, rest),
            None => ModuleFormat::Esm,
        },
    }
}

/// Every suffix of `path`'s segments, longest first.
fn entrypoint_paths(path: &str) -> Vec<String> {
    let normalized = path.trim_start_matches("./");
    let segments: Vec<&str> = normalized.split('/').collect();
    (0..segments.len())
        .map(|index| segments[index..].join("/"))
        .filter(|candidate| !candidate.is_empty())
        .collect()
}

fn find_source(source_files: &[String], candidate: &str, is_dir: bool) -> Option<String> {
    source_files
        .iter()
        .find(|file| {
            let stem = if is_dir {
                file.as_str()
            } else {
                match file.rfind('.') {
                    Some(dot) if is_word(&file[dot + 1..]) => &file[..dot],
                    _ => return false,
                }
            };
            stem.strip_suffix(candidate)
                .is_some_and(|prefix| prefix.is_empty() || prefix.ends_with('/'))
        })
        .map(|file| strip(&SOURCE_EXT_RE, file))
}

fn is_word(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_')
}

fn strip(re: &LazyLock<Option<Regex>>, s: &str) -> String {
    match re.as_ref() {
        Some(re) => re.replace(s, "").into_owned(),
        None => s.to_string(),
    }
}

/// Files and directories (with a trailing `/`) under `dir`.
fn list_recursively(dir: &Path) -> Vec<String> {
    WalkDir::new(dir)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .map(|entry| {
            let path = slash_path(entry.path());
            if entry.file_type().is_dir() {
                format!("{}/", path)
            } else {
                path
            }
        })
        .collect()
}

fn slash_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn manifest(value: Value) -> PackageManifest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn patterns_compile() {
        assert!(OUTPUT_SLUG_RE.is_some());
        assert!(DTS_RE.is_some());
        assert!(SOURCE_EXT_RE.is_some());
    }

    fn sources(files: &[&str]) -> Vec<String> {
        files.iter().map(|f| format!("/p/src/{}", f)).collect()
    }

    fn inputs(inferred: &InferredEntries) -> Vec<&str> {
        inferred
            .entries
            .iter()
            .filter_map(|entry| entry.input.as_deref())
            .collect()
    }

    #[test]
    fn infers_from_exports_and_declarations() {
        let pkg = manifest(json!({
            "exports": {
                ".": { "import": "./dist/index.mjs", "require": "./dist/index.cjs" }
            },
            "types": "./dist/index.d.ts"
        }));
        let inferred = infer_entries(&pkg, &sources(&["index.ts", "utils.ts"]), Path::new("/p"));

        assert_eq!(inputs(&inferred), vec!["/p/src/index"]);
        assert!(inferred.cjs);
        assert!(inferred.dts);
        assert!(inferred.warnings.is_empty());
    }

    #[test]
    fn bins_and_nested_sources() {
        let pkg = manifest(json!({
            "type": "module",
            "main": "./dist/index.js",
            "bin": { "tool": "./dist/cli/run.js" }
        }));
        let inferred = infer_entries(
            &pkg,
            &sources(&["index.ts", "cli/", "cli/run.ts"]),
            Path::new("/p"),
        );

        assert_eq!(inputs(&inferred), vec!["/p/src/cli/run", "/p/src/index"]);
        assert!(!inferred.cjs);
    }

    #[test]
    fn directory_exports_become_mirror_entries() {
        let pkg = manifest(json!({
            "exports": { "./runtime/*": "./dist/runtime/*" }
        }));
        let inferred = infer_entries(
            &pkg,
            &sources(&["runtime/", "runtime/index.ts"]),
            Path::new("/p"),
        );

        assert_eq!(inputs(&inferred), vec!["/p/src/runtime/"]);
        assert_eq!(inferred.entries[0].out_dir.as_deref(), Some("./dist/runtime/"));
        assert_eq!(inferred.entries[0].format, Some(ModuleFormat::Esm));
    }

    #[test]
    fn missing_sources_warn() {
        let pkg = manifest(json!({ "main": "./dist/missing.cjs" }));
        let inferred = infer_entries(&pkg, &sources(&["index.ts"]), Path::new("/nonexistent"));

        assert!(inferred.entries.is_empty());
        assert_eq!(
            inferred.warnings,
            vec!["Could not find entrypoint for `./dist/missing.cjs`"]
        );
    }

    #[test]
    fn export_conditions_defer_outward() {
        assert_eq!(export_format("node", &["require"]), ModuleFormat::Cjs);
        assert_eq!(export_format("default", &[]), ModuleFormat::Esm);
        assert_eq!(
            entrypoint_paths("./dist/cli/run"),
            vec!["dist/cli/run", "cli/run", "run"]
        );
    }
}
