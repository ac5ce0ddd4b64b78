//! Post-build package validation.
//!
//! Both checks only add warnings to the context; whether warnings fail the
//! build is decided by the caller.

use std::path::Path;
use std::sync::LazyLock;

use indexmap::IndexSet;
use karium_config::{PackageManifest, is_external, resolve_path};
use regex::Regex;
use serde_json::Value;

use crate::context::BuildContext;
use crate::output::relative_slash_path;

/// Prefix of bundler-generated shared chunks.
const CHUNK_PREFIX: &str = "chunks/";

static WILDCARD_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"/[^/]*\*.*$").ok());

/// Warn about imported packages the manifest does not declare.
pub fn validate_dependencies(ctx: &mut BuildContext) {
    if ctx.options.bundler_flag("inlineDependencies") {
        return;
    }

    let options = &ctx.options;
    let mut implicit: IndexSet<&str> = IndexSet::new();
    for id in &ctx.used_imports {
        if is_external(&options.externals, id) || id.starts_with(CHUNK_PREFIX) {
            continue;
        }
        let name = package_name(id);
        let declared = options
            .dependencies
            .iter()
            .chain(&options.peer_dependencies)
            .any(|dep| dep == name);
        if !declared {
            implicit.insert(id);
        }
    }

    if !implicit.is_empty() {
        let message = format!(
            "Potential implicit dependencies found: {}",
            implicit.into_iter().collect::<Vec<_>>().join(", ")
        );
        tracing::debug!("{}", message);
        ctx.warn(message);
    }
}

/// Package name of a module specifier: the first path segment, or the
/// first two for scoped packages.
pub fn package_name(id: &str) -> &str {
    let mut segments = id.match_indices('/').map(|(i, _)| i);
    let end = if id.starts_with('@') {
        segments.nth(1)
    } else {
        segments.next()
    };
    end.map_or(id, |end| &id[..end])
}

/// Warn about manifest-referenced files missing under `root`.
pub fn validate_package(pkg: &PackageManifest, root: &Path, ctx: &mut BuildContext) {
    let missing = missing_package_files(pkg, root);
    if !missing.is_empty() {
        ctx.warn(format!(
            "Potential missing package.json files: {}",
            missing.join(", ")
        ));
    }
}

/// Files referenced by `bin`, `main`, `module`, `types`, `typings` and
/// `exports` that do not exist, relative to `root`.
///
/// Wildcard targets are checked up to the directory holding the `*`.
pub fn missing_package_files(pkg: &PackageManifest, root: &Path) -> Vec<String> {
    let mut filenames: Vec<String> = Vec::new();

    match &pkg.bin {
        Some(Value::String(bin)) => filenames.push(bin.clone()),
        Some(Value::Object(bins)) => {
            filenames.extend(bins.values().filter_map(Value::as_str).map(str::to_string))
        }
        _ => {}
    }
    for field in [&pkg.main, &pkg.module, &pkg.types, &pkg.typings] {
        if let Some(Value::String(path)) = field {
            filenames.push(path.clone());
        }
    }
    if let Some(exports) = &pkg.exports {
        collect_export_files(exports, &mut filenames);
    }

    let mut missing: IndexSet<String> = IndexSet::new();
    for filename in filenames {
        let stripped = match WILDCARD_RE.as_ref() {
            Some(re) => re.replace(&filename, "").into_owned(),
            None => filename,
        };
        if stripped.contains('*') {
            continue;
        }
        let path = resolve_path(root, Path::new(&stripped));
        if !path.exists() {
            missing.insert(relative_slash_path(root, &path).unwrap_or(stripped));
        }
    }
    missing.into_iter().collect()
}

fn collect_export_files(exports: &Value, out: &mut Vec<String>) {
    match exports {
        Value::String(path) => out.push(path.clone()),
        Value::Array(items) => {
            for item in items {
                collect_export_files(item, out);
            }
        }
        Value::Object(conditions) => {
            for (key, value) in conditions {
                if key.ends_with(".json") {
                    continue;
                }
                collect_export_files(value, out);
            }
        }
        _ => {}
    }
}
