//! A bundler that emits each entry's source as-is.

use std::sync::LazyLock;

use anyhow::Context;
use async_trait::async_trait;
use regex::Regex;

use super::{BundleOutput, Bundler, BundlerOptions, OutputChunk, resolve_source};
use crate::context::ModuleSize;

static IMPORT_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"\b(?:from|import|require)\s*\(?\s*["']([^"']+)["']"#).ok()
});

static EXPORT_DECL_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"\bexport\s+(?:declare\s+)?(?:async\s+)?(?:function\s*\*?|class|const|let|var|enum)\s*([A-Za-z_$][\w$]*)",
    )
    .ok()
});

static EXPORT_LIST_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\bexport\s*(?:type\s*)?\{([^}]*)\}").ok());

static EXPORT_DEFAULT_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\bexport\s+default\b").ok());

/// Writes `<stem>.mjs` with the resolved source of every input and
/// `<stem>.d.ts` re-exports for declarations.
///
/// Only `replace` is applied to the code; imports are not followed, so
/// every entry is a single chunk. Bare specifiers found in the source are
/// reported as the chunk's imports.
#[derive(Debug, Clone, Default)]
pub struct CopyBundler;

impl CopyBundler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Bundler for CopyBundler {
    async fn bundle(&self, options: &BundlerOptions) -> anyhow::Result<BundleOutput> {
        let mut chunks = Vec::new();

        for (stem, input) in &options.inputs {
            let source = resolve_source(input)
                .with_context(|| format!("Could not resolve entry module {}", input.display()))?;
            let mut code = tokio::fs::read_to_string(&source)
                .await
                .with_context(|| format!("Failed to read {}", source.display()))?;

            for (find, replacement) in &options.replace {
                code = code.replace(find.as_str(), replacement);
            }

            let (imports, exports) = scan_module(&code);
            let bytes = code.len() as u64;
            chunks.push(OutputChunk {
                file_name: format!("{}.mjs", stem),
                code,
                is_entry: true,
                imports,
                exports,
                modules: vec![ModuleSize {
                    id: source.to_string_lossy().into_owned(),
                    bytes,
                }],
            });
        }

        Ok(BundleOutput { chunks })
    }

    async fn bundle_declarations(&self, options: &BundlerOptions) -> anyhow::Result<BundleOutput> {
        let chunks = options
            .inputs
            .iter()
            .map(|(stem, input)| {
                let source = resolve_source(input).unwrap_or_else(|| input.clone());
                let specifier = source.with_extension("");
                OutputChunk {
                    file_name: format!("{}.d.ts", stem),
                    code: format!(
                        "export * from \"{}\";\n",
                        specifier.to_string_lossy().replace('\\', "/")
                    ),
                    is_entry: true,
                    ..OutputChunk::default()
                }
            })
            .collect();

        Ok(BundleOutput { chunks })
    }
}

/// Bare import specifiers and exported names in `code`, in source order.
pub fn scan_module(code: &str) -> (Vec<String>, Vec<String>) {
    let mut imports: Vec<String> = Vec::new();
    if let Some(re) = IMPORT_RE.as_ref() {
        for captures in re.captures_iter(code) {
            let id = &captures[1];
            if is_bare_specifier(id) && !imports.iter().any(|i| i == id) {
                imports.push(id.to_string());
            }
        }
    }

    let mut exports: Vec<String> = Vec::new();
    let mut add_export = |name: &str| {
        if !name.is_empty() && !exports.iter().any(|e| e == name) {
            exports.push(name.to_string());
        }
    };

    if let Some(re) = EXPORT_DECL_RE.as_ref() {
        for captures in re.captures_iter(code) {
            add_export(&captures[1]);
        }
    }
    if let Some(re) = EXPORT_LIST_RE.as_ref() {
        for captures in re.captures_iter(code) {
            for item in captures[1].split(',') {
                let item = item.trim();
                if item.starts_with("type ") {
                    continue;
                }
                let name = item.rsplit(" as ").next().unwrap_or(item).trim();
                add_export(name);
            }
        }
    }
    if EXPORT_DEFAULT_RE.as_ref().is_some_and(|re| re.is_match(code)) {
        add_export("default");
    }

    exports.sort();
    (imports, exports)
}

fn is_bare_specifier(id: &str) -> bool {
    !(id.is_empty() || id.starts_with('.') || id.starts_with('/') || id.contains("://"))
}
