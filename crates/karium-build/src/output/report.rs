//! Build manifest aggregation and the size report.

use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

use crate::context::{BuildContext, BuildManifestEntry, ModuleSize};
use crate::error::{BuildError, Result};
use crate::output::writer::relative_slash_path;

/// Reconcile the manifest with what is actually in `out_dir`.
///
/// Files no builder recorded are added as chunks, and every entry whose
/// file exists gets its `bytes` measured if it has none yet.
pub fn aggregate(ctx: &mut BuildContext) -> Result<()> {
    let out_dir = ctx.options.out_dir.clone();
    if !out_dir.exists() {
        return Ok(());
    }

    for item in WalkDir::new(&out_dir).sort_by_file_name() {
        let item = item.map_err(|e| {
            let message = format!("Failed to scan '{}'", out_dir.display());
            match e.into_io_error() {
                Some(source) => BuildError::io(message, source),
                None => BuildError::InvalidOutputPath(message),
            }
        })?;
        if !item.file_type().is_file() {
            continue;
        }

        let Some(path) = relative_slash_path(&out_dir, item.path()) else {
            continue;
        };

        let index = match ctx.build_entries.iter().position(|e| e.path == path) {
            Some(index) => index,
            None => {
                ctx.build_entries.push(BuildManifestEntry::chunk(path));
                ctx.build_entries.len() - 1
            }
        };

        let entry = &mut ctx.build_entries[index];
        if entry.bytes.is_none() {
            let metadata = item.metadata().map_err(|e| {
                BuildError::InvalidOutputPath(format!(
                    "Failed to stat '{}': {}",
                    item.path().display(),
                    e
                ))
            })?;
            entry.bytes = Some(metadata.len());
        }
    }

    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportChunk {
    pub path: PathBuf,
    pub bytes: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    pub path: PathBuf,
    /// Own bytes plus the bytes of every listed chunk.
    pub total_bytes: u64,
    pub bytes: Option<u64>,
    pub exports: Vec<String>,
    pub chunks: Vec<ReportChunk>,
    /// Embedded `node_modules` modules, largest first.
    pub modules: Vec<ModuleSize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BuildReport {
    pub name: String,
    pub entries: Vec<ReportEntry>,
    /// Chunks no entry refers to.
    pub orphan_chunks: Vec<ReportChunk>,
    pub total_bytes: u64,
}

/// Summarize the (aggregated) manifest for display.
pub fn build_report(ctx: &BuildContext) -> BuildReport {
    let out_dir = &ctx.options.out_dir;
    let resolve = |p: &str| -> PathBuf { resolve_in(out_dir, p) };
    let bytes_of = |p: &str| ctx.find_entry(p).and_then(|e| e.bytes);

    let mut entries = Vec::new();
    for entry in ctx.build_entries.iter().filter(|e| !e.chunk) {
        let chunks: Vec<ReportChunk> = entry
            .chunks
            .iter()
            .map(|chunk| ReportChunk {
                path: resolve(chunk),
                bytes: bytes_of(chunk),
            })
            .collect();

        let total_bytes = entry.bytes.unwrap_or(0)
            + chunks.iter().filter_map(|chunk| chunk.bytes).sum::<u64>();

        let mut modules: Vec<ModuleSize> = entry
            .modules
            .iter()
            .filter(|module| module.id.contains("node_modules"))
            .cloned()
            .collect();
        modules.sort_by(|a, b| b.bytes.cmp(&a.bytes));

        entries.push(ReportEntry {
            path: resolve(&entry.path),
            total_bytes,
            bytes: entry.bytes,
            exports: entry.exports.clone(),
            chunks,
            modules,
        });
    }

    let orphan_chunks = ctx
        .build_entries
        .iter()
        .filter(|e| e.chunk)
        .filter(|chunk| {
            !ctx.build_entries
                .iter()
                .any(|entry| entry.chunks.iter().any(|c| *c == chunk.path))
        })
        .map(|chunk| ReportChunk {
            path: resolve(&chunk.path),
            bytes: chunk.bytes,
        })
        .collect();

    BuildReport {
        name: ctx.options.name.clone(),
        entries,
        orphan_chunks,
        total_bytes: ctx.build_entries.iter().filter_map(|e| e.bytes).sum(),
    }
}

fn resolve_in(out_dir: &Path, path: &str) -> PathBuf {
    if path == "." {
        out_dir.to_path_buf()
    } else {
        out_dir.join(path)
    }
}
