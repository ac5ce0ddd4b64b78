use std::io;
use std::path::Path;

use karium_config::{BuilderKind, EntryKind};

use crate::clean::{ensure_removable, remove_dir};
use crate::context::{BuildContext, BuildManifestEntry};
use crate::error::{BuildError, Result};
use crate::hooks::{HookArgs, HookName};
use crate::output::relative_slash_path;
use crate::tools::{Collaborators, MirrorOptions};

pub async fn build_mirror(ctx: &mut BuildContext, tools: &Collaborators) -> Result<()> {
    let mut entries = ctx.options.entries_for(BuilderKind::Mirror);
    ctx.call_hook(HookName::MirrorEntries, &mut HookArgs::Entries(&mut entries))
        .await?;

    for mut entry in entries {
        let dist_dir = entry.out_dir.clone();

        if ctx.options.stub {
            ensure_removable(&dist_dir, &ctx.options.root_dir)?;
            remove_dir(&dist_dir).await?;
            link_dir(&entry.input, &dist_dir).await.map_err(|e| {
                BuildError::io(
                    format!(
                        "Failed to link '{}' to '{}'",
                        dist_dir.display(),
                        entry.input.display()
                    ),
                    e,
                )
            })?;
            tracing::debug!("Linked {} -> {}", dist_dir.display(), entry.input.display());
            continue;
        }

        let (format, ext, pattern) = match &entry.kind {
            EntryKind::Mirror {
                format,
                ext,
                pattern,
            } => (*format, ext.clone(), pattern.clone()),
            _ => (None, None, Vec::new()),
        };
        let mut options = MirrorOptions {
            root_dir: ctx.options.root_dir.clone(),
            src_dir: entry.input.clone(),
            dist_dir: dist_dir.clone(),
            format,
            clean_dist: false,
            declaration: entry.wants_declaration(),
            pattern,
            ext,
        };
        ctx.call_hook(
            HookName::MirrorEntryOptions,
            &mut HookArgs::MirrorOptions {
                entry: &mut entry,
                options: &mut options,
            },
        )
        .await?;

        let mut output = tools
            .mirror
            .mirror(&options)
            .await
            .map_err(|e| BuildError::tool("mirror tool", e))?;

        let out_dir = &ctx.options.out_dir;
        let manifest_entry = BuildManifestEntry {
            path: manifest_path(out_dir, &options.dist_dir),
            chunks: output
                .written_files
                .iter()
                .map(|file| manifest_path(out_dir, file))
                .collect(),
            ..BuildManifestEntry::default()
        };
        ctx.build_entries.push(manifest_entry);

        ctx.call_hook(
            HookName::MirrorEntryBuild,
            &mut HookArgs::MirrorBuild {
                entry: &mut entry,
                output: &mut output,
            },
        )
        .await?;
    }

    ctx.call(HookName::MirrorDone).await
}

/// Path relative to `out_dir`, falling back to the full path for files
/// written elsewhere.
fn manifest_path(out_dir: &Path, path: &Path) -> String {
    relative_slash_path(out_dir, path).unwrap_or_else(|| path.to_string_lossy().into_owned())
}

#[cfg(unix)]
async fn link_dir(src: &Path, dst: &Path) -> io::Result<()> {
    if let Some(parent) = dst.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::symlink(src, dst).await
}

#[cfg(windows)]
async fn link_dir(src: &Path, dst: &Path) -> io::Result<()> {
    if let Some(parent) = dst.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::symlink_dir(src, dst).await
}
