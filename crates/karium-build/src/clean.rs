//! Output directory cleaning.

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

use crate::context::BuildContext;
use crate::error::{BuildError, Result};

/// Remove and recreate every distinct entry output directory, once each.
pub async fn clean_output_dirs(ctx: &BuildContext) -> Result<Vec<PathBuf>> {
    let root = &ctx.options.root_dir;
    let dirs: BTreeSet<PathBuf> = ctx
        .options
        .entries
        .iter()
        .map(|entry| entry.out_dir.clone())
        .collect();

    for dir in &dirs {
        ensure_removable(dir, root)?;
    }

    for dir in &dirs {
        tracing::debug!("Cleaning {}", dir.display());
        remove_dir(dir).await?;
        tokio::fs::create_dir_all(dir).await.map_err(|e| {
            BuildError::io(format!("Failed to create directory '{}'", dir.display()), e)
        })?;
    }

    Ok(dirs.into_iter().collect())
}

/// Refuse any directory that is, or contains, the project root.
pub(crate) fn ensure_removable(dir: &Path, root: &Path) -> Result<()> {
    if root.starts_with(dir) {
        return Err(BuildError::UnsafeCleanTarget {
            dir: dir.to_path_buf(),
            root: root.to_path_buf(),
        });
    }
    Ok(())
}

/// Remove a directory tree, or a symlink standing in for one. Missing is
/// fine.
pub(crate) async fn remove_dir(dir: &Path) -> Result<()> {
    let metadata = match tokio::fs::symlink_metadata(dir).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => {
            return Err(BuildError::io(
                format!("Failed to inspect '{}'", dir.display()),
                e,
            ));
        }
    };

    let result = if metadata.is_dir() {
        tokio::fs::remove_dir_all(dir).await
    } else {
        remove_link_or_file(dir).await
    };

    match result {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(BuildError::io(
            format!("Failed to remove '{}'", dir.display()),
            e,
        )),
    }
}

#[cfg(windows)]
async fn remove_link_or_file(path: &Path) -> io::Result<()> {
    // Directory symlinks and junctions need remove_dir on Windows.
    match tokio::fs::remove_dir(path).await {
        Ok(()) => Ok(()),
        Err(_) => tokio::fs::remove_file(path).await,
    }
}

#[cfg(not(windows))]
async fn remove_link_or_file(path: &Path) -> io::Result<()> {
    tokio::fs::remove_file(path).await
}

#[cfg(test)]
mod tests {
    use std::fs;

    use karium_config::ConfigLayer;
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;
    use crate::context::test_support::context_with;

    #[tokio::test]
    async fn shared_out_dirs_are_cleaned_once() {
        let dir = TempDir::new().unwrap();
        let layer = ConfigLayer::from_value(json!({
            "entries": [
                "src/a",
                "src/b",
                { "input": "src/runtime/", "outDir": "dist/runtime" }
            ]
        }))
        .unwrap();
        let ctx = context_with(dir.path(), layer);

        let dist = dir.path().join("dist");
        fs::create_dir_all(dist.join("old")).unwrap();
        fs::write(dist.join("old/file.mjs"), "stale").unwrap();

        let cleaned = clean_output_dirs(&ctx).await.unwrap();
        assert_eq!(cleaned, vec![dist.clone(), dist.join("runtime")]);
        assert!(dist.is_dir());
        assert!(dist.join("runtime").is_dir());
        assert!(!dist.join("old").exists());
    }

    #[tokio::test]
    async fn refuses_to_clean_the_project_root() {
        let dir = TempDir::new().unwrap();
        let layer = ConfigLayer::from_value(json!({
            "entries": [{ "input": "src/a", "outDir": "." }]
        }))
        .unwrap();
        let ctx = context_with(dir.path(), layer);
        fs::write(dir.path().join("package.json"), "{}").unwrap();

        let err = clean_output_dirs(&ctx).await.unwrap_err();
        assert!(matches!(err, BuildError::UnsafeCleanTarget { .. }));
        assert!(dir.path().join("package.json").exists());
    }

    #[tokio::test]
    async fn removing_a_missing_dir_is_ok() {
        let dir = TempDir::new().unwrap();
        remove_dir(&dir.path().join("nope")).await.unwrap();
    }
}
