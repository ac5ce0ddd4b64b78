//! File writing for builder output.
//!
//! Every file name handed to the writer is validated against its base
//! directory first: `..` components and absolute paths that would land
//! outside the directory are rejected before anything is written.

use std::path::{Path, PathBuf};

use path_clean::PathClean;

use crate::error::{BuildError, Result};

/// Write each `(file_name, contents)` pair under `dir`, creating parent
/// directories as needed. Returns the written paths in input order.
///
/// Files are written one by one; a failure leaves earlier files on disk.
pub async fn write_files<'a, I>(dir: &Path, files: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator<Item = (&'a str, &'a [u8])>,
{
    let dir = dir.to_path_buf().clean();
    let mut written = Vec::new();

    for (file_name, contents) in files {
        let target = validate_output_path(&dir, file_name)?;

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                BuildError::io(
                    format!("Failed to create directory '{}'", parent.display()),
                    e,
                )
            })?;
        }

        tokio::fs::write(&target, contents).await.map_err(|e| {
            BuildError::io(format!("Failed to write '{}'", target.display()), e)
        })?;

        tracing::debug!("Wrote {}", target.display());
        written.push(target);
    }

    Ok(written)
}

/// Validates an output path to prevent directory traversal.
///
/// Cleans the joined path and checks it is still under `base_dir`.
pub fn validate_output_path(base_dir: &Path, filename: &str) -> Result<PathBuf> {
    if filename.is_empty() {
        return Err(BuildError::InvalidOutputPath(
            "Filename is empty".to_string(),
        ));
    }

    if filename.contains('\0') {
        return Err(BuildError::InvalidOutputPath(
            "Filename contains null byte".to_string(),
        ));
    }

    let full_path = base_dir.join(Path::new(filename).clean()).clean();

    if !full_path.starts_with(base_dir) || full_path == base_dir {
        return Err(BuildError::InvalidOutputPath(format!(
            "Path '{}' escapes output directory '{}' (resolved to '{}')",
            filename,
            base_dir.display(),
            full_path.display()
        )));
    }

    Ok(full_path)
}

/// `path` relative to `base` with `/` separators, or `None` when `path` is
/// not under `base`.
pub fn relative_slash_path(base: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(base).ok()?;
    if relative.as_os_str().is_empty() {
        return Some(".".to_string());
    }

    Some(
        relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_output_path_normal() {
        let base = Path::new("/tmp/output");
        let result = validate_output_path(base, "index.mjs");
        assert_eq!(result.unwrap(), Path::new("/tmp/output/index.mjs"));
    }

    #[test]
    fn test_validate_output_path_nested() {
        let base = Path::new("/tmp/output");
        let result = validate_output_path(base, "chunks/shared.mjs");
        assert_eq!(result.unwrap(), Path::new("/tmp/output/chunks/shared.mjs"));
    }

    #[test]
    fn test_validate_output_path_traversal() {
        let base = Path::new("/tmp/output");
        assert!(matches!(
            validate_output_path(base, "../etc/passwd"),
            Err(BuildError::InvalidOutputPath(_))
        ));
        assert!(validate_output_path(base, "safe/../../../../etc/passwd").is_err());
        assert!(validate_output_path(base, "/etc/passwd").is_err());
    }

    #[test]
    fn test_validate_output_path_null_byte_and_empty() {
        let base = Path::new("/tmp/output");
        assert!(validate_output_path(base, "file\0name.js").is_err());
        assert!(validate_output_path(base, "").is_err());
        assert!(validate_output_path(base, ".").is_err());
    }

    #[test]
    fn test_validate_output_path_current_dir() {
        let base = Path::new("/tmp/output");
        let result = validate_output_path(base, "./index.mjs");
        assert_eq!(result.unwrap(), Path::new("/tmp/output/index.mjs"));
    }

    #[test]
    fn relative_paths_use_forward_slashes() {
        let base = Path::new("/p/dist");
        assert_eq!(
            relative_slash_path(base, Path::new("/p/dist/runtime/index.mjs")).as_deref(),
            Some("runtime/index.mjs")
        );
        assert_eq!(relative_slash_path(base, base).as_deref(), Some("."));
        assert_eq!(relative_slash_path(base, Path::new("/elsewhere")), None);
    }

    #[tokio::test]
    async fn writes_nested_files() {
        let dir = TempDir::new().unwrap();
        let written = write_files(
            dir.path(),
            [
                ("index.mjs", b"export {}".as_slice()),
                ("chunks/a.mjs", b"export const a = 1".as_slice()),
            ],
        )
        .await
        .unwrap();

        assert_eq!(written.len(), 2);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("chunks/a.mjs")).unwrap(),
            "export const a = 1"
        );
    }
}
