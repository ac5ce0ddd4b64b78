use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use ignore::WalkBuilder;
use ignore::overrides::OverrideBuilder;

use super::{MirrorOptions, MirrorOutput, MirrorTool, SOURCE_EXTENSIONS};

/// Copies a source tree into the output directory, preserving layout.
///
/// Files are selected by the entry's glob patterns (everything by default).
/// When `ext` is set, script files get that extension; declaration files
/// keep theirs.
#[derive(Debug, Clone, Default)]
pub struct FsMirror;

impl FsMirror {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MirrorTool for FsMirror {
    async fn mirror(&self, options: &MirrorOptions) -> anyhow::Result<MirrorOutput> {
        let src_dir = &options.src_dir;
        anyhow::ensure!(
            src_dir.is_dir(),
            "Mirror source '{}' is not a directory",
            src_dir.display()
        );

        let mut overrides = OverrideBuilder::new(src_dir);
        if options.pattern.is_empty() {
            overrides.add("**")?;
        }
        for pattern in &options.pattern {
            overrides
                .add(pattern)
                .with_context(|| format!("Invalid mirror pattern '{}'", pattern))?;
        }

        let walker = WalkBuilder::new(src_dir)
            .standard_filters(false)
            .overrides(overrides.build()?)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        let ext = options
            .ext
            .as_deref()
            .map(|ext| ext.trim_start_matches('.'));

        let mut output = MirrorOutput::default();
        for item in walker {
            let item = item?;
            if !item.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }

            let relative = item.path().strip_prefix(src_dir)?;
            let mut target = options.dist_dir.join(relative);
            if let Some(ext) = ext {
                if is_script(relative) {
                    target.set_extension(ext);
                }
            }

            if let Some(parent) = target.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::copy(item.path(), &target)
                .await
                .with_context(|| format!("Failed to copy {}", item.path().display()))?;
            output.written_files.push(target);
        }

        tracing::debug!(
            "Mirrored {} file(s) from {}",
            output.written_files.len(),
            src_dir.display()
        );
        Ok(output)
    }
}

fn is_script(path: &Path) -> bool {
    let name = path.to_string_lossy();
    if [".d.ts", ".d.mts", ".d.cts"].iter().any(|suffix| name.ends_with(suffix)) {
        return false;
    }
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}
