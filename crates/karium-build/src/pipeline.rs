//! The build pipeline.
//!
//! ```text
//! resolve config -> build:prepare -> normalize -> build:before -> clean
//!   -> typegen -> mirror -> bundle -> aggregate/report -> validate -> build:done
//! ```

use std::path::{Path, PathBuf};

use karium_config::{BuildOptions, ConfigDiscovery, default_layer, merge_layers, resolve_path};

use crate::builders::run_builders;
use crate::clean::clean_output_dirs;
use crate::context::BuildContext;
use crate::error::{BuildError, Result};
use crate::hooks::{HookName, Hooks};
use crate::output::{BuildReport, aggregate, build_report};
use crate::preset::{BuildConfig, select_preset};
use crate::tools::Collaborators;
use crate::validate::{validate_dependencies, validate_package};

/// Outcome of a build that ran to completion.
#[derive(Debug)]
pub struct BuildResult {
    pub context: BuildContext,
    /// `None` in stub mode.
    pub report: Option<BuildReport>,
}

impl BuildResult {
    pub fn warnings(&self) -> impl Iterator<Item = &str> {
        self.context.warnings.iter().map(String::as_str)
    }

    pub fn has_warnings(&self) -> bool {
        !self.context.warnings.is_empty()
    }

    /// Fail when the build produced warnings and `failOnWarn` is set.
    pub fn gate(&self) -> Result<()> {
        if self.has_warnings() && self.context.options.fail_on_warn {
            return Err(BuildError::FailedOnWarnings {
                count: self.context.warnings.len(),
            });
        }
        Ok(())
    }
}

/// Build the package at `root`.
///
/// Fatal errors abort immediately. Warnings are collected on the context;
/// call [`BuildResult::gate`] to turn them into a failure.
pub async fn build(
    root: impl AsRef<Path>,
    stub: bool,
    inline: BuildConfig,
    tools: Collaborators,
) -> Result<BuildResult> {
    let mut ctx = prepare_context(root, stub, inline, &tools).await?;
    ctx.call(HookName::BuildBefore).await?;

    let options = &ctx.options;
    tracing::info!(
        "{} {}",
        if options.stub { "Stubbing" } else { "Building" },
        ctx.pkg.display_name()
    );
    tracing::debug!("Root dir: {}", options.root_dir.display());
    for entry in &options.entries {
        tracing::debug!("Entry: {}", entry.dump());
    }

    if options.clean {
        clean_output_dirs(&ctx).await?;
    }

    run_builders(&mut ctx, &tools).await?;

    if ctx.options.stub {
        ctx.call(HookName::BuildDone).await?;
        return Ok(BuildResult {
            context: ctx,
            report: None,
        });
    }

    tracing::info!("Build succeeded for {}", ctx.options.name);

    aggregate(&mut ctx)?;
    let report = build_report(&ctx);

    validate_dependencies(&mut ctx);
    let (pkg, root_dir) = (ctx.pkg.clone(), ctx.options.root_dir.clone());
    validate_package(&pkg, &root_dir, &mut ctx);

    ctx.call(HookName::BuildDone).await?;

    Ok(BuildResult {
        context: ctx,
        report: Some(report),
    })
}

/// Resolve configuration and run `build:prepare`, stopping before
/// anything touches the output directories.
///
/// Entries in the returned context are fully normalized and the manifest's
/// dependencies are applied.
pub async fn prepare_context(
    root: impl AsRef<Path>,
    stub: bool,
    inline: BuildConfig,
    tools: &Collaborators,
) -> Result<BuildContext> {
    let root_dir = absolute_root(root.as_ref())?;
    let discovery = ConfigDiscovery::with_loader(&root_dir, tools.loader.clone());

    let file_layer = discovery.load_build_config()?;
    let pkg = discovery.load_manifest()?;
    let preset = select_preset(&file_layer, &pkg, &inline).resolve(&discovery)?;
    let manifest_layer = pkg.config_layer()?;

    let BuildConfig {
        layer: inline_layer,
        hooks: inline_hooks,
        ..
    } = inline;

    let merged = merge_layers([
        file_layer,
        manifest_layer,
        inline_layer,
        preset.layer,
        default_layer(&pkg, stub),
    ]);
    let options = BuildOptions::from_layer(&root_dir, merged, &pkg)?;

    let mut hooks = Hooks::new();
    hooks.extend(preset.hooks).extend(inline_hooks);

    let mut ctx = BuildContext::new(options, pkg, hooks);
    ctx.call(HookName::BuildPrepare).await?;

    ctx.options.normalize_entries();
    let pkg = ctx.pkg.clone();
    ctx.options.apply_manifest_dependencies(&pkg);

    Ok(ctx)
}

fn absolute_root(root: &Path) -> Result<PathBuf> {
    let cwd = std::env::current_dir()
        .map_err(|e| BuildError::io("Failed to read the current directory", e))?;
    let root = if root.as_os_str().is_empty() {
        Path::new(".")
    } else {
        root
    };
    Ok(resolve_path(&cwd, root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn prepare_merges_every_layer() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("build.config.toml"),
            "outDir = \"lib\"\nentries = [\"src/index\"]\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{ "name": "@acme/widget", "dependencies": { "defu": "^6" }, "buildkarium": { "declaration": true } }"#,
        )
        .unwrap();

        let inline = BuildConfig::from_layer(karium_config::ConfigLayer {
            entries: vec!["src/cli".into()],
            clean: Some(false),
            ..Default::default()
        });
        let ctx = prepare_context(dir.path(), false, inline, &Collaborators::default())
            .await
            .unwrap();

        let options = &ctx.options;
        assert_eq!(options.name, "widget");
        assert_eq!(options.out_dir, dir.path().join("lib"));
        assert!(!options.clean);
        assert!(options.declaration);
        let names: Vec<_> = options.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["index", "cli"]);
        assert!(options.entries.iter().all(|e| e.declaration == Some(true)));
        assert_eq!(options.dependencies, vec!["defu"]);
    }

    #[test]
    fn relative_roots_resolve_against_cwd() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(absolute_root(Path::new("")).unwrap(), cwd);
        assert_eq!(absolute_root(Path::new("pkg/..")).unwrap(), cwd);
    }

    #[test]
    fn gate_respects_fail_on_warn() {
        let dir = TempDir::new().unwrap();
        let mut ctx = crate::context::test_support::context(
            dir.path(),
            karium_config::PackageManifest::default(),
        );
        ctx.warn("something");

        let mut result = BuildResult {
            context: ctx,
            report: None,
        };
        assert!(matches!(
            result.gate(),
            Err(BuildError::FailedOnWarnings { count: 1 })
        ));

        result.context.options.fail_on_warn = false;
        assert!(result.gate().is_ok());
    }
}
