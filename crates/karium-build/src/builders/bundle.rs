use std::collections::HashSet;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use karium_config::{BuildEntry, BuilderKind};

use crate::context::{BuildContext, BuildManifestEntry};
use crate::error::{BuildError, Result};
use crate::hooks::{HookArgs, HookName};
use crate::output::{relative_slash_path, write_files};
use crate::tools::{BundleOutput, BundlerOptions, Collaborators, resolve_source};

pub async fn build_bundle(ctx: &mut BuildContext, tools: &Collaborators) -> Result<()> {
    let entries = ctx.options.entries_for(BuilderKind::Bundle);

    if ctx.options.stub {
        for entry in &entries {
            write_stub(entry).await?;
        }
        return ctx.call(HookName::BundleDone).await;
    }

    let out_dir = ctx.options.out_dir.clone();
    let mut options = BundlerOptions {
        root_dir: ctx.options.root_dir.clone(),
        inputs: entries
            .iter()
            .map(|entry| (input_key(entry, &out_dir), entry.input.clone()))
            .collect(),
        out_dir: out_dir.clone(),
        externals: ctx.options.externals.clone(),
        alias: ctx.options.alias.clone(),
        replace: ctx.options.replace.clone(),
        options: ctx.options.bundler.clone(),
    };
    ctx.call_hook(HookName::BundleOptions, &mut HookArgs::BundleOptions(&mut options))
        .await?;

    if options.inputs.is_empty() {
        return ctx.call(HookName::BundleDone).await;
    }

    let mut output = tools
        .bundler
        .bundle(&options)
        .await
        .map_err(|e| BuildError::tool("bundler", e))?;
    ctx.call_hook(HookName::BundleBuild, &mut HookArgs::BundleBuild(&mut output))
        .await?;

    write_output(&options.out_dir, &output).await?;
    record_output(ctx, &options.out_dir, &output);

    let declaration_keys: HashSet<String> = entries
        .iter()
        .filter(|entry| entry.wants_declaration())
        .map(|entry| input_key(entry, &out_dir))
        .collect();

    if !declaration_keys.is_empty() {
        let mut dts_options = options.clone();
        dts_options.inputs = options
            .inputs
            .iter()
            .filter(|(key, _)| declaration_keys.contains(key.as_str()))
            .map(|(key, input)| (key.clone(), input.clone()))
            .collect::<IndexMap<_, _>>();

        ctx.call_hook(
            HookName::BundleDeclarationsOptions,
            &mut HookArgs::BundleOptions(&mut dts_options),
        )
        .await?;

        let mut dts_output = tools
            .bundler
            .bundle_declarations(&dts_options)
            .await
            .map_err(|e| BuildError::tool("bundler", e))?;
        ctx.call_hook(
            HookName::BundleDeclarationsBuild,
            &mut HookArgs::BundleBuild(&mut dts_output),
        )
        .await?;

        write_output(&dts_options.out_dir, &dts_output).await?;
    }

    ctx.call(HookName::BundleDone).await
}

/// Output file stem for an entry: its name, prefixed with the entry's
/// output directory when that is below the build's `out_dir`.
fn input_key(entry: &BuildEntry, out_dir: &Path) -> String {
    match relative_slash_path(out_dir, &entry.out_dir) {
        Some(prefix) if prefix != "." => format!("{}/{}", prefix, entry.name),
        _ => entry.name.clone(),
    }
}

async fn write_output(out_dir: &Path, output: &BundleOutput) -> Result<Vec<PathBuf>> {
    write_files(
        out_dir,
        output
            .chunks
            .iter()
            .map(|chunk| (chunk.file_name.as_str(), chunk.code.as_bytes())),
    )
    .await
}

/// Record entry and chunk files in the manifest and collect the bare
/// module specifiers they import.
fn record_output(ctx: &mut BuildContext, bundle_dir: &Path, output: &BundleOutput) {
    let out_dir = ctx.options.out_dir.clone();
    let manifest_path = |file_name: &str| {
        let path = bundle_dir.join(file_name);
        relative_slash_path(&out_dir, &path).unwrap_or_else(|| file_name.to_string())
    };
    let chunk_files: HashSet<&str> = output
        .chunks
        .iter()
        .map(|chunk| chunk.file_name.as_str())
        .collect();

    for chunk in &output.chunks {
        let (internal, external): (Vec<&String>, Vec<&String>) = chunk
            .imports
            .iter()
            .partition(|id| chunk_files.contains(id.as_str()));

        for id in external {
            ctx.used_imports.insert(id.clone());
        }

        let entry = BuildManifestEntry {
            path: manifest_path(chunk.file_name.as_str()),
            bytes: Some(chunk.code.len() as u64),
            chunk: !chunk.is_entry,
            chunks: if chunk.is_entry {
                internal.iter().map(|id| manifest_path(id.as_str())).collect()
            } else {
                Vec::new()
            },
            exports: chunk.exports.clone(),
            modules: chunk.modules.clone(),
        };
        ctx.build_entries.push(entry);
    }
}

/// Pass-through outputs that re-export the entry's source.
async fn write_stub(entry: &BuildEntry) -> Result<()> {
    let source = resolve_source(&entry.input).unwrap_or_else(|| entry.input.clone());
    let specifier = source.to_string_lossy().replace('\\', "/");
    let reexport = format!("export * from \"{}\";\n", specifier);

    let mjs = format!("{}.mjs", entry.name);
    let dts = format!("{}.d.ts", entry.name);
    let mut files = vec![(mjs.as_str(), reexport.as_bytes())];
    if entry.wants_declaration() {
        files.push((dts.as_str(), reexport.as_bytes()));
    }

    write_files(&entry.out_dir, files).await?;
    tracing::debug!("Stubbed {}", entry.name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_keys_follow_entry_out_dir() {
        let out_dir = Path::new("/p/dist");
        let top = BuildEntry::from_spec("src/index".into(), Path::new("/p"), out_dir, None).unwrap();
        assert_eq!(input_key(&top, out_dir), "index");

        let nested = BuildEntry::from_spec(
            karium_config::EntrySpec::Object(karium_config::EntryObject {
                input: Some("src/cli".into()),
                out_dir: Some("dist/bin".into()),
                ..Default::default()
            }),
            Path::new("/p"),
            out_dir,
            None,
        )
        .unwrap();
        assert_eq!(input_key(&nested, out_dir), "bin/cli");
    }
}
