use std::path::PathBuf;

use karium_config::{BuilderKind, EntryKind};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::context::BuildContext;
use crate::error::{BuildError, Result};
use crate::hooks::{HookArgs, HookName};
use crate::output::write_files;
use crate::tools::{Collaborators, pascal_case};

/// Per-entry typegen options, adjustable through `typegen:entry:options`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypegenOptions {
    /// Module the schema is read from.
    pub source: PathBuf,
    /// Values that take precedence over the source's own defaults.
    pub defaults: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypegenOutput {
    /// Relative to the entry's output directory.
    pub file_name: String,
    pub contents: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypegenOutputs {
    pub markdown: TypegenOutput,
    pub schema: TypegenOutput,
    pub defaults: TypegenOutput,
    pub declaration: Option<TypegenOutput>,
}

impl TypegenOutputs {
    pub fn iter(&self) -> impl Iterator<Item = &TypegenOutput> {
        [&self.markdown, &self.schema, &self.defaults]
            .into_iter()
            .chain(self.declaration.as_ref())
    }
}

pub async fn build_typegen(ctx: &mut BuildContext, tools: &Collaborators) -> Result<()> {
    let mut entries = ctx.options.entries_for(BuilderKind::Typegen);
    ctx.call_hook(HookName::TypegenEntries, &mut HookArgs::Entries(&mut entries))
        .await?;

    for mut entry in entries {
        let defaults = match &entry.kind {
            EntryKind::Typegen { defaults } => defaults.clone(),
            _ => Map::new(),
        };
        let mut options = TypegenOptions {
            source: entry.input.clone(),
            defaults,
        };
        ctx.call_hook(
            HookName::TypegenEntryOptions,
            &mut HookArgs::TypegenOptions {
                entry: &mut entry,
                options: &mut options,
            },
        )
        .await?;

        let source = tools.loader.load_module(&options.source)?;
        let mut schema = tools
            .schema
            .resolve_schema(&source, &options.defaults)
            .await
            .map_err(|e| BuildError::tool("schema tool", e))?;

        ctx.call_hook(
            HookName::TypegenEntrySchema,
            &mut HookArgs::TypegenSchema {
                entry: &mut entry,
                schema: &mut schema,
            },
        )
        .await?;

        let mut outputs = TypegenOutputs {
            markdown: TypegenOutput {
                file_name: format!("{}.md", entry.name),
                contents: tools.schema.generate_markdown(&schema),
            },
            schema: TypegenOutput {
                file_name: format!("{}.schema.json", entry.name),
                contents: to_pretty_json(&schema)?,
            },
            defaults: TypegenOutput {
                file_name: format!("{}.defaults.json", entry.name),
                contents: to_pretty_json(&Value::Object(options.defaults.clone()))?,
            },
            declaration: entry.wants_declaration().then(|| TypegenOutput {
                file_name: format!("{}.d.ts", entry.name),
                contents: tools
                    .schema
                    .generate_types(&schema, &pascal_case(&format!("{}-schema", entry.name))),
            }),
        };

        ctx.call_hook(
            HookName::TypegenEntryOutputs,
            &mut HookArgs::TypegenOutputs {
                entry: &mut entry,
                outputs: &mut outputs,
            },
        )
        .await?;

        write_files(
            &entry.out_dir,
            outputs
                .iter()
                .map(|output| (output.file_name.as_str(), output.contents.as_bytes())),
        )
        .await?;
    }

    ctx.call(HookName::TypegenDone).await
}

fn to_pretty_json(value: &Value) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| BuildError::tool("schema tool", e.into()))
}
