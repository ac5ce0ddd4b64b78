//! External collaborators the builders delegate to.
//!
//! The pipeline only knows these contracts. Bundling, directory mirroring
//! and schema generation are done by whatever implements [`Bundler`],
//! [`MirrorTool`] and [`SchemaTool`]. The built-in implementations copy
//! sources without transforming them.

mod copy_bundler;
mod fs_mirror;
mod schema;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use karium_config::{External, FileModuleLoader, ModuleFormat, ModuleLoader};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::context::ModuleSize;

pub use copy_bundler::CopyBundler;
pub use fs_mirror::FsMirror;
pub use schema::{InferredSchema, pascal_case};

/// Source extensions probed for extension-less entry inputs, in order.
pub const SOURCE_EXTENSIONS: &[&str] = &["ts", "mts", "cts", "tsx", "js", "mjs", "cjs", "jsx"];

/// Find the source file for an entry input: the path itself, the path with
/// a source extension, or an `index` file inside it.
pub fn resolve_source(input: &Path) -> Option<PathBuf> {
    if input.is_file() {
        return Some(input.to_path_buf());
    }

    let with_extension = |base: &Path| {
        SOURCE_EXTENSIONS.iter().find_map(|ext| {
            let mut candidate = base.as_os_str().to_os_string();
            candidate.push(".");
            candidate.push(ext);
            let candidate = PathBuf::from(candidate);
            candidate.is_file().then_some(candidate)
        })
    };

    with_extension(input).or_else(|| {
        input
            .is_dir()
            .then(|| with_extension(&input.join("index")))
            .flatten()
    })
}

/// Input to a bundler run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundlerOptions {
    pub root_dir: PathBuf,
    /// Output file stem (relative to `out_dir`) to resolved input path.
    pub inputs: IndexMap<String, PathBuf>,
    pub out_dir: PathBuf,
    pub externals: Vec<External>,
    pub alias: IndexMap<String, String>,
    pub replace: IndexMap<String, String>,
    /// The opaque bundler block from the build options.
    pub options: Map<String, Value>,
}

/// One produced file. Paths are relative to the bundler's `out_dir`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputChunk {
    pub file_name: String,
    pub code: String,
    pub is_entry: bool,
    /// Everything this chunk imports: other chunks' file names and bare
    /// module specifiers.
    pub imports: Vec<String>,
    pub exports: Vec<String>,
    pub modules: Vec<ModuleSize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BundleOutput {
    pub chunks: Vec<OutputChunk>,
}

#[async_trait]
pub trait Bundler: Send + Sync {
    /// Bundle the runtime code for every input.
    async fn bundle(&self, options: &BundlerOptions) -> anyhow::Result<BundleOutput>;

    /// Bundle type declarations for every input.
    async fn bundle_declarations(&self, options: &BundlerOptions) -> anyhow::Result<BundleOutput>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MirrorOptions {
    pub root_dir: PathBuf,
    pub src_dir: PathBuf,
    pub dist_dir: PathBuf,
    pub format: Option<ModuleFormat>,
    /// Always false from the pipeline; output dirs are cleaned up front.
    pub clean_dist: bool,
    pub declaration: bool,
    pub pattern: Vec<String>,
    pub ext: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MirrorOutput {
    /// Absolute paths of every written file.
    pub written_files: Vec<PathBuf>,
}

#[async_trait]
pub trait MirrorTool: Send + Sync {
    async fn mirror(&self, options: &MirrorOptions) -> anyhow::Result<MirrorOutput>;
}

#[async_trait]
pub trait SchemaTool: Send + Sync {
    /// Resolve a schema from a loaded source module and user defaults.
    async fn resolve_schema(&self, source: &Value, defaults: &Map<String, Value>)
    -> anyhow::Result<Value>;

    fn generate_markdown(&self, schema: &Value) -> String;

    fn generate_types(&self, schema: &Value, interface_name: &str) -> String;
}

/// The set of collaborators one build uses.
#[derive(Clone)]
pub struct Collaborators {
    pub bundler: Arc<dyn Bundler>,
    pub mirror: Arc<dyn MirrorTool>,
    pub schema: Arc<dyn SchemaTool>,
    pub loader: Arc<dyn ModuleLoader>,
}

impl Collaborators {
    pub fn with_bundler(mut self, bundler: impl Bundler + 'static) -> Self {
        self.bundler = Arc::new(bundler);
        self
    }

    pub fn with_mirror(mut self, mirror: impl MirrorTool + 'static) -> Self {
        self.mirror = Arc::new(mirror);
        self
    }

    pub fn with_schema(mut self, schema: impl SchemaTool + 'static) -> Self {
        self.schema = Arc::new(schema);
        self
    }

    pub fn with_loader(mut self, loader: impl ModuleLoader + 'static) -> Self {
        self.loader = Arc::new(loader);
        self
    }
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            bundler: Arc::new(CopyBundler::new()),
            mirror: Arc::new(FsMirror::new()),
            schema: Arc::new(InferredSchema),
            loader: Arc::new(FileModuleLoader::new()),
        }
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
