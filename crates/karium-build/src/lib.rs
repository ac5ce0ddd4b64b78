#![cfg_attr(docsrs, feature(doc_cfg))]

//! # karium-build
//!
//! The karium build pipeline: hook bus, builder dispatch, output report
//! and package validation, on top of the `karium-config` data model.
//!
//! ## Quick Start
//!
//! ```no_run
//! use karium_build::{BuildConfig, Collaborators, build};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let result = build(".", false, BuildConfig::new(), Collaborators::default()).await?;
//! for warning in result.warnings() {
//!     eprintln!("warning: {}", warning);
//! }
//! result.gate()?;
//! # Ok(()) }
//! ```
//!
//! ### Hooks
//!
//! Inline configs can carry hooks. Handlers for the same name run in
//! registration order: preset hooks first, then inline ones.
//!
//! ```no_run
//! use karium_build::{BuildConfig, Collaborators, HookName, Hooks, build};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut hooks = Hooks::new();
//! hooks.on_fn(HookName::BuildBefore, |ctx, _| {
//!     println!("building {} entries", ctx.options.entries.len());
//!     Ok(())
//! });
//!
//! build(".", false, BuildConfig::new().with_hooks(hooks), Collaborators::default()).await?;
//! # Ok(()) }
//! ```
//!
//! ### Collaborators
//!
//! Bundling, directory mirroring and schema generation are delegated to
//! [`Bundler`], [`MirrorTool`] and [`SchemaTool`] implementations. The
//! defaults ([`CopyBundler`], [`FsMirror`], [`InferredSchema`]) copy sources
//! without transforming them.

pub mod builders;
pub mod clean;
pub mod context;
pub mod error;
pub mod hooks;
pub mod output;
pub mod pipeline;
pub mod preset;
pub mod tools;
pub mod validate;

pub use context::{BuildContext, BuildManifestEntry, ModuleSize};
pub use error::{BuildError, Result};
pub use hooks::{Hook, HookArgs, HookName, Hooks, UnknownHook};
pub use output::{BuildReport, ReportChunk, ReportEntry};
pub use pipeline::{BuildResult, build, prepare_context};
pub use preset::{AUTO_PRESET, BuildConfig, Preset, select_preset};
pub use tools::{
    BundleOutput, Bundler, BundlerOptions, Collaborators, CopyBundler, FsMirror, InferredSchema,
    MirrorOptions, MirrorOutput, MirrorTool, OutputChunk, SchemaTool,
};
pub use validate::{missing_package_files, validate_dependencies, validate_package};

// Re-export the configuration model so callers need a single dependency.
pub use karium_config;
