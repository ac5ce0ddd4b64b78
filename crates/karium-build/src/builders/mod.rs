//! Builder dispatch.
//!
//! Entries run kind by kind in a fixed order (typegen, mirror, bundle) and
//! one at a time within a kind, so later builders see the files earlier
//! ones wrote.

mod bundle;
mod mirror;
mod typegen;

pub use bundle::build_bundle;
pub use mirror::build_mirror;
pub use typegen::{TypegenOptions, TypegenOutput, TypegenOutputs, build_typegen};

use karium_config::BuilderKind;

use crate::context::BuildContext;
use crate::error::Result;
use crate::tools::Collaborators;

/// Run every builder kind in [`BuilderKind::ORDER`].
pub async fn run_builders(ctx: &mut BuildContext, tools: &Collaborators) -> Result<()> {
    for kind in BuilderKind::ORDER {
        run_builder(kind, ctx, tools).await?;
    }
    Ok(())
}

pub async fn run_builder(
    kind: BuilderKind,
    ctx: &mut BuildContext,
    tools: &Collaborators,
) -> Result<()> {
    tracing::debug!("Running {} builder", kind);
    match kind {
        BuilderKind::Typegen => build_typegen(ctx, tools).await,
        BuilderKind::Mirror => build_mirror(ctx, tools).await,
        BuilderKind::Bundle => build_bundle(ctx, tools).await,
    }
}
