//! Named pipeline hooks.
//!
//! Every build owns its own [`Hooks`] registry; nothing is shared between
//! invocations. Handlers for a name run one after another in registration
//! order and receive the build context plus a stage-specific payload they
//! may mutate in place.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use karium_config::BuildEntry;

use crate::builders::{TypegenOptions, TypegenOutputs};
use crate::context::BuildContext;
use crate::tools::{BundleOutput, BundlerOptions, MirrorOptions, MirrorOutput};

/// Every hook point of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookName {
    BuildPrepare,
    BuildBefore,
    BuildDone,
    BundleOptions,
    BundleBuild,
    BundleDeclarationsOptions,
    BundleDeclarationsBuild,
    BundleDone,
    MirrorEntries,
    MirrorEntryOptions,
    MirrorEntryBuild,
    MirrorDone,
    TypegenEntries,
    TypegenEntryOptions,
    TypegenEntrySchema,
    TypegenEntryOutputs,
    TypegenDone,
}

impl HookName {
    pub const ALL: [HookName; 17] = [
        HookName::BuildPrepare,
        HookName::BuildBefore,
        HookName::BuildDone,
        HookName::BundleOptions,
        HookName::BundleBuild,
        HookName::BundleDeclarationsOptions,
        HookName::BundleDeclarationsBuild,
        HookName::BundleDone,
        HookName::MirrorEntries,
        HookName::MirrorEntryOptions,
        HookName::MirrorEntryBuild,
        HookName::MirrorDone,
        HookName::TypegenEntries,
        HookName::TypegenEntryOptions,
        HookName::TypegenEntrySchema,
        HookName::TypegenEntryOutputs,
        HookName::TypegenDone,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HookName::BuildPrepare => "build:prepare",
            HookName::BuildBefore => "build:before",
            HookName::BuildDone => "build:done",
            HookName::BundleOptions => "bundle:options",
            HookName::BundleBuild => "bundle:build",
            HookName::BundleDeclarationsOptions => "bundle:declarations:options",
            HookName::BundleDeclarationsBuild => "bundle:declarations:build",
            HookName::BundleDone => "bundle:done",
            HookName::MirrorEntries => "mirror:entries",
            HookName::MirrorEntryOptions => "mirror:entry:options",
            HookName::MirrorEntryBuild => "mirror:entry:build",
            HookName::MirrorDone => "mirror:done",
            HookName::TypegenEntries => "typegen:entries",
            HookName::TypegenEntryOptions => "typegen:entry:options",
            HookName::TypegenEntrySchema => "typegen:entry:schema",
            HookName::TypegenEntryOutputs => "typegen:entry:outputs",
            HookName::TypegenDone => "typegen:done",
        }
    }
}

impl fmt::Display for HookName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown hook '{0}'")]
pub struct UnknownHook(pub String);

impl FromStr for HookName {
    type Err = UnknownHook;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HookName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| UnknownHook(s.to_string()))
    }
}

/// Stage-specific hook payload.
#[derive(Debug)]
pub enum HookArgs<'a> {
    /// Context-only hooks (`build:*`, `*:done`).
    Context,
    /// The entries a builder is about to process.
    Entries(&'a mut Vec<BuildEntry>),
    BundleOptions(&'a mut BundlerOptions),
    BundleBuild(&'a mut BundleOutput),
    MirrorOptions {
        entry: &'a mut BuildEntry,
        options: &'a mut MirrorOptions,
    },
    MirrorBuild {
        entry: &'a mut BuildEntry,
        output: &'a mut MirrorOutput,
    },
    TypegenOptions {
        entry: &'a mut BuildEntry,
        options: &'a mut TypegenOptions,
    },
    TypegenSchema {
        entry: &'a mut BuildEntry,
        schema: &'a mut serde_json::Value,
    },
    TypegenOutputs {
        entry: &'a mut BuildEntry,
        outputs: &'a mut TypegenOutputs,
    },
}

/// A hook handler.
#[async_trait]
pub trait Hook: Send + Sync {
    async fn call(&self, ctx: &mut BuildContext, args: &mut HookArgs<'_>) -> anyhow::Result<()>;
}

#[async_trait]
impl<F> Hook for F
where
    F: Fn(&mut BuildContext, &mut HookArgs<'_>) -> anyhow::Result<()> + Send + Sync,
{
    async fn call(&self, ctx: &mut BuildContext, args: &mut HookArgs<'_>) -> anyhow::Result<()> {
        self(ctx, args)
    }
}

/// Per-build hook registry.
#[derive(Clone, Default)]
pub struct Hooks {
    handlers: IndexMap<HookName, Vec<Arc<dyn Hook>>>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for `name` after any existing ones.
    pub fn on(&mut self, name: HookName, hook: impl Hook + 'static) -> &mut Self {
        self.handlers.entry(name).or_default().push(Arc::new(hook));
        self
    }

    /// Register a synchronous closure.
    pub fn on_fn<F>(&mut self, name: HookName, f: F) -> &mut Self
    where
        F: Fn(&mut BuildContext, &mut HookArgs<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on(name, f)
    }

    /// Append every handler of `other`, keeping its order.
    pub fn extend(&mut self, other: Hooks) -> &mut Self {
        for (name, handlers) in other.handlers {
            self.handlers.entry(name).or_default().extend(handlers);
        }
        self
    }

    pub fn len_for(&self, name: HookName) -> usize {
        self.handlers.get(&name).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.values().all(Vec::is_empty)
    }

    /// Snapshot of the handlers for `name`, in registration order.
    pub fn handlers(&self, name: HookName) -> Vec<Arc<dyn Hook>> {
        self.handlers.get(&name).cloned().unwrap_or_default()
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.handlers.iter().map(|(name, list)| (name.as_str(), list.len())))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_strings() {
        for name in HookName::ALL {
            assert_eq!(name.as_str().parse::<HookName>().unwrap(), name);
        }
        assert!("rollup:build".parse::<HookName>().is_err());
    }

    #[test]
    fn extend_appends_after_existing_handlers() {
        let mut preset = Hooks::new();
        preset.on_fn(HookName::BuildDone, |_, _| Ok(()));

        let mut inline = Hooks::new();
        inline
            .on_fn(HookName::BuildDone, |_, _| Ok(()))
            .on_fn(HookName::BuildBefore, |_, _| Ok(()));

        preset.extend(inline);
        assert_eq!(preset.len_for(HookName::BuildDone), 2);
        assert_eq!(preset.len_for(HookName::BuildBefore), 1);
        assert_eq!(preset.len_for(HookName::BuildPrepare), 0);
        assert!(!preset.is_empty());
    }
}
