//! Build command implementation.

use crate::cli::BuildArgs;
use crate::commands::project_root;
use crate::error::Result;
use crate::ui;
use karium_build::karium_config::ConfigLayer;
use karium_build::{BuildConfig, Collaborators};

/// Execute the build command.
///
/// Prints the size report and every warning, then fails with
/// `FailedOnWarnings` when warnings exist and `failOnWarn` is enabled.
pub async fn execute(args: BuildArgs) -> Result<()> {
    let root = project_root(&args.root())?;
    let inline = BuildConfig::from_layer(inline_layer(&args));

    let result = karium_build::build(&root, args.stub, inline, Collaborators::default()).await?;

    if let Some(report) = &result.report {
        let cwd = std::env::current_dir()?;
        ui::print_build_report(report, &cwd);
    }

    ui::warnings(&result.context.warnings);
    result.gate()?;

    Ok(())
}

/// Options given on the command line, merged above presets and defaults.
fn inline_layer(args: &BuildArgs) -> ConfigLayer {
    ConfigLayer {
        clean: args.no_clean.then_some(false),
        fail_on_warn: args.no_fail_on_warn.then_some(false),
        ..ConfigLayer::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_only_set_what_they_disable() {
        let layer = inline_layer(&BuildArgs::default());
        assert_eq!(layer.clean, None);
        assert_eq!(layer.fail_on_warn, None);

        let layer = inline_layer(&BuildArgs {
            no_clean: true,
            no_fail_on_warn: true,
            ..BuildArgs::default()
        });
        assert_eq!(layer.clean, Some(false));
        assert_eq!(layer.fail_on_warn, Some(false));
    }
}
