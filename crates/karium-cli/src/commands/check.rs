//! Check command implementation.
//!
//! Resolves configuration the same way `build` does, without touching the
//! output directories.

use crate::cli::CheckArgs;
use crate::commands::project_root;
use crate::error::Result;
use crate::ui;
use karium_build::{BuildConfig, Collaborators, missing_package_files, prepare_context};

/// Execute the check command.
///
/// Prints the normalized entries and reports package.json paths that do
/// not exist yet.
pub async fn execute(args: CheckArgs) -> Result<()> {
    let root = project_root(&args.root())?;
    let ctx = prepare_context(&root, false, BuildConfig::default(), &Collaborators::default())
        .await?;
    let options = &ctx.options;

    if options.entries.is_empty() {
        ui::warning(&format!("No entries configured for {}", ctx.pkg.display_name()));
    } else {
        ui::info(&format!(
            "{} entries for {}",
            options.entries.len(),
            ctx.pkg.display_name()
        ));
        for entry in &options.entries {
            eprintln!(
                "  [{}] {} -> {}",
                entry.builder().as_str(),
                ui::display_path(&entry.input, &options.root_dir),
                ui::display_path(&entry.out_dir, &options.root_dir)
            );
        }
    }

    ui::warnings(&ctx.warnings);

    let missing = missing_package_files(&ctx.pkg, &options.root_dir);
    if missing.is_empty() {
        ui::success("Configuration is valid");
    } else {
        ui::warning(&format!(
            "Potential missing package.json files: {}",
            missing.join(", ")
        ));
    }

    Ok(())
}
