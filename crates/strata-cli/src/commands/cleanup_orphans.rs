//! Cleanup-orphans command.

use anyhow::Result;
use clap::Args;
use owo_colors::OwoColorize;

use crate::commands::print_summary;
use crate::context::{confirm, CliContext};
use crate::Config;

/// Arguments for the cleanup-orphans command.
#[derive(Debug, Args)]
pub struct CleanupOrphansArgs {
    /// Only report findings; implied when --execute is absent.
    #[arg(long)]
    pub report_only: bool,
}

/// Execute the cleanup-orphans command.
///
/// Without `--execute` (or with `--report-only`) this prints the
/// orphans a repairing sweep would remove. With `--execute` it repairs
/// them through the cascade engine.
///
/// # Errors
///
/// Returns an error when detection fails. Individual repair failures
/// are reported but do not fail the command.
pub async fn execute(args: CleanupOrphansArgs, config: &Config) -> Result<()> {
    let ctx = CliContext::load(config)?;
    let reconciler = ctx.reconciler();

    if !config.execute || args.report_only {
        let report = reconciler.sweep_dry_run().await?;
        println!(
            "Checked {} components and {} workspaces",
            report.components_checked, report.workspaces_checked
        );
        for orphan in &report.orphaned_components {
            println!(
                "  {} component {} ({:?})",
                "orphan".yellow(),
                orphan.component.id,
                orphan.reason
            );
        }
        for workspace in &report.orphaned_workspaces {
            println!(
                "  {} workspace {} (no admin account)",
                "orphan".yellow(),
                workspace.id
            );
        }
        if !report.has_orphans() {
            println!("{}", "No orphans found.".green());
        }
        return ctx.finish();
    }

    if !confirm(config, "repair all orphaned entities by cascade deletion")? {
        println!("Aborted.");
        return Ok(());
    }

    let result = reconciler.sweep().await?;
    println!(
        "Repaired {} orphaned component(s) and {} workspace(s)",
        result.report.orphaned_components.len(),
        result.report.orphaned_workspaces.len()
    );
    print_summary(&result.summary);
    for error in &result.errors {
        println!("  {} {error}", "repair failed:".red());
    }
    ctx.finish()
}
