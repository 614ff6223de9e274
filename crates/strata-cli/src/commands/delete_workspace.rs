//! Delete-workspace command.

use anyhow::Result;
use clap::Args;
use owo_colors::OwoColorize;

use strata_core::id::WorkspaceId;

use crate::commands::print_summary;
use crate::context::{confirm, CliContext};
use crate::Config;

/// Arguments for the delete-workspace command.
#[derive(Debug, Args)]
pub struct DeleteWorkspaceArgs {
    /// ID of the workspace to delete.
    #[arg()]
    pub workspace_id: String,
}

/// Execute the delete-workspace command.
///
/// # Errors
///
/// Returns an error when the workspace ID is malformed or a store
/// mutation fails. Deleting an absent workspace is a no-op.
pub async fn execute(args: DeleteWorkspaceArgs, config: &Config) -> Result<()> {
    let workspace_id: WorkspaceId = args.workspace_id.parse()?;

    if !confirm(
        config,
        &format!("delete workspace '{workspace_id}' and its entire subtree"),
    )? {
        println!("Aborted.");
        return Ok(());
    }

    let ctx = CliContext::load(config)?;
    let summary = ctx
        .cascade_engine()
        .delete_workspace_cascade(&workspace_id)
        .await?;

    println!("{} workspace '{workspace_id}'", "Deleted".red());
    print_summary(&summary);
    ctx.finish()
}
