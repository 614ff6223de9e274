//! Delete-accounts command.

use anyhow::Result;
use clap::Args;
use owo_colors::OwoColorize;

use strata_core::id::WorkspaceId;

use crate::commands::print_summary;
use crate::context::{confirm, CliContext};
use crate::Config;

/// Arguments for the delete-accounts command.
#[derive(Debug, Args)]
pub struct DeleteAccountsArgs {
    /// Email address of the user losing access.
    #[arg()]
    pub email: String,

    /// Workspace IDs to remove the user's access to.
    #[arg(required = true)]
    pub workspace_ids: Vec<String>,
}

/// Execute the delete-accounts command.
///
/// Member accounts are removed as single rows; removing an admin
/// account destroys the whole workspace, since a workspace must always
/// have an admin.
///
/// # Errors
///
/// Returns an error when a workspace ID is malformed, the user does
/// not exist, or a store mutation fails.
pub async fn execute(args: DeleteAccountsArgs, config: &Config) -> Result<()> {
    let workspace_ids: Vec<WorkspaceId> = args
        .workspace_ids
        .iter()
        .map(|raw| raw.parse())
        .collect::<Result<_, _>>()?;

    let action = format!(
        "remove '{}' from {} workspace(s), destroying any they administer",
        args.email,
        workspace_ids.len()
    );
    if !confirm(config, &action)? {
        println!("Aborted.");
        return Ok(());
    }

    let ctx = CliContext::load(config)?;
    let summary = ctx
        .cascade_engine()
        .delete_specific_accounts(&args.email, &workspace_ids)
        .await?;

    println!("{} access for '{}'", "Removed".red(), args.email);
    print_summary(&summary);
    ctx.finish()
}
