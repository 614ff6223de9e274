//! Promote-accounts command.

use anyhow::Result;
use clap::Args;
use owo_colors::OwoColorize;

use strata_core::id::WorkspaceId;

use crate::context::CliContext;
use crate::Config;

/// Arguments for the promote-accounts command.
#[derive(Debug, Args)]
pub struct PromoteAccountsArgs {
    /// Email address of the user to promote.
    #[arg()]
    pub email: String,

    /// Workspace IDs to promote the user's accounts on.
    #[arg(required = true)]
    pub workspace_ids: Vec<String>,
}

/// Execute the promote-accounts command.
///
/// # Errors
///
/// Returns an error when a workspace ID is malformed, the user does
/// not exist, or a store write fails.
pub async fn execute(args: PromoteAccountsArgs, config: &Config) -> Result<()> {
    let workspace_ids: Vec<WorkspaceId> = args
        .workspace_ids
        .iter()
        .map(|raw| raw.parse())
        .collect::<Result<_, _>>()?;

    let ctx = CliContext::load(config)?;
    let changes = ctx
        .admin_ops()
        .promote_accounts(&args.email, &workspace_ids)
        .await?;

    for workspace_id in &changes.changed {
        println!("{} to admin on {}", "Promoted".green(), workspace_id);
    }
    for (workspace_id, reason) in &changes.skipped {
        println!("{} {}: {}", "Skipped".yellow(), workspace_id, reason);
    }
    ctx.finish()
}
