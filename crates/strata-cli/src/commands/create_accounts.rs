//! Create-accounts command.

use anyhow::Result;
use clap::Args;
use owo_colors::OwoColorize;

use strata_core::id::WorkspaceId;

use crate::context::CliContext;
use crate::Config;

/// Arguments for the create-accounts command.
#[derive(Debug, Args)]
pub struct CreateAccountsArgs {
    /// Email address of the user to grant access to.
    #[arg()]
    pub email: String,

    /// Workspace IDs to grant accounts on.
    #[arg(required = true)]
    pub workspace_ids: Vec<String>,

    /// Grant admin accounts instead of member accounts.
    #[arg(long)]
    pub admin: bool,
}

/// Execute the create-accounts command.
///
/// # Errors
///
/// Returns an error when a workspace ID is malformed, the user does
/// not exist, or a store write fails.
pub async fn execute(args: CreateAccountsArgs, config: &Config) -> Result<()> {
    let workspace_ids: Vec<WorkspaceId> = args
        .workspace_ids
        .iter()
        .map(|raw| raw.parse())
        .collect::<Result<_, _>>()?;

    let ctx = CliContext::load(config)?;
    let changes = ctx
        .admin_ops()
        .create_accounts(&args.email, &workspace_ids, args.admin)
        .await?;

    for workspace_id in &changes.changed {
        println!("{} account on {}", "Granted".green(), workspace_id);
    }
    for (workspace_id, reason) in &changes.skipped {
        println!("{} {}: {}", "Skipped".yellow(), workspace_id, reason);
    }
    ctx.finish()
}
