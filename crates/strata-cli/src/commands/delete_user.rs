//! Delete-user command.

use anyhow::Result;
use clap::Args;
use owo_colors::OwoColorize;

use crate::commands::print_summary;
use crate::context::{confirm, CliContext};
use crate::Config;

/// Arguments for the delete-user command.
#[derive(Debug, Args)]
pub struct DeleteUserArgs {
    /// Email address of the user to delete.
    #[arg()]
    pub email: String,
}

/// Execute the delete-user command.
///
/// Removes the user, their external identity, every workspace they
/// administer, and all their account links.
///
/// # Errors
///
/// Returns an error when the user does not exist, identity deletion
/// fails, or a store mutation fails.
pub async fn execute(args: DeleteUserArgs, config: &Config) -> Result<()> {
    if !confirm(config, &format!("delete user '{}'", args.email))? {
        println!("Aborted.");
        return Ok(());
    }

    let ctx = CliContext::load(config)?;
    let summary = ctx.cascade_engine().delete_user_cascade(&args.email).await?;

    println!("{} user '{}'", "Deleted".red(), args.email);
    print_summary(&summary);
    ctx.finish()
}
