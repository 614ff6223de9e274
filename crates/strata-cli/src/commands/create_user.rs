//! Create-user command.

use anyhow::Result;
use clap::Args;
use owo_colors::OwoColorize;

use crate::context::CliContext;
use crate::Config;

/// Arguments for the create-user command.
#[derive(Debug, Args)]
pub struct CreateUserArgs {
    /// Email address of the new user.
    #[arg()]
    pub email: String,

    /// Also create a personal workspace with the user as admin.
    #[arg(long)]
    pub with_workspace: bool,
}

/// Execute the create-user command.
///
/// # Errors
///
/// Returns an error when the email is invalid, the user already
/// exists, or identity provisioning fails.
pub async fn execute(args: CreateUserArgs, config: &Config) -> Result<()> {
    let ctx = CliContext::load(config)?;
    let created = ctx
        .admin_ops()
        .create_user(&args.email, args.with_workspace)
        .await?;

    println!("{} user {}", "Created".green(), created.user.id);
    println!("  email:             {}", created.user.email);
    println!("  external username: {}", created.external_username);
    if let Some(workspace) = &created.workspace {
        println!(
            "  personal workspace: {} ({})",
            workspace.name, workspace.id
        );
    }
    ctx.finish()
}
