//! Strata CLI - catalog administration.
//!
//! The main entry point for the `strata` CLI binary.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use strata_cli::{Cli, Commands};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        match cli.command {
            Commands::CreateUser(args) => {
                strata_cli::commands::create_user::execute(args, &config).await
            }
            Commands::CreateAccounts(args) => {
                strata_cli::commands::create_accounts::execute(args, &config).await
            }
            Commands::PromoteAccounts(args) => {
                strata_cli::commands::promote_accounts::execute(args, &config).await
            }
            Commands::DeleteUser(args) => {
                strata_cli::commands::delete_user::execute(args, &config).await
            }
            Commands::DeleteAccounts(args) => {
                strata_cli::commands::delete_accounts::execute(args, &config).await
            }
            Commands::DeleteWorkspace(args) => {
                strata_cli::commands::delete_workspace::execute(args, &config).await
            }
            Commands::CleanupOrphans(args) => {
                strata_cli::commands::cleanup_orphans::execute(args, &config).await
            }
        }
    })
}
