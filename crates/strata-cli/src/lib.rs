//! # strata-cli
//!
//! Operator command-line interface for the Strata catalog.
//!
//! ## Commands
//!
//! - `strata create-user` - Create a user and its external identity
//! - `strata create-accounts` - Grant a user accounts on workspaces
//! - `strata promote-accounts` - Promote existing accounts to admin
//! - `strata delete-user` - Cascade-delete a user
//! - `strata delete-accounts` - Remove a user's access to workspaces
//! - `strata delete-workspace` - Cascade-delete a workspace
//! - `strata cleanup-orphans` - Detect and repair orphaned entities
//!
//! ## Configuration
//!
//! The CLI uses environment variables or command-line flags:
//!
//! - `STRATA_STORE` - Path to the catalog snapshot file
//! - `STRATA_STAGE` - Deployment stage label (default: `dev`)
//!
//! All destructive commands default to dry-run; pass `--execute` to
//! apply changes and `--yes` to skip the confirmation prompt.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
// CLI uses print! macros intentionally
#![allow(clippy::print_stdout)]
#![allow(clippy::print_stderr)]

pub mod commands;
pub mod context;

use clap::{Parser, Subcommand};

/// Strata CLI - catalog administration command-line interface.
#[derive(Debug, Parser)]
#[command(name = "strata")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the catalog snapshot file.
    #[arg(long, env = "STRATA_STORE", default_value = "strata-store.json")]
    pub store: String,

    /// Deployment stage label, echoed in output.
    #[arg(long, env = "STRATA_STAGE", default_value = "dev")]
    pub stage: String,

    /// Apply changes instead of the default dry run.
    #[arg(long)]
    pub execute: bool,

    /// Skip the confirmation prompt.
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Leave blob mirrors in place during deletions.
    #[arg(long)]
    pub skip_blobs: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Get the effective configuration.
    #[must_use]
    pub fn config(&self) -> Config {
        Config {
            store: self.store.clone(),
            stage: self.stage.clone(),
            execute: self.execute,
            yes: self.yes,
            skip_blobs: self.skip_blobs,
        }
    }
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create a user and its external identity.
    CreateUser(commands::create_user::CreateUserArgs),
    /// Grant a user accounts on workspaces.
    CreateAccounts(commands::create_accounts::CreateAccountsArgs),
    /// Promote a user's existing accounts to admin.
    PromoteAccounts(commands::promote_accounts::PromoteAccountsArgs),
    /// Cascade-delete a user and every workspace they administer.
    DeleteUser(commands::delete_user::DeleteUserArgs),
    /// Remove a user's access to specific workspaces.
    DeleteAccounts(commands::delete_accounts::DeleteAccountsArgs),
    /// Cascade-delete a workspace and its subtree.
    DeleteWorkspace(commands::delete_workspace::DeleteWorkspaceArgs),
    /// Detect and repair orphaned components and workspaces.
    CleanupOrphans(commands::cleanup_orphans::CleanupOrphansArgs),
}

/// CLI configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Path to the catalog snapshot file.
    pub store: String,
    /// Deployment stage label.
    pub stage: String,
    /// Apply changes instead of dry-running.
    pub execute: bool,
    /// Skip the confirmation prompt.
    pub yes: bool,
    /// Leave blob mirrors in place during deletions.
    pub skip_blobs: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_from_flags() {
        let cli = Cli::parse_from([
            "strata",
            "--store",
            "/tmp/catalog.json",
            "--stage",
            "prod",
            "--execute",
            "-y",
            "delete-user",
            "ada@x.com",
        ]);
        let config = cli.config();
        assert_eq!(config.store, "/tmp/catalog.json");
        assert_eq!(config.stage, "prod");
        assert!(config.execute);
        assert!(config.yes);
        assert!(!config.skip_blobs);
        assert!(matches!(cli.command, Commands::DeleteUser(_)));
    }

    #[test]
    fn dry_run_is_the_default() {
        let cli = Cli::parse_from(["strata", "cleanup-orphans"]);
        let config = cli.config();
        assert!(!config.execute);
        assert_eq!(config.stage, "dev");
    }
}
