//! CLI command implementations.

pub mod cleanup_orphans;
pub mod create_accounts;
pub mod create_user;
pub mod delete_accounts;
pub mod delete_user;
pub mod delete_workspace;
pub mod promote_accounts;

use owo_colors::OwoColorize;
use strata_catalog::cascade::CascadeSummary;

/// Prints cascade counters in a uniform layout.
pub(crate) fn print_summary(summary: &CascadeSummary) {
    println!("  workspaces deleted: {}", summary.workspaces_deleted);
    println!("  paths deleted:      {}", summary.paths_deleted);
    println!("  components deleted: {}", summary.components_deleted);
    println!("  data rows deleted:  {}", summary.data_deleted);
    println!("  accounts deleted:   {}", summary.accounts_deleted);
    if summary.blob_failures > 0 {
        println!(
            "  blob failures:      {} {}",
            summary.blob_failures,
            "(left in place, re-run or sweep later)".yellow()
        );
    }
}
