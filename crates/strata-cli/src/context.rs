//! Shared command context: snapshot-backed store and wired engines.
//!
//! The CLI works against a file-persisted catalog snapshot. Every
//! command loads the snapshot into memory, runs against the in-memory
//! copy, and persists the result only under `--execute`. A dry run is
//! the same operation on a copy that is simply thrown away, so the
//! reported counters are exact, not estimates.

use std::io::Write as _;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as _, Result};

use strata_catalog::admin::AdminOps;
use strata_catalog::cascade::CascadeEngine;
use strata_catalog::identity::{IdentityProvider, MemoryIdentity};
use strata_catalog::reconciler::Reconciler;
use strata_core::blob::MemoryBlobStore;
use strata_core::store::{MemoryStore, StoreSnapshot};

use crate::Config;

/// A loaded catalog plus the collaborators commands need.
pub struct CliContext {
    /// The in-memory catalog copy.
    pub store: Arc<MemoryStore>,
    /// Blob store backing mirror deletion.
    pub blobs: Arc<MemoryBlobStore>,
    /// Identity provider for user lifecycle commands.
    pub identity: Arc<dyn IdentityProvider>,
    config: Config,
}

impl CliContext {
    /// Loads the snapshot file named by the configuration, or starts
    /// from an empty catalog when the file does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error when the file exists but cannot be read or
    /// parsed.
    pub fn load(config: &Config) -> Result<Self> {
        let path = Path::new(&config.store);
        let store = if path.exists() {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read store file {}", path.display()))?;
            let snapshot: StoreSnapshot = serde_json::from_str(&raw)
                .with_context(|| format!("failed to parse store file {}", path.display()))?;
            Arc::new(MemoryStore::from_snapshot(snapshot))
        } else {
            tracing::info!(path = %path.display(), "store file absent, starting empty");
            Arc::new(MemoryStore::new())
        };
        Ok(Self {
            store,
            blobs: Arc::new(MemoryBlobStore::new()),
            identity: Arc::new(MemoryIdentity::new()),
            config: config.clone(),
        })
    }

    /// Builds a cascade engine honoring the `--skip-blobs` flag.
    #[must_use]
    pub fn cascade_engine(&self) -> CascadeEngine {
        CascadeEngine::new(self.store.clone(), self.blobs.clone(), self.identity.clone())
            .with_blob_deletion(!self.config.skip_blobs)
    }

    /// Builds a reconciler over this context's store.
    #[must_use]
    pub fn reconciler(&self) -> Reconciler {
        Reconciler::new(self.store.clone(), self.cascade_engine())
    }

    /// Builds admin operations over this context's store.
    #[must_use]
    pub fn admin_ops(&self) -> AdminOps {
        AdminOps::new(self.store.clone(), self.identity.clone())
    }

    /// Persists the catalog back to the snapshot file when running
    /// under `--execute`; otherwise reports the dry run.
    ///
    /// # Errors
    ///
    /// Returns an error when serializing or writing the file fails.
    pub fn finish(&self) -> Result<()> {
        if !self.config.execute {
            println!();
            println!("Dry run: no changes were persisted. Re-run with --execute to apply.");
            return Ok(());
        }
        let snapshot = self.store.snapshot()?;
        let raw = serde_json::to_string_pretty(&snapshot)?;
        std::fs::write(&self.config.store, raw)
            .with_context(|| format!("failed to write store file {}", self.config.store))?;
        tracing::info!(path = %self.config.store, "persisted catalog snapshot");
        Ok(())
    }
}

/// Asks the operator to confirm a destructive action.
///
/// Skipped entirely for dry runs and under `--yes`. Returns `false`
/// when the operator declines.
///
/// # Errors
///
/// Returns an error when stdin cannot be read.
pub fn confirm(config: &Config, action: &str) -> Result<bool> {
    if !config.execute || config.yes {
        return Ok(true);
    }
    print!(
        "About to {action} on stage '{}'. Type 'yes' to continue: ",
        config.stage
    );
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("yes"))
}
