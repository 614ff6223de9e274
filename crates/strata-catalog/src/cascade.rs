//! Cascade deletion engine for the four-level ownership hierarchy.
//!
//! Deletion is top-down logically (workspace → path → component →
//! data) but executes bottom-up physically so no surviving row ever
//! points at a deleted parent. Every entry point is idempotent:
//! re-running on an already-deleted or partially-deleted root is a
//! no-op for the rows that are gone and finishes the job for the rows
//! that are not. Crash recovery is exactly that re-run, plus the
//! reconciler for anything left dangling.
//!
//! Where a workspace-scoped secondary index exists the cascade uses
//! one flat query plus batch delete per entity kind; recursive descent
//! through paths and components is reserved for the scopes that have
//! no such index (path and component roots).
//!
//! Blob mirror deletion is best-effort: failures are logged and
//! counted, never aborting the row deletes. Identity-store deletion
//! during a user cascade is the opposite: it must succeed before any
//! catalog row is touched.

use std::collections::BTreeSet;
use std::sync::Arc;

use strata_core::blob::{BlobLocation, BlobStore};
use strata_core::entity::DataEntry;
use strata_core::id::{ComponentId, DataId, PathId, WorkspaceId};
use strata_core::observability::cascade_span;
use strata_core::store::HierarchyStore;

use crate::error::{CatalogError, Result};
use crate::identity::IdentityProvider;

/// Counters from a cascade run.
///
/// Blob failures are non-fatal and only counted; everything else
/// reflects rows actually removed by this call (an idempotent re-run
/// reports zeros).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeSummary {
    /// Data rows deleted.
    pub data_deleted: usize,
    /// Component rows deleted.
    pub components_deleted: usize,
    /// Path rows deleted.
    pub paths_deleted: usize,
    /// Account rows deleted.
    pub accounts_deleted: usize,
    /// Workspace rows deleted.
    pub workspaces_deleted: usize,
    /// Blob mirror deletions that failed (logged, not fatal).
    pub blob_failures: usize,
}

impl CascadeSummary {
    /// Merges another summary into this one.
    pub fn merge(&mut self, other: Self) {
        self.data_deleted += other.data_deleted;
        self.components_deleted += other.components_deleted;
        self.paths_deleted += other.paths_deleted;
        self.accounts_deleted += other.accounts_deleted;
        self.workspaces_deleted += other.workspaces_deleted;
        self.blob_failures += other.blob_failures;
    }
}

/// Deletes entities and everything they transitively own.
#[derive(Clone)]
pub struct CascadeEngine {
    store: Arc<dyn HierarchyStore>,
    blobs: Arc<dyn BlobStore>,
    identity: Arc<dyn IdentityProvider>,
    delete_blobs: bool,
}

impl CascadeEngine {
    /// Creates an engine with blob deletion enabled.
    #[must_use]
    pub fn new(
        store: Arc<dyn HierarchyStore>,
        blobs: Arc<dyn BlobStore>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            store,
            blobs,
            identity,
            delete_blobs: true,
        }
    }

    /// Enables or disables best-effort blob mirror deletion.
    ///
    /// Operators skip blob deletion when the bucket has its own
    /// lifecycle policy or when re-running a cascade that already
    /// cleared the mirrors.
    #[must_use]
    pub fn with_blob_deletion(mut self, delete_blobs: bool) -> Self {
        self.delete_blobs = delete_blobs;
        self
    }

    /// Best-effort deletion of one entry's blob mirror.
    ///
    /// Honors the entry's `delete_in_data_lake` flag and the engine
    /// switch. Failures are logged and counted in the summary, never
    /// propagated.
    async fn delete_mirror(&self, entry: &DataEntry, summary: &mut CascadeSummary) {
        if !self.delete_blobs || !entry.delete_in_data_lake {
            return;
        }
        let Some(raw) = entry.blob_location.as_deref() else {
            return;
        };
        let location: BlobLocation = match raw.parse() {
            Ok(loc) => loc,
            Err(err) => {
                tracing::warn!(data = %entry.id, location = raw, error = %err,
                    "unparseable blob location, skipping mirror delete");
                summary.blob_failures += 1;
                return;
            }
        };
        if let Err(err) = self
            .blobs
            .delete_blob(&location.bucket, &location.key)
            .await
        {
            tracing::warn!(data = %entry.id, location = raw, error = %err,
                "blob mirror delete failed, continuing cascade");
            summary.blob_failures += 1;
        }
    }

    /// Deletes the given data rows and their mirrors.
    async fn purge_data(
        &self,
        entries: Vec<DataEntry>,
        summary: &mut CascadeSummary,
    ) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        for entry in &entries {
            self.delete_mirror(entry, summary).await;
        }
        let ids: Vec<DataId> = entries.iter().map(|e| e.id.clone()).collect();
        self.store.batch_delete_data(&ids).await?;
        summary.data_deleted += ids.len();
        Ok(())
    }

    /// Deletes a component, its data rows, and their blob mirrors.
    ///
    /// # Errors
    ///
    /// `Dependency` when a required row mutation fails. Blob failures
    /// are counted, not raised. Re-running on a deleted component is a
    /// no-op.
    pub async fn delete_component_cascade(
        &self,
        component_id: &ComponentId,
    ) -> Result<CascadeSummary> {
        let span = cascade_span("delete_component", component_id.as_str());
        let _guard = span.enter();
        let mut summary = CascadeSummary::default();

        let entries = self.store.data_by_component_all(component_id).await?;
        let data_count = entries.len();
        self.purge_data(entries, &mut summary).await?;

        if self.store.get_component(component_id).await?.is_some() {
            self.store.delete_component(component_id).await?;
            summary.components_deleted += 1;
        }

        tracing::info!(component = %component_id, data = data_count, "component cascade complete");
        Ok(summary)
    }

    /// Deletes a path, all components under it, and their data.
    ///
    /// # Errors
    ///
    /// `Dependency` when a required row mutation fails.
    pub async fn delete_path_cascade(&self, path_id: &PathId) -> Result<CascadeSummary> {
        let span = cascade_span("delete_path", path_id.as_str());
        let _guard = span.enter();
        let mut summary = CascadeSummary::default();

        let components = self.store.components_by_path_all(path_id).await?;
        for component in &components {
            summary.merge(self.delete_component_cascade(&component.id).await?);
        }

        if self.store.get_path(path_id).await?.is_some() {
            self.store.delete_path(path_id).await?;
            summary.paths_deleted += 1;
        }

        tracing::info!(path = %path_id, components = components.len(), "path cascade complete");
        Ok(summary)
    }

    /// Deletes a workspace and all its descendants, flat per level.
    ///
    /// Uses one workspace-scoped query plus batch delete per entity
    /// kind, in dependency order: data, components, paths, accounts,
    /// then the workspace row itself.
    ///
    /// # Errors
    ///
    /// `Dependency` when a required row mutation fails.
    pub async fn delete_workspace_cascade(
        &self,
        workspace_id: &WorkspaceId,
    ) -> Result<CascadeSummary> {
        let span = cascade_span("delete_workspace", workspace_id.as_str());
        let _guard = span.enter();
        let mut summary = CascadeSummary::default();

        let entries = self.store.data_by_workspace(workspace_id).await?;
        self.purge_data(entries, &mut summary).await?;
        tracing::info!(workspace = %workspace_id, deleted = summary.data_deleted,
            "deleted workspace data rows");

        let components = self.store.components_by_workspace(workspace_id).await?;
        if !components.is_empty() {
            let ids: Vec<ComponentId> = components.iter().map(|c| c.id.clone()).collect();
            self.store.batch_delete_components(&ids).await?;
            summary.components_deleted += ids.len();
            tracing::info!(workspace = %workspace_id, deleted = ids.len(),
                "deleted workspace components");
        }

        let paths = self.store.paths_by_workspace_all(workspace_id).await?;
        if !paths.is_empty() {
            let ids: Vec<PathId> = paths.iter().map(|p| p.id.clone()).collect();
            self.store.batch_delete_paths(&ids).await?;
            summary.paths_deleted += ids.len();
            tracing::info!(workspace = %workspace_id, deleted = ids.len(),
                "deleted workspace paths");
        }

        let accounts = self.store.accounts_by_workspace(workspace_id).await?;
        if !accounts.is_empty() {
            let ids: Vec<_> = accounts.iter().map(|a| a.id.clone()).collect();
            self.store.batch_delete_accounts(&ids).await?;
            summary.accounts_deleted += ids.len();
            tracing::info!(workspace = %workspace_id, deleted = ids.len(),
                "deleted workspace accounts");
        }

        if self.store.get_workspace(workspace_id).await?.is_some() {
            self.store.delete_workspace(workspace_id).await?;
            summary.workspaces_deleted += 1;
        }

        tracing::info!(workspace = %workspace_id, "workspace cascade complete");
        Ok(summary)
    }

    /// Deletes a user, every workspace they administer, and all their
    /// account links.
    ///
    /// The external identity record is removed first; if that fails
    /// the whole cascade aborts with `FatalConsistency` before any
    /// catalog row is mutated, because the identity system is the
    /// system of record for authentication.
    ///
    /// # Errors
    ///
    /// `NotFound` when no user has this email; `FatalConsistency` when
    /// identity deletion fails; `Dependency` on store failure.
    pub async fn delete_user_cascade(&self, email: &str) -> Result<CascadeSummary> {
        let span = cascade_span("delete_user", email);
        let _guard = span.enter();

        let user = self
            .store
            .find_user_by_email(email)
            .await?
            .ok_or_else(|| CatalogError::not_found("user", email))?;

        self.identity.delete_identity(email).await.map_err(|err| {
            CatalogError::FatalConsistency {
                message: format!("identity deletion for '{email}' failed: {err}"),
            }
        })?;

        let accounts = self.store.accounts_by_user(&user.id).await?;
        let admin_workspaces: BTreeSet<WorkspaceId> = accounts
            .iter()
            .filter(|a| a.user_is_workspace_admin)
            .map(|a| a.workspace_id.clone())
            .collect();
        tracing::info!(
            user = %user.id,
            accounts = accounts.len(),
            admin_workspaces = admin_workspaces.len(),
            "starting user cascade"
        );

        let mut summary = CascadeSummary::default();
        for workspace_id in &admin_workspaces {
            summary.merge(self.delete_workspace_cascade(workspace_id).await?);
        }

        // Workspace cascades already removed the accounts on the
        // destroyed workspaces; sweep up whatever is left (member
        // links to surviving workspaces).
        let remaining = self.store.accounts_by_user(&user.id).await?;
        if !remaining.is_empty() {
            let ids: Vec<_> = remaining.iter().map(|a| a.id.clone()).collect();
            self.store.batch_delete_accounts(&ids).await?;
            summary.accounts_deleted += ids.len();
        }

        self.store.delete_user(&user.id).await?;
        tracing::info!(user = %user.id, "user cascade complete");
        Ok(summary)
    }

    /// Removes a user's access to specific workspaces.
    ///
    /// An admin account implies workspace destruction: a workspace
    /// must always have an admin, so removing the admin removes the
    /// workspace and everything in it. Member accounts are deleted as
    /// single rows. Workspaces where the user holds no account are
    /// logged and skipped.
    ///
    /// # Errors
    ///
    /// `NotFound` when no user has this email; `Dependency` on store
    /// failure.
    pub async fn delete_specific_accounts(
        &self,
        email: &str,
        workspace_ids: &[WorkspaceId],
    ) -> Result<CascadeSummary> {
        let user = self
            .store
            .find_user_by_email(email)
            .await?
            .ok_or_else(|| CatalogError::not_found("user", email))?;

        let mut summary = CascadeSummary::default();
        for workspace_id in workspace_ids {
            match self.store.account_for(&user.id, workspace_id).await? {
                None => {
                    tracing::info!(user = %user.id, workspace = %workspace_id,
                        "no account for workspace, skipping");
                }
                Some(account) if account.user_is_workspace_admin => {
                    tracing::info!(user = %user.id, workspace = %workspace_id,
                        "admin account removal destroys workspace");
                    summary.merge(self.delete_workspace_cascade(workspace_id).await?);
                }
                Some(account) => {
                    self.store.delete_account(&account.id).await?;
                    summary.accounts_deleted += 1;
                    tracing::info!(user = %user.id, workspace = %workspace_id,
                        account = %account.id, "deleted member account");
                }
            }
        }
        Ok(summary)
    }
}
