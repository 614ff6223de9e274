//! Uniqueness resolver: "one name per parent scope" pre-checks.
//!
//! These are advisory checks, not transactional locks. Two concurrent
//! creators can both pass a check and both create a row; callers that
//! need strict uniqueness must add an external advisory lock or a
//! conditional write keyed on the uniqueness tuple. The reconciler is
//! the backstop for the damage such races can do.

use std::sync::Arc;

use strata_core::id::{PathId, UserId, WorkspaceId};
use strata_core::store::HierarchyStore;

use crate::error::{CatalogError, Result};

/// Normalizes a display name into its uniqueness key: lowercase with
/// spaces replaced by hyphens.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}

/// Advisory uniqueness checks against the hierarchy store.
#[derive(Clone)]
pub struct UniquenessResolver {
    store: Arc<dyn HierarchyStore>,
}

impl UniquenessResolver {
    /// Creates a resolver over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn HierarchyStore>) -> Self {
        Self { store }
    }

    /// Fails with [`CatalogError::Conflict`] when any workspace with
    /// this name is already linked to `user_id` by an account,
    /// regardless of admin status.
    ///
    /// # Errors
    ///
    /// `Conflict` on a name hit; `Dependency` on store failure.
    pub async fn assert_workspace_name_available(
        &self,
        user_id: &UserId,
        name: &str,
    ) -> Result<()> {
        let workspaces = self.store.find_workspaces_by_name(name).await?;
        for workspace in workspaces {
            if self
                .store
                .account_for(user_id, &workspace.id)
                .await?
                .is_some()
            {
                return Err(CatalogError::conflict(format!(
                    "user {user_id} already has access to a workspace named '{name}'"
                )));
            }
        }
        Ok(())
    }

    /// Fails with [`CatalogError::Conflict`] when the workspace already
    /// holds a path whose normalized name matches `name`.
    ///
    /// # Errors
    ///
    /// `Conflict` on a normalized-name hit; `Dependency` on store
    /// failure.
    pub async fn assert_path_name_available(
        &self,
        workspace_id: &WorkspaceId,
        name: &str,
    ) -> Result<()> {
        let normalized = normalize_name(name);
        if self
            .store
            .path_by_normalized_name(workspace_id, &normalized)
            .await?
            .is_some()
        {
            return Err(CatalogError::conflict(format!(
                "path named '{name}' already exists in workspace {workspace_id}"
            )));
        }
        Ok(())
    }

    /// Fails with [`CatalogError::Conflict`] when the path already
    /// holds a component with this exact name.
    ///
    /// # Errors
    ///
    /// `Conflict` on a name hit; `Dependency` on store failure.
    pub async fn assert_component_name_available(
        &self,
        path_id: &PathId,
        name: &str,
    ) -> Result<()> {
        if self.store.component_by_name(path_id, name).await?.is_some() {
            return Err(CatalogError::conflict(format!(
                "component named '{name}' already exists in path {path_id}"
            )));
        }
        Ok(())
    }
}
