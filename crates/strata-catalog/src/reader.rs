//! Paged read surface over the hierarchy.
//!
//! Reads are scoped by membership: the caller's email must resolve to
//! an account on the workspace owning the requested rows. One page per
//! call; callers thread the returned token to continue.

use std::sync::Arc;

use strata_core::entity::{Component, DataEntry, Path};
use strata_core::id::{ComponentId, PathId, WorkspaceId};
use strata_core::page::{Page, PageToken};
use strata_core::store::HierarchyStore;

use crate::error::{CatalogError, Result};

/// Membership-checked paged reads.
#[derive(Clone)]
pub struct HierarchyReader {
    store: Arc<dyn HierarchyStore>,
}

impl HierarchyReader {
    /// Creates a reader over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn HierarchyStore>) -> Self {
        Self { store }
    }

    /// Verifies that `email` resolves to a user holding an account on
    /// `workspace_id`.
    async fn authorize(&self, email: &str, workspace_id: &WorkspaceId) -> Result<()> {
        let user = self
            .store
            .find_user_by_email(email)
            .await?
            .ok_or_else(|| CatalogError::not_found("user", email))?;
        let account = self.store.account_for(&user.id, workspace_id).await?;
        if account.is_none() {
            return Err(CatalogError::authorization(format!(
                "user '{email}' has no account on workspace '{workspace_id}'"
            )));
        }
        Ok(())
    }

    /// Lists one page of paths under a workspace.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown user or workspace, `Authorization`
    /// when the caller holds no account on the workspace.
    pub async fn workspace_paths(
        &self,
        email: &str,
        workspace_id: &WorkspaceId,
        limit: Option<usize>,
        token: Option<PageToken>,
    ) -> Result<Page<Path>> {
        self.store
            .get_workspace(workspace_id)
            .await?
            .ok_or_else(|| CatalogError::not_found("workspace", workspace_id.as_str()))?;
        self.authorize(email, workspace_id).await?;
        Ok(self
            .store
            .paths_by_workspace(workspace_id, limit, token)
            .await?)
    }

    /// Lists one page of components under a path.
    ///
    /// Membership is checked against the path's owning workspace.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown user or path, `Authorization` when the
    /// caller holds no account on the owning workspace.
    pub async fn path_components(
        &self,
        email: &str,
        path_id: &PathId,
        limit: Option<usize>,
        token: Option<PageToken>,
    ) -> Result<Page<Component>> {
        let path = self
            .store
            .get_path(path_id)
            .await?
            .ok_or_else(|| CatalogError::not_found("path", path_id.as_str()))?;
        self.authorize(email, &path.workspace_id).await?;
        Ok(self.store.components_by_path(path_id, limit, token).await?)
    }

    /// Lists one page of data entries under a component.
    ///
    /// Membership is checked against the component's denormalized
    /// workspace reference, so a read against an orphaned component
    /// fails authorization rather than leaking rows.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown user or component, `Authorization`
    /// when the caller holds no account on the owning workspace.
    pub async fn component_data(
        &self,
        email: &str,
        component_id: &ComponentId,
        limit: Option<usize>,
        token: Option<PageToken>,
    ) -> Result<Page<DataEntry>> {
        let component = self
            .store
            .get_component(component_id)
            .await?
            .ok_or_else(|| CatalogError::not_found("component", component_id.as_str()))?;
        self.authorize(email, &component.workspace_id).await?;
        Ok(self
            .store
            .data_by_component(component_id, limit, token)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::entity::{Account, User, Workspace};
    use strata_core::store::MemoryStore;

    async fn seeded() -> (Arc<MemoryStore>, HierarchyReader, Workspace, Path) {
        let store = Arc::new(MemoryStore::new());
        let reader = HierarchyReader::new(store.clone());

        let user = User::new("member@x.com");
        let ws = Workspace::new("Proj");
        let account = Account::new(user.id.clone(), ws.id.clone(), false);
        let path = Path::new(ws.id.clone(), "Ingest", "ingest");

        store.put_user(user).await.unwrap();
        store.put_workspace(ws.clone()).await.unwrap();
        store.put_account(account).await.unwrap();
        store.put_path(path.clone()).await.unwrap();

        (store, reader, ws, path)
    }

    #[tokio::test]
    async fn member_reads_paths_in_pages() {
        let (store, reader, ws, _) = seeded().await;
        for i in 0..5 {
            store
                .put_path(Path::new(ws.id.clone(), format!("p{i}"), format!("p{i}")))
                .await
                .unwrap();
        }

        let first = reader
            .workspace_paths("member@x.com", &ws.id, Some(4), None)
            .await
            .unwrap();
        assert_eq!(first.items.len(), 4);
        let token = first.next_token.expect("more pages");

        let rest = reader
            .workspace_paths("member@x.com", &ws.id, Some(4), Some(token))
            .await
            .unwrap();
        assert_eq!(rest.items.len(), 2);
        assert!(rest.next_token.is_none());
    }

    #[tokio::test]
    async fn non_member_is_rejected() {
        let (store, reader, ws, _) = seeded().await;
        store.put_user(User::new("outsider@x.com")).await.unwrap();

        let err = reader
            .workspace_paths("outsider@x.com", &ws.id, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Authorization { .. }));
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let (_, reader, ws, _) = seeded().await;
        let err = reader
            .workspace_paths("ghost@x.com", &ws.id, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::NotFound { entity: "user", .. }));
    }

    #[tokio::test]
    async fn component_reads_authorize_via_owning_workspace() {
        let (store, reader, ws, path) = seeded().await;
        let comp = Component::new(ws.id.clone(), path.id.clone(), "Raw");
        store.put_component(comp.clone()).await.unwrap();
        store
            .put_data(DataEntry::new(
                comp.id.clone(),
                ws.id.clone(),
                "{}",
                "{}",
                true,
            ))
            .await
            .unwrap();

        let comps = reader
            .path_components("member@x.com", &path.id, None, None)
            .await
            .unwrap();
        assert_eq!(comps.items.len(), 1);

        let data = reader
            .component_data("member@x.com", &comp.id, None, None)
            .await
            .unwrap();
        assert_eq!(data.items.len(), 1);
    }
}
