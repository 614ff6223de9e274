//! Get-or-create orchestrator for the workspace → path → component →
//! data chain.
//!
//! All resolve operations converge: a second call with the same scope
//! and name returns the same ID with `created = false`. Creation is
//! not rolled back on downstream failure; a bulk request that fails
//! midway leaves the rows it already created, surfaces the error, and
//! relies on the caller re-invoking (or the reconciler) to converge.

use std::sync::Arc;

use strata_core::entity::{Account, Component, DataEntry, Path, Workspace};
use strata_core::id::{ComponentId, DataId, PathId, UserId, WorkspaceId};
use strata_core::store::HierarchyStore;

use crate::error::{CatalogError, Result};
use crate::resolver::normalize_name;

/// Outcome of a single get-or-create resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<T> {
    /// The existing or newly created entity ID.
    pub id: T,
    /// True when this call created the entity.
    pub created: bool,
}

/// One data entry in a bulk-create request.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DataEntryInput {
    /// Opaque payload, typically serialized structured content.
    pub data: String,
    /// Opaque side-channel metadata; defaults to `{}`.
    #[serde(default)]
    pub data_map: Option<String>,
}

/// A bulk-create request: materialize the full hierarchy chain under
/// the given names and append data entries to the leaf component.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BulkCreateRequest {
    /// Email of the acting admin user. Must already exist.
    pub admin_email: String,
    /// Workspace name to resolve or create.
    pub workspace_name: String,
    /// Path name to resolve or create.
    pub path_name: String,
    /// Component name to resolve or create.
    pub component_name: String,
    /// Data entries to append. May be empty.
    pub entries: Vec<DataEntryInput>,
    /// Whether the entries should be mirrored to blob storage.
    #[serde(default = "default_true")]
    pub add_to_data_lake: bool,
}

fn default_true() -> bool {
    true
}

/// Result of a bulk-create call: all ids plus per-level created flags.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BulkCreateOutcome {
    /// Resolved workspace.
    pub workspace_id: WorkspaceId,
    /// Resolved path.
    pub path_id: PathId,
    /// Resolved component.
    pub component_id: ComponentId,
    /// IDs of the data entries appended by this call.
    pub created_data_ids: Vec<DataId>,
    /// True when the workspace was created by this call.
    pub workspace_created: bool,
    /// True when the path was created by this call.
    pub path_created: bool,
    /// True when the component was created by this call.
    pub component_created: bool,
}

/// Idempotently materializes hierarchy chains and appends data entries.
#[derive(Clone)]
pub struct Provisioner {
    store: Arc<dyn HierarchyStore>,
}

impl Provisioner {
    /// Creates a provisioner over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn HierarchyStore>) -> Self {
        Self { store }
    }

    /// Resolves a workspace by name for the acting user.
    ///
    /// When a workspace with this name exists, the caller must hold an
    /// admin account on it. When none exists, the workspace is created
    /// and the caller is granted the founding admin account.
    ///
    /// The name lookup is a full scan, acceptable while workspace
    /// count stays small.
    ///
    /// # Errors
    ///
    /// `Authorization` when the workspace exists but the caller holds
    /// no account or a non-admin account; `Dependency` on store
    /// failure.
    pub async fn resolve_workspace(
        &self,
        user_id: &UserId,
        name: &str,
    ) -> Result<Resolved<WorkspaceId>> {
        let existing = self.store.find_workspaces_by_name(name).await?;

        if let Some(workspace) = existing.into_iter().next() {
            let account = self.store.account_for(user_id, &workspace.id).await?;
            return match account {
                None => Err(CatalogError::authorization(format!(
                    "user {user_id} is not associated with workspace '{name}'"
                ))),
                Some(account) if !account.user_is_workspace_admin => {
                    Err(CatalogError::authorization(format!(
                        "user {user_id} is not an admin of workspace '{name}'"
                    )))
                }
                Some(_) => Ok(Resolved {
                    id: workspace.id,
                    created: false,
                }),
            };
        }

        let workspace = Workspace::new(name);
        let workspace_id = workspace.id.clone();
        self.store.put_workspace(workspace).await?;
        self.grant_founding_admin(user_id, &workspace_id).await?;

        Ok(Resolved {
            id: workspace_id,
            created: true,
        })
    }

    /// Grants the creating user the workspace's founding admin account.
    ///
    /// This is the one place a workspace gains its first admin; every
    /// workspace created through the orchestrator satisfies the
    /// at-least-one-admin invariant from birth.
    async fn grant_founding_admin(
        &self,
        user_id: &UserId,
        workspace_id: &WorkspaceId,
    ) -> Result<()> {
        let account = Account::new(user_id.clone(), workspace_id.clone(), true);
        tracing::info!(
            user = %user_id,
            workspace = %workspace_id,
            account = %account.id,
            "granting founding admin account"
        );
        self.store.put_account(account).await?;
        Ok(())
    }

    /// Resolves a path by normalized name within the workspace,
    /// creating it on a miss.
    ///
    /// The index miss doubles as the uniqueness check; a concurrent
    /// creator can still slip in between check and create (accepted
    /// race, see crate docs).
    ///
    /// # Errors
    ///
    /// `Dependency` on store failure.
    pub async fn resolve_path(
        &self,
        workspace_id: &WorkspaceId,
        name: &str,
    ) -> Result<Resolved<PathId>> {
        let normalized = normalize_name(name);

        if let Some(path) = self
            .store
            .path_by_normalized_name(workspace_id, &normalized)
            .await?
        {
            return Ok(Resolved {
                id: path.id,
                created: false,
            });
        }

        let path = Path::new(workspace_id.clone(), name, normalized);
        let path_id = path.id.clone();
        self.store.put_path(path).await?;
        Ok(Resolved {
            id: path_id,
            created: true,
        })
    }

    /// Resolves a component by name within the path, creating it on a
    /// miss with the denormalized workspace reference set.
    ///
    /// # Errors
    ///
    /// `Dependency` on store failure.
    pub async fn resolve_component(
        &self,
        workspace_id: &WorkspaceId,
        path_id: &PathId,
        name: &str,
    ) -> Result<Resolved<ComponentId>> {
        if let Some(component) = self.store.component_by_name(path_id, name).await? {
            return Ok(Resolved {
                id: component.id,
                created: false,
            });
        }

        let component = Component::new(workspace_id.clone(), path_id.clone(), name);
        let component_id = component.id.clone();
        self.store.put_component(component).await?;
        Ok(Resolved {
            id: component_id,
            created: true,
        })
    }

    /// Unconditionally appends one data row per entry. No dedup.
    ///
    /// # Errors
    ///
    /// `Dependency` on store failure; rows written before the failure
    /// remain.
    pub async fn create_data_entries(
        &self,
        component_id: &ComponentId,
        workspace_id: &WorkspaceId,
        entries: Vec<DataEntryInput>,
        add_to_data_lake: bool,
    ) -> Result<Vec<DataId>> {
        let mut created = Vec::with_capacity(entries.len());
        for input in entries {
            let entry = DataEntry::new(
                component_id.clone(),
                workspace_id.clone(),
                input.data,
                input.data_map.unwrap_or_else(|| "{}".to_string()),
                add_to_data_lake,
            );
            created.push(entry.id.clone());
            self.store.put_data(entry).await?;
        }
        Ok(created)
    }

    /// Resolves the full hierarchy chain for the request and appends
    /// its data entries.
    ///
    /// Fails fast with `Validation` on empty required fields and
    /// `NotFound` when the admin user does not exist. Aborts without
    /// rollback on any downstream failure; partial creation is
    /// surfaced through the error, not silently retried.
    ///
    /// # Errors
    ///
    /// `Validation`, `NotFound`, `Authorization`, or `Dependency` as
    /// described above.
    pub async fn bulk_create(&self, request: BulkCreateRequest) -> Result<BulkCreateOutcome> {
        validate_request(&request)?;

        let user = self
            .store
            .find_user_by_email(&request.admin_email)
            .await?
            .ok_or_else(|| CatalogError::not_found("user", request.admin_email.clone()))?;
        tracing::info!(user = %user.id, email = %request.admin_email, "resolved admin user");

        let workspace = self
            .resolve_workspace(&user.id, &request.workspace_name)
            .await?;
        tracing::info!(
            workspace = %workspace.id,
            created = workspace.created,
            "workspace resolved"
        );

        let path = self.resolve_path(&workspace.id, &request.path_name).await?;
        tracing::info!(path = %path.id, created = path.created, "path resolved");

        let component = self
            .resolve_component(&workspace.id, &path.id, &request.component_name)
            .await?;
        tracing::info!(
            component = %component.id,
            created = component.created,
            "component resolved"
        );

        let created_data_ids = self
            .create_data_entries(
                &component.id,
                &workspace.id,
                request.entries,
                request.add_to_data_lake,
            )
            .await?;
        tracing::info!(count = created_data_ids.len(), "data entries created");

        Ok(BulkCreateOutcome {
            workspace_id: workspace.id,
            path_id: path.id,
            component_id: component.id,
            created_data_ids,
            workspace_created: workspace.created,
            path_created: path.created,
            component_created: component.created,
        })
    }
}

fn validate_request(request: &BulkCreateRequest) -> Result<()> {
    let required = [
        ("admin_email", &request.admin_email),
        ("workspace_name", &request.workspace_name),
        ("path_name", &request.path_name),
        ("component_name", &request.component_name),
    ];
    let missing: Vec<&str> = required
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| *field)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(CatalogError::validation(format!(
            "missing required fields: {}",
            missing.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::entity::User;
    use strata_core::store::MemoryStore;

    fn provisioner() -> (Arc<MemoryStore>, Provisioner) {
        let store = Arc::new(MemoryStore::new());
        let provisioner = Provisioner::new(store.clone());
        (store, provisioner)
    }

    #[tokio::test]
    async fn resolve_workspace_grants_founding_admin() {
        let (store, provisioner) = provisioner();
        let user = UserId::generate();

        let resolved = provisioner.resolve_workspace(&user, "Proj").await.unwrap();
        assert!(resolved.created);

        let account = store.account_for(&user, &resolved.id).await.unwrap();
        assert!(account.unwrap().user_is_workspace_admin);
    }

    #[tokio::test]
    async fn resolve_workspace_converges() {
        let (_, provisioner) = provisioner();
        let user = UserId::generate();

        let first = provisioner.resolve_workspace(&user, "Proj").await.unwrap();
        let second = provisioner.resolve_workspace(&user, "Proj").await.unwrap();
        assert_eq!(first.id, second.id);
        assert!(first.created);
        assert!(!second.created);
    }

    #[tokio::test]
    async fn non_admin_cannot_resolve_existing_workspace() {
        let (store, provisioner) = provisioner();
        let admin = UserId::generate();
        let member = UserId::generate();

        let ws = provisioner.resolve_workspace(&admin, "Proj").await.unwrap();
        store
            .put_account(Account::new(member.clone(), ws.id.clone(), false))
            .await
            .unwrap();

        let err = provisioner
            .resolve_workspace(&member, "Proj")
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Authorization { .. }));
    }

    #[tokio::test]
    async fn resolve_path_converges_on_normalized_name() {
        let (_, provisioner) = provisioner();
        let user = UserId::generate();
        let ws = provisioner.resolve_workspace(&user, "Proj").await.unwrap();

        let first = provisioner.resolve_path(&ws.id, "My Path").await.unwrap();
        let second = provisioner.resolve_path(&ws.id, "my path").await.unwrap();
        assert_eq!(first.id, second.id);
        assert!(first.created);
        assert!(!second.created);
    }

    #[tokio::test]
    async fn bulk_create_rejects_empty_fields() {
        let (_, provisioner) = provisioner();
        let err = provisioner
            .bulk_create(BulkCreateRequest {
                admin_email: "a@x.com".into(),
                workspace_name: "  ".into(),
                path_name: "Ingest".into(),
                component_name: "Raw".into(),
                entries: vec![],
                add_to_data_lake: true,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Validation { .. }));
    }

    #[tokio::test]
    async fn bulk_create_requires_existing_user() {
        let (_, provisioner) = provisioner();
        let err = provisioner
            .bulk_create(BulkCreateRequest {
                admin_email: "ghost@x.com".into(),
                workspace_name: "Proj".into(),
                path_name: "Ingest".into(),
                component_name: "Raw".into(),
                entries: vec![],
                add_to_data_lake: true,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::NotFound { entity: "user", .. }));
    }

    #[tokio::test]
    async fn bulk_create_appends_without_dedup() {
        let (store, provisioner) = provisioner();
        store.put_user(User::new("a@x.com")).await.unwrap();

        let entry = DataEntryInput {
            data: "{\"v\":1}".into(),
            data_map: None,
        };
        let outcome = provisioner
            .bulk_create(BulkCreateRequest {
                admin_email: "a@x.com".into(),
                workspace_name: "Proj".into(),
                path_name: "Ingest".into(),
                component_name: "Raw".into(),
                entries: vec![entry.clone(), entry],
                add_to_data_lake: true,
            })
            .await
            .unwrap();

        assert_eq!(outcome.created_data_ids.len(), 2);
        assert_ne!(outcome.created_data_ids[0], outcome.created_data_ids[1]);
    }
}
