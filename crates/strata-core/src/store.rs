//! Hierarchy store abstraction over the backing document store.
//!
//! The trait exposes point get/put/delete per table, the full-table
//! scans tolerated for low-cardinality administrative lookups, and the
//! secondary-index queries the consistency engine depends on:
//!
//! - Account by `user_id`, by (`user_id`, `workspace_id`), and by
//!   `workspace_id`
//! - Path by (`workspace_id`, `normalized_name`) and by `workspace_id`
//! - Component by (`path_id`, `name`), by `path_id`, and by
//!   `workspace_id`
//! - Data by `component_id` and by `workspace_id`
//!
//! Paged queries surface a [`PageToken`] for one-page callers; `*_all`
//! helpers follow tokens to exhaustion. Only single-row operations are
//! atomic; multi-row sequences built on top of this trait are not, and
//! callers recover from partial failure by re-running idempotent
//! operations.
//!
//! [`MemoryStore`] is the in-process implementation used by tests and
//! the admin tooling. Network adapters for managed document stores live
//! outside this repository and implement the same trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::entity::{Account, Component, DataEntry, Path, User, Workspace};
use crate::error::{Error, Result};
use crate::id::{AccountId, ComponentId, DataId, PathId, UserId, WorkspaceId};
use crate::page::{Page, PageToken};

/// Maximum number of rows a single batch delete call may remove.
///
/// Larger sets are split into sequential chunks; chunks are not
/// cross-chunk atomic.
pub const MAX_BATCH_DELETE: usize = 25;

/// Uniform access to the entity tables and their secondary indexes.
///
/// Implementations must make single-row `put`/`delete` atomic and
/// `delete` idempotent (deleting an absent row succeeds).
#[async_trait]
pub trait HierarchyStore: Send + Sync {
    // --- users -----------------------------------------------------------

    /// Point-reads a user row.
    async fn get_user(&self, id: &UserId) -> Result<Option<User>>;

    /// Writes a user row, overwriting any existing row with the same ID.
    async fn put_user(&self, user: User) -> Result<()>;

    /// Deletes a user row. No-op when absent.
    async fn delete_user(&self, id: &UserId) -> Result<()>;

    /// Finds a user by email. Full-table scan; tolerated because the
    /// user table is low-cardinality and this is an administrative path.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    // --- accounts --------------------------------------------------------

    /// Point-reads an account row.
    async fn get_account(&self, id: &AccountId) -> Result<Option<Account>>;

    /// Writes an account row.
    async fn put_account(&self, account: Account) -> Result<()>;

    /// Deletes an account row. No-op when absent.
    async fn delete_account(&self, id: &AccountId) -> Result<()>;

    /// All accounts linking `user_id` to any workspace.
    async fn accounts_by_user(&self, user_id: &UserId) -> Result<Vec<Account>>;

    /// The at-most-one account linking `user_id` to `workspace_id`.
    async fn account_for(
        &self,
        user_id: &UserId,
        workspace_id: &WorkspaceId,
    ) -> Result<Option<Account>>;

    /// All accounts attached to `workspace_id`.
    async fn accounts_by_workspace(&self, workspace_id: &WorkspaceId) -> Result<Vec<Account>>;

    /// Deletes account rows in chunks of [`MAX_BATCH_DELETE`].
    async fn batch_delete_accounts(&self, ids: &[AccountId]) -> Result<()>;

    // --- workspaces ------------------------------------------------------

    /// Point-reads a workspace row.
    async fn get_workspace(&self, id: &WorkspaceId) -> Result<Option<Workspace>>;

    /// Writes a workspace row.
    async fn put_workspace(&self, workspace: Workspace) -> Result<()>;

    /// Deletes a workspace row. No-op when absent.
    async fn delete_workspace(&self, id: &WorkspaceId) -> Result<()>;

    /// All workspaces. Full-table scan reserved for the reconciler and
    /// administrative tooling.
    async fn list_workspaces(&self) -> Result<Vec<Workspace>>;

    /// All workspaces with exactly this display name. Full-table scan;
    /// workspace count is expected small (known scaling limit).
    async fn find_workspaces_by_name(&self, name: &str) -> Result<Vec<Workspace>>;

    // --- paths -----------------------------------------------------------

    /// Point-reads a path row.
    async fn get_path(&self, id: &PathId) -> Result<Option<Path>>;

    /// Writes a path row.
    async fn put_path(&self, path: Path) -> Result<()>;

    /// Deletes a path row. No-op when absent.
    async fn delete_path(&self, id: &PathId) -> Result<()>;

    /// The at-most-one path with this normalized name in the workspace.
    async fn path_by_normalized_name(
        &self,
        workspace_id: &WorkspaceId,
        normalized_name: &str,
    ) -> Result<Option<Path>>;

    /// One page of paths owned by `workspace_id`.
    async fn paths_by_workspace(
        &self,
        workspace_id: &WorkspaceId,
        limit: Option<usize>,
        token: Option<PageToken>,
    ) -> Result<Page<Path>>;

    /// All paths across all workspaces. Reconciler-only full scan.
    async fn list_paths(&self) -> Result<Vec<Path>>;

    /// Deletes path rows in chunks of [`MAX_BATCH_DELETE`].
    async fn batch_delete_paths(&self, ids: &[PathId]) -> Result<()>;

    // --- components ------------------------------------------------------

    /// Point-reads a component row.
    async fn get_component(&self, id: &ComponentId) -> Result<Option<Component>>;

    /// Writes a component row.
    async fn put_component(&self, component: Component) -> Result<()>;

    /// Deletes a component row. No-op when absent.
    async fn delete_component(&self, id: &ComponentId) -> Result<()>;

    /// The at-most-one component with this name in the path.
    async fn component_by_name(
        &self,
        path_id: &PathId,
        name: &str,
    ) -> Result<Option<Component>>;

    /// One page of components owned by `path_id`.
    async fn components_by_path(
        &self,
        path_id: &PathId,
        limit: Option<usize>,
        token: Option<PageToken>,
    ) -> Result<Page<Component>>;

    /// All components carrying this denormalized workspace reference.
    async fn components_by_workspace(
        &self,
        workspace_id: &WorkspaceId,
    ) -> Result<Vec<Component>>;

    /// All components across all workspaces. Reconciler-only full scan.
    async fn list_components(&self) -> Result<Vec<Component>>;

    /// Deletes component rows in chunks of [`MAX_BATCH_DELETE`].
    async fn batch_delete_components(&self, ids: &[ComponentId]) -> Result<()>;

    // --- data ------------------------------------------------------------

    /// Point-reads a data row.
    async fn get_data(&self, id: &DataId) -> Result<Option<DataEntry>>;

    /// Writes a data row.
    async fn put_data(&self, entry: DataEntry) -> Result<()>;

    /// Deletes a data row. No-op when absent.
    async fn delete_data(&self, id: &DataId) -> Result<()>;

    /// One page of data entries owned by `component_id`.
    async fn data_by_component(
        &self,
        component_id: &ComponentId,
        limit: Option<usize>,
        token: Option<PageToken>,
    ) -> Result<Page<DataEntry>>;

    /// All data entries carrying this denormalized workspace reference.
    async fn data_by_workspace(&self, workspace_id: &WorkspaceId) -> Result<Vec<DataEntry>>;

    /// Deletes data rows in chunks of [`MAX_BATCH_DELETE`].
    async fn batch_delete_data(&self, ids: &[DataId]) -> Result<()>;

    // --- provided all-pages helpers --------------------------------------

    /// All paths owned by `workspace_id`, following pages to exhaustion.
    async fn paths_by_workspace_all(&self, workspace_id: &WorkspaceId) -> Result<Vec<Path>> {
        let mut items = Vec::new();
        let mut token = None;
        loop {
            let page = self.paths_by_workspace(workspace_id, None, token).await?;
            items.extend(page.items);
            match page.next_token {
                Some(next) => token = Some(next),
                None => return Ok(items),
            }
        }
    }

    /// All components owned by `path_id`, following pages to exhaustion.
    async fn components_by_path_all(&self, path_id: &PathId) -> Result<Vec<Component>> {
        let mut items = Vec::new();
        let mut token = None;
        loop {
            let page = self.components_by_path(path_id, None, token).await?;
            items.extend(page.items);
            match page.next_token {
                Some(next) => token = Some(next),
                None => return Ok(items),
            }
        }
    }

    /// All data entries owned by `component_id`, following pages to
    /// exhaustion.
    async fn data_by_component_all(&self, component_id: &ComponentId) -> Result<Vec<DataEntry>> {
        let mut items = Vec::new();
        let mut token = None;
        loop {
            let page = self.data_by_component(component_id, None, token).await?;
            items.extend(page.items);
            match page.next_token {
                Some(next) => token = Some(next),
                None => return Ok(items),
            }
        }
    }
}

// ============================================================================
// MemoryStore
// ============================================================================

/// Serializable snapshot of every table in a [`MemoryStore`].
///
/// Used by the admin CLI to persist state between invocations and by
/// tests to seed fixtures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// User rows.
    #[serde(default)]
    pub users: Vec<User>,
    /// Account rows.
    #[serde(default)]
    pub accounts: Vec<Account>,
    /// Workspace rows.
    #[serde(default)]
    pub workspaces: Vec<Workspace>,
    /// Path rows.
    #[serde(default)]
    pub paths: Vec<Path>,
    /// Component rows.
    #[serde(default)]
    pub components: Vec<Component>,
    /// Data rows.
    #[serde(default)]
    pub data: Vec<DataEntry>,
}

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<String, User>,
    accounts: BTreeMap<String, Account>,
    workspaces: BTreeMap<String, Workspace>,
    paths: BTreeMap<String, Path>,
    components: BTreeMap<String, Component>,
    data: BTreeMap<String, DataEntry>,
}

/// In-memory hierarchy store.
///
/// Thread-safe via `RwLock`; tables are `BTreeMap`s keyed by ID so
/// paged queries have a stable order. Suitable for tests and the
/// file-backed admin tooling, not for production serving.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

/// Sorts by ID and applies limit/token pagination to pre-filtered rows.
fn paginate<T: Clone>(
    mut rows: Vec<(String, T)>,
    limit: Option<usize>,
    token: Option<&PageToken>,
) -> Result<Page<T>> {
    rows.sort_by(|a, b| a.0.cmp(&b.0));

    let start = match token {
        Some(t) => {
            let last = t.last_id()?;
            rows.partition_point(|(id, _)| *id <= last)
        }
        None => 0,
    };

    let remaining = &rows[start.min(rows.len())..];
    let take = limit.unwrap_or(remaining.len());
    let items: Vec<(String, T)> = remaining.iter().take(take).cloned().collect();

    let next_token = if items.len() < remaining.len() {
        items.last().map(|(id, _)| PageToken::after(id.clone()))
    } else {
        None
    };

    Ok(Page {
        items: items.into_iter().map(|(_, v)| v).collect(),
        next_token,
    })
}

impl MemoryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store pre-populated from a snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        let mut tables = Tables::default();
        for row in snapshot.users {
            tables.users.insert(row.id.as_str().to_string(), row);
        }
        for row in snapshot.accounts {
            tables.accounts.insert(row.id.as_str().to_string(), row);
        }
        for row in snapshot.workspaces {
            tables.workspaces.insert(row.id.as_str().to_string(), row);
        }
        for row in snapshot.paths {
            tables.paths.insert(row.id.as_str().to_string(), row);
        }
        for row in snapshot.components {
            tables.components.insert(row.id.as_str().to_string(), row);
        }
        for row in snapshot.data {
            tables.data.insert(row.id.as_str().to_string(), row);
        }
        Self {
            tables: RwLock::new(tables),
        }
    }

    /// Exports every table as a serializable snapshot.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the table lock is poisoned.
    pub fn snapshot(&self) -> Result<StoreSnapshot> {
        let tables = self.read()?;
        Ok(StoreSnapshot {
            users: tables.users.values().cloned().collect(),
            accounts: tables.accounts.values().cloned().collect(),
            workspaces: tables.workspaces.values().cloned().collect(),
            paths: tables.paths.values().cloned().collect(),
            components: tables.components.values().cloned().collect(),
            data: tables.data.values().cloned().collect(),
        })
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Tables>> {
        self.tables.read().map_err(|_| Error::storage("lock poisoned"))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| Error::storage("lock poisoned"))
    }
}

#[async_trait]
impl HierarchyStore for MemoryStore {
    async fn get_user(&self, id: &UserId) -> Result<Option<User>> {
        Ok(self.read()?.users.get(id.as_str()).cloned())
    }

    async fn put_user(&self, user: User) -> Result<()> {
        self.write()?
            .users
            .insert(user.id.as_str().to_string(), user);
        Ok(())
    }

    async fn delete_user(&self, id: &UserId) -> Result<()> {
        self.write()?.users.remove(id.as_str());
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn get_account(&self, id: &AccountId) -> Result<Option<Account>> {
        Ok(self.read()?.accounts.get(id.as_str()).cloned())
    }

    async fn put_account(&self, account: Account) -> Result<()> {
        self.write()?
            .accounts
            .insert(account.id.as_str().to_string(), account);
        Ok(())
    }

    async fn delete_account(&self, id: &AccountId) -> Result<()> {
        self.write()?.accounts.remove(id.as_str());
        Ok(())
    }

    async fn accounts_by_user(&self, user_id: &UserId) -> Result<Vec<Account>> {
        Ok(self
            .read()?
            .accounts
            .values()
            .filter(|a| a.user_id == *user_id)
            .cloned()
            .collect())
    }

    async fn account_for(
        &self,
        user_id: &UserId,
        workspace_id: &WorkspaceId,
    ) -> Result<Option<Account>> {
        Ok(self
            .read()?
            .accounts
            .values()
            .find(|a| a.user_id == *user_id && a.workspace_id == *workspace_id)
            .cloned())
    }

    async fn accounts_by_workspace(&self, workspace_id: &WorkspaceId) -> Result<Vec<Account>> {
        Ok(self
            .read()?
            .accounts
            .values()
            .filter(|a| a.workspace_id == *workspace_id)
            .cloned()
            .collect())
    }

    async fn batch_delete_accounts(&self, ids: &[AccountId]) -> Result<()> {
        for chunk in ids.chunks(MAX_BATCH_DELETE) {
            let mut tables = self.write()?;
            for id in chunk {
                tables.accounts.remove(id.as_str());
            }
        }
        Ok(())
    }

    async fn get_workspace(&self, id: &WorkspaceId) -> Result<Option<Workspace>> {
        Ok(self.read()?.workspaces.get(id.as_str()).cloned())
    }

    async fn put_workspace(&self, workspace: Workspace) -> Result<()> {
        self.write()?
            .workspaces
            .insert(workspace.id.as_str().to_string(), workspace);
        Ok(())
    }

    async fn delete_workspace(&self, id: &WorkspaceId) -> Result<()> {
        self.write()?.workspaces.remove(id.as_str());
        Ok(())
    }

    async fn list_workspaces(&self) -> Result<Vec<Workspace>> {
        Ok(self.read()?.workspaces.values().cloned().collect())
    }

    async fn find_workspaces_by_name(&self, name: &str) -> Result<Vec<Workspace>> {
        Ok(self
            .read()?
            .workspaces
            .values()
            .filter(|w| w.name == name)
            .cloned()
            .collect())
    }

    async fn get_path(&self, id: &PathId) -> Result<Option<Path>> {
        Ok(self.read()?.paths.get(id.as_str()).cloned())
    }

    async fn put_path(&self, path: Path) -> Result<()> {
        self.write()?
            .paths
            .insert(path.id.as_str().to_string(), path);
        Ok(())
    }

    async fn delete_path(&self, id: &PathId) -> Result<()> {
        self.write()?.paths.remove(id.as_str());
        Ok(())
    }

    async fn path_by_normalized_name(
        &self,
        workspace_id: &WorkspaceId,
        normalized_name: &str,
    ) -> Result<Option<Path>> {
        Ok(self
            .read()?
            .paths
            .values()
            .find(|p| p.workspace_id == *workspace_id && p.normalized_name == normalized_name)
            .cloned())
    }

    async fn paths_by_workspace(
        &self,
        workspace_id: &WorkspaceId,
        limit: Option<usize>,
        token: Option<PageToken>,
    ) -> Result<Page<Path>> {
        let rows: Vec<(String, Path)> = self
            .read()?
            .paths
            .values()
            .filter(|p| p.workspace_id == *workspace_id)
            .map(|p| (p.id.as_str().to_string(), p.clone()))
            .collect();
        paginate(rows, limit, token.as_ref())
    }

    async fn list_paths(&self) -> Result<Vec<Path>> {
        Ok(self.read()?.paths.values().cloned().collect())
    }

    async fn batch_delete_paths(&self, ids: &[PathId]) -> Result<()> {
        for chunk in ids.chunks(MAX_BATCH_DELETE) {
            let mut tables = self.write()?;
            for id in chunk {
                tables.paths.remove(id.as_str());
            }
        }
        Ok(())
    }

    async fn get_component(&self, id: &ComponentId) -> Result<Option<Component>> {
        Ok(self.read()?.components.get(id.as_str()).cloned())
    }

    async fn put_component(&self, component: Component) -> Result<()> {
        self.write()?
            .components
            .insert(component.id.as_str().to_string(), component);
        Ok(())
    }

    async fn delete_component(&self, id: &ComponentId) -> Result<()> {
        self.write()?.components.remove(id.as_str());
        Ok(())
    }

    async fn component_by_name(
        &self,
        path_id: &PathId,
        name: &str,
    ) -> Result<Option<Component>> {
        Ok(self
            .read()?
            .components
            .values()
            .find(|c| c.path_id == *path_id && c.name == name)
            .cloned())
    }

    async fn components_by_path(
        &self,
        path_id: &PathId,
        limit: Option<usize>,
        token: Option<PageToken>,
    ) -> Result<Page<Component>> {
        let rows: Vec<(String, Component)> = self
            .read()?
            .components
            .values()
            .filter(|c| c.path_id == *path_id)
            .map(|c| (c.id.as_str().to_string(), c.clone()))
            .collect();
        paginate(rows, limit, token.as_ref())
    }

    async fn components_by_workspace(
        &self,
        workspace_id: &WorkspaceId,
    ) -> Result<Vec<Component>> {
        Ok(self
            .read()?
            .components
            .values()
            .filter(|c| c.workspace_id == *workspace_id)
            .cloned()
            .collect())
    }

    async fn list_components(&self) -> Result<Vec<Component>> {
        Ok(self.read()?.components.values().cloned().collect())
    }

    async fn batch_delete_components(&self, ids: &[ComponentId]) -> Result<()> {
        for chunk in ids.chunks(MAX_BATCH_DELETE) {
            let mut tables = self.write()?;
            for id in chunk {
                tables.components.remove(id.as_str());
            }
        }
        Ok(())
    }

    async fn get_data(&self, id: &DataId) -> Result<Option<DataEntry>> {
        Ok(self.read()?.data.get(id.as_str()).cloned())
    }

    async fn put_data(&self, entry: DataEntry) -> Result<()> {
        self.write()?
            .data
            .insert(entry.id.as_str().to_string(), entry);
        Ok(())
    }

    async fn delete_data(&self, id: &DataId) -> Result<()> {
        self.write()?.data.remove(id.as_str());
        Ok(())
    }

    async fn data_by_component(
        &self,
        component_id: &ComponentId,
        limit: Option<usize>,
        token: Option<PageToken>,
    ) -> Result<Page<DataEntry>> {
        let rows: Vec<(String, DataEntry)> = self
            .read()?
            .data
            .values()
            .filter(|d| d.component_id == *component_id)
            .map(|d| (d.id.as_str().to_string(), d.clone()))
            .collect();
        paginate(rows, limit, token.as_ref())
    }

    async fn data_by_workspace(&self, workspace_id: &WorkspaceId) -> Result<Vec<DataEntry>> {
        Ok(self
            .read()?
            .data
            .values()
            .filter(|d| d.workspace_id == *workspace_id)
            .cloned()
            .collect())
    }

    async fn batch_delete_data(&self, ids: &[DataId]) -> Result<()> {
        for chunk in ids.chunks(MAX_BATCH_DELETE) {
            let mut tables = self.write()?;
            for id in chunk {
                tables.data.remove(id.as_str());
            }
        }
        Ok(())
    }
}
