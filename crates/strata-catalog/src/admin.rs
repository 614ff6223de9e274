//! Administrative operations on users and accounts.
//!
//! These back operator tooling rather than the self-service write
//! path. User creation provisions the external identity first, so a
//! provider failure leaves no catalog row behind; the reverse order
//! would strand a user who cannot log in.

use std::sync::Arc;

use strata_core::entity::{Account, User, Workspace};
use strata_core::id::WorkspaceId;
use strata_core::store::HierarchyStore;

use crate::error::{CatalogError, Result};
use crate::identity::IdentityProvider;

/// Outcome of a user creation.
#[derive(Debug, Clone)]
pub struct CreatedUser {
    /// The new user row.
    pub user: User,
    /// The external username assigned by the identity provider.
    pub external_username: String,
    /// The personal workspace, when one was requested.
    pub workspace: Option<Workspace>,
}

/// Outcome of a batch account grant or promotion.
#[derive(Debug, Clone, Default)]
pub struct AccountChanges {
    /// Workspace IDs where a row was created or updated.
    pub changed: Vec<WorkspaceId>,
    /// Workspace IDs skipped with the reason.
    pub skipped: Vec<(WorkspaceId, String)>,
}

/// Operator-facing user and account management.
#[derive(Clone)]
pub struct AdminOps {
    store: Arc<dyn HierarchyStore>,
    identity: Arc<dyn IdentityProvider>,
}

impl AdminOps {
    /// Creates admin operations over the given store and identity
    /// provider.
    #[must_use]
    pub fn new(store: Arc<dyn HierarchyStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { store, identity }
    }

    /// Creates a user, provisioning the external identity first.
    ///
    /// When `with_workspace` is set, a personal workspace named after
    /// the email's local part is created and the user granted founding
    /// admin on it.
    ///
    /// # Errors
    ///
    /// `Conflict` when a user with this email already exists,
    /// `Dependency` when identity provisioning or a row write fails.
    pub async fn create_user(&self, email: &str, with_workspace: bool) -> Result<CreatedUser> {
        let email = email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(CatalogError::validation(format!(
                "invalid email '{email}'"
            )));
        }
        if self.store.find_user_by_email(email).await?.is_some() {
            return Err(CatalogError::conflict(format!(
                "user with email '{email}' already exists"
            )));
        }

        // Identity first: a provider failure must not leave a catalog
        // row for a user who cannot log in.
        let external_username = self.identity.create_identity(email).await?;
        tracing::info!(email, external_username, "provisioned external identity");

        let user = User::new(email);
        self.store.put_user(user.clone()).await?;

        let workspace = if with_workspace {
            let name = email.split('@').next().unwrap_or(email);
            let workspace = Workspace::new(name);
            self.store.put_workspace(workspace.clone()).await?;
            self.store
                .put_account(Account::new(user.id.clone(), workspace.id.clone(), true))
                .await?;
            tracing::info!(user = %user.id, workspace = %workspace.id, "created personal workspace");
            Some(workspace)
        } else {
            None
        };

        tracing::info!(user = %user.id, email, "created user");
        Ok(CreatedUser {
            user,
            external_username,
            workspace,
        })
    }

    /// Grants the user accounts on the given workspaces.
    ///
    /// Unknown workspaces and existing accounts are skipped and
    /// reported, not treated as errors; re-running converges.
    ///
    /// # Errors
    ///
    /// `NotFound` when no user has this email, `Dependency` when a
    /// lookup or write fails.
    pub async fn create_accounts(
        &self,
        email: &str,
        workspace_ids: &[WorkspaceId],
        as_admin: bool,
    ) -> Result<AccountChanges> {
        let user = self
            .store
            .find_user_by_email(email)
            .await?
            .ok_or_else(|| CatalogError::not_found("user", email))?;

        let mut changes = AccountChanges::default();
        for workspace_id in workspace_ids {
            if self.store.get_workspace(workspace_id).await?.is_none() {
                tracing::warn!(workspace = %workspace_id, "unknown workspace, skipping grant");
                changes
                    .skipped
                    .push((workspace_id.clone(), "workspace not found".into()));
                continue;
            }
            if let Some(existing) = self.store.account_for(&user.id, workspace_id).await? {
                tracing::debug!(account = %existing.id, "account already exists, skipping");
                changes
                    .skipped
                    .push((workspace_id.clone(), "account already exists".into()));
                continue;
            }
            self.store
                .put_account(Account::new(user.id.clone(), workspace_id.clone(), as_admin))
                .await?;
            tracing::info!(user = %user.id, workspace = %workspace_id, as_admin, "granted account");
            changes.changed.push(workspace_id.clone());
        }
        Ok(changes)
    }

    /// Promotes the user's existing accounts to admin on the given
    /// workspaces.
    ///
    /// Workspaces where the user holds no account are skipped and
    /// reported; already-admin accounts count as changed (the write is
    /// idempotent).
    ///
    /// # Errors
    ///
    /// `NotFound` when no user has this email, `Dependency` when a
    /// lookup or write fails.
    pub async fn promote_accounts(
        &self,
        email: &str,
        workspace_ids: &[WorkspaceId],
    ) -> Result<AccountChanges> {
        let user = self
            .store
            .find_user_by_email(email)
            .await?
            .ok_or_else(|| CatalogError::not_found("user", email))?;

        let mut changes = AccountChanges::default();
        for workspace_id in workspace_ids {
            match self.store.account_for(&user.id, workspace_id).await? {
                Some(account) => {
                    self.store.put_account(account.promoted()).await?;
                    tracing::info!(user = %user.id, workspace = %workspace_id, "promoted account");
                    changes.changed.push(workspace_id.clone());
                }
                None => {
                    tracing::warn!(user = %user.id, workspace = %workspace_id,
                        "no account to promote, skipping");
                    changes
                        .skipped
                        .push((workspace_id.clone(), "no account on workspace".into()));
                }
            }
        }
        Ok(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::MemoryIdentity;
    use strata_core::store::MemoryStore;

    fn ops() -> (Arc<MemoryStore>, Arc<MemoryIdentity>, AdminOps) {
        let store = Arc::new(MemoryStore::new());
        let identity = Arc::new(MemoryIdentity::new());
        let ops = AdminOps::new(store.clone(), identity.clone());
        (store, identity, ops)
    }

    #[tokio::test]
    async fn create_user_provisions_identity_and_personal_workspace() {
        let (store, identity, ops) = ops();

        let created = ops.create_user("ada@x.com", true).await.unwrap();
        assert_eq!(created.external_username, "ext-ada@x.com");
        assert!(identity.contains("ada@x.com"));

        let workspace = created.workspace.expect("personal workspace");
        assert_eq!(workspace.name, "ada");
        let account = store
            .account_for(&created.user.id, &workspace.id)
            .await
            .unwrap()
            .expect("founding account");
        assert!(account.user_is_workspace_admin);
    }

    #[tokio::test]
    async fn create_user_rejects_duplicates_and_bad_emails() {
        let (_, _, ops) = ops();
        ops.create_user("ada@x.com", false).await.unwrap();

        let err = ops.create_user("ada@x.com", false).await.unwrap_err();
        assert!(matches!(err, CatalogError::Conflict { .. }));

        let err = ops.create_user("not-an-email", false).await.unwrap_err();
        assert!(matches!(err, CatalogError::Validation { .. }));
    }

    #[tokio::test]
    async fn create_accounts_skips_unknown_and_existing() {
        let (store, _, ops) = ops();
        let created = ops.create_user("ada@x.com", false).await.unwrap();
        let ws = Workspace::new("Proj");
        store.put_workspace(ws.clone()).await.unwrap();
        let ghost = WorkspaceId::generate();

        let first = ops
            .create_accounts("ada@x.com", &[ws.id.clone(), ghost.clone()], false)
            .await
            .unwrap();
        assert_eq!(first.changed, vec![ws.id.clone()]);
        assert_eq!(first.skipped.len(), 1);
        assert_eq!(first.skipped[0].0, ghost);

        // Re-running grants nothing new.
        let second = ops
            .create_accounts("ada@x.com", &[ws.id.clone()], false)
            .await
            .unwrap();
        assert!(second.changed.is_empty());
        assert_eq!(second.skipped.len(), 1);

        let account = store
            .account_for(&created.user.id, &ws.id)
            .await
            .unwrap()
            .unwrap();
        assert!(!account.user_is_workspace_admin);
    }

    #[tokio::test]
    async fn promote_accounts_flips_admin_flag() {
        let (store, _, ops) = ops();
        let created = ops.create_user("ada@x.com", false).await.unwrap();
        let ws = Workspace::new("Proj");
        store.put_workspace(ws.clone()).await.unwrap();
        ops.create_accounts("ada@x.com", &[ws.id.clone()], false)
            .await
            .unwrap();

        let changes = ops
            .promote_accounts("ada@x.com", &[ws.id.clone(), WorkspaceId::generate()])
            .await
            .unwrap();
        assert_eq!(changes.changed, vec![ws.id.clone()]);
        assert_eq!(changes.skipped.len(), 1);

        let account = store
            .account_for(&created.user.id, &ws.id)
            .await
            .unwrap()
            .unwrap();
        assert!(account.user_is_workspace_admin);
    }
}
