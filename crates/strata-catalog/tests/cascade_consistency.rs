//! Cascade deletion and reconciliation consistency tests.
//!
//! Invariants exercised:
//!
//! 1. **Idempotence**: re-running any cascade on an already-deleted
//!    root is a no-op reporting zero deletions.
//! 2. **Blob failures never block row deletion**: an injected blob
//!    delete failure is counted and the catalog rows still go away.
//! 3. **Identity-first user deletion**: an identity-store failure
//!    aborts the user cascade before any catalog row is touched.
//! 4. **Admin removal destroys the workspace**: removing a sole
//!    admin's account through the targeted path takes the workspace
//!    and its subtree with it.
//! 5. **Sweep convergence**: after orphan repair, no data or component
//!    rows with broken ownership remain.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::Arc;

use strata_core::blob::MemoryBlobStore;
use strata_core::entity::{Account, User, Workspace};
use strata_core::store::{HierarchyStore, MemoryStore};

use strata_catalog::cascade::CascadeEngine;
use strata_catalog::error::CatalogError;
use strata_catalog::identity::{IdentityProvider, MemoryIdentity};
use strata_catalog::mirror::DataMirror;
use strata_catalog::provision::{BulkCreateOutcome, BulkCreateRequest, DataEntryInput, Provisioner};
use strata_catalog::reconciler::{OrphanReason, Reconciler};

struct Fixture {
    store: Arc<MemoryStore>,
    blobs: Arc<MemoryBlobStore>,
    identity: Arc<MemoryIdentity>,
    engine: CascadeEngine,
    provisioner: Provisioner,
    mirror: DataMirror,
}

impl Fixture {
    fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        let identity = Arc::new(MemoryIdentity::new());
        let engine = CascadeEngine::new(store.clone(), blobs.clone(), identity.clone());
        let provisioner = Provisioner::new(store.clone());
        let mirror = DataMirror::new(store.clone(), blobs.clone(), "lake");
        Self {
            store,
            blobs,
            identity,
            engine,
            provisioner,
            mirror,
        }
    }

    /// Creates a user and a fully populated workspace with `entries`
    /// mirrored data rows.
    async fn populated(&self, email: &str, entries: u32) -> BulkCreateOutcome {
        self.store.put_user(User::new(email)).await.unwrap();
        self.identity.create_identity(email).await.unwrap();

        let outcome = self
            .provisioner
            .bulk_create(BulkCreateRequest {
                admin_email: email.into(),
                workspace_name: "Analytics".into(),
                path_name: "Ingest".into(),
                component_name: "Raw".into(),
                entries: (0..entries)
                    .map(|v| DataEntryInput {
                        data: format!("{{\"v\":{v}}}"),
                        data_map: None,
                    })
                    .collect(),
                add_to_data_lake: true,
            })
            .await
            .unwrap();

        for entry in self
            .store
            .data_by_component_all(&outcome.component_id)
            .await
            .unwrap()
        {
            self.mirror.mirror(&entry).await.unwrap();
        }
        outcome
    }
}

#[tokio::test]
async fn workspace_cascade_removes_subtree_and_mirrors() {
    let fx = Fixture::new();
    let outcome = fx.populated("ada@x.com", 3).await;
    assert_eq!(fx.blobs.len(), 3);

    let summary = fx
        .engine
        .delete_workspace_cascade(&outcome.workspace_id)
        .await
        .unwrap();
    assert_eq!(summary.data_deleted, 3);
    assert_eq!(summary.components_deleted, 1);
    assert_eq!(summary.paths_deleted, 1);
    assert_eq!(summary.accounts_deleted, 1);
    assert_eq!(summary.workspaces_deleted, 1);
    assert_eq!(summary.blob_failures, 0);

    assert!(fx.blobs.is_empty());
    assert!(fx.store.list_paths().await.unwrap().is_empty());
    assert!(fx.store.list_components().await.unwrap().is_empty());
    // The user row survives; only the workspace subtree is destroyed.
    assert!(fx
        .store
        .find_user_by_email("ada@x.com")
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn cascades_are_idempotent() {
    let fx = Fixture::new();
    let outcome = fx.populated("ada@x.com", 2).await;

    fx.engine
        .delete_workspace_cascade(&outcome.workspace_id)
        .await
        .unwrap();
    let rerun = fx
        .engine
        .delete_workspace_cascade(&outcome.workspace_id)
        .await
        .unwrap();
    assert_eq!(rerun, Default::default());

    let comp_rerun = fx
        .engine
        .delete_component_cascade(&outcome.component_id)
        .await
        .unwrap();
    assert_eq!(comp_rerun, Default::default());
}

#[tokio::test]
async fn blob_failures_do_not_block_row_deletion() {
    let fx = Fixture::new();
    let outcome = fx.populated("ada@x.com", 2).await;

    // Break one of the two mirror deletes.
    let entries = fx
        .store
        .data_by_component_all(&outcome.component_id)
        .await
        .unwrap();
    let victim = entries[0].blob_location.as_deref().unwrap();
    let key = victim.split('/').skip(3).collect::<Vec<_>>().join("/");
    fx.blobs.fail_on("lake", &key);

    let summary = fx
        .engine
        .delete_workspace_cascade(&outcome.workspace_id)
        .await
        .unwrap();
    assert_eq!(summary.blob_failures, 1);
    assert_eq!(summary.data_deleted, 2);
    assert!(fx.store.list_components().await.unwrap().is_empty());
    // The failed blob is still there for a later sweep; the rows are gone.
    assert_eq!(fx.blobs.len(), 1);
}

#[tokio::test]
async fn identity_failure_aborts_user_cascade_before_any_mutation() {
    let fx = Fixture::new();
    let outcome = fx.populated("ada@x.com", 2).await;

    fx.identity.fail_deletes();
    let err = fx.engine.delete_user_cascade("ada@x.com").await.unwrap_err();
    assert!(matches!(err, CatalogError::FatalConsistency { .. }));

    // Nothing was touched: user, workspace, data, and blobs all intact.
    assert!(fx
        .store
        .find_user_by_email("ada@x.com")
        .await
        .unwrap()
        .is_some());
    assert!(fx
        .store
        .get_workspace(&outcome.workspace_id)
        .await
        .unwrap()
        .is_some());
    assert_eq!(
        fx.store
            .data_by_component_all(&outcome.component_id)
            .await
            .unwrap()
            .len(),
        2
    );
    assert_eq!(fx.blobs.len(), 2);
}

#[tokio::test]
async fn user_cascade_destroys_administered_workspaces_only() {
    let fx = Fixture::new();
    let outcome = fx.populated("ada@x.com", 1).await;

    // Ada is also a plain member of Mel's workspace.
    fx.store.put_user(User::new("mel@x.com")).await.unwrap();
    let mel = fx
        .store
        .find_user_by_email("mel@x.com")
        .await
        .unwrap()
        .unwrap();
    let other = Workspace::new("Mel Space");
    fx.store.put_workspace(other.clone()).await.unwrap();
    fx.store
        .put_account(Account::new(mel.id.clone(), other.id.clone(), true))
        .await
        .unwrap();
    let ada = fx
        .store
        .find_user_by_email("ada@x.com")
        .await
        .unwrap()
        .unwrap();
    fx.store
        .put_account(Account::new(ada.id.clone(), other.id.clone(), false))
        .await
        .unwrap();

    let summary = fx.engine.delete_user_cascade("ada@x.com").await.unwrap();
    assert_eq!(summary.workspaces_deleted, 1);
    // One account died with the workspace, one was Ada's member link.
    assert_eq!(summary.accounts_deleted, 2);

    assert!(fx
        .store
        .find_user_by_email("ada@x.com")
        .await
        .unwrap()
        .is_none());
    assert!(fx
        .store
        .get_workspace(&outcome.workspace_id)
        .await
        .unwrap()
        .is_none());
    // Mel's workspace and admin account survive.
    assert!(fx.store.get_workspace(&other.id).await.unwrap().is_some());
    assert_eq!(
        fx.store.accounts_by_workspace(&other.id).await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn removing_sole_admin_account_destroys_the_workspace() {
    let fx = Fixture::new();
    let outcome = fx.populated("ada@x.com", 1).await;

    let summary = fx
        .engine
        .delete_specific_accounts("ada@x.com", &[outcome.workspace_id.clone()])
        .await
        .unwrap();
    assert_eq!(summary.workspaces_deleted, 1);
    assert_eq!(summary.data_deleted, 1);

    assert!(fx
        .store
        .get_workspace(&outcome.workspace_id)
        .await
        .unwrap()
        .is_none());
    // The user itself is untouched by the targeted path.
    assert!(fx
        .store
        .find_user_by_email("ada@x.com")
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn sweep_repairs_orphans_and_converges() {
    let fx = Fixture::new();
    let outcome = fx.populated("ada@x.com", 2).await;
    let reconciler = Reconciler::new(fx.store.clone(), fx.engine.clone());

    // Sever the ownership chain: drop the path row out from under the
    // component, simulating a crashed partial cascade.
    fx.store.delete_path(&outcome.path_id).await.unwrap();

    let report = reconciler.sweep_dry_run().await.unwrap();
    assert!(report.has_orphans());
    assert_eq!(report.orphaned_components.len(), 1);
    assert_eq!(
        report.orphaned_components[0].reason,
        OrphanReason::UnknownPath
    );

    let result = reconciler.sweep().await.unwrap();
    assert!(result.errors.is_empty());
    assert_eq!(result.summary.components_deleted, 1);
    assert_eq!(result.summary.data_deleted, 2);
    assert!(fx.blobs.is_empty());

    // Second sweep finds a clean catalog.
    let clean = reconciler.sweep_dry_run().await.unwrap();
    assert!(!clean.has_orphans());
}

#[tokio::test]
async fn sweep_removes_adminless_workspaces() {
    let fx = Fixture::new();
    let outcome = fx.populated("ada@x.com", 1).await;
    let reconciler = Reconciler::new(fx.store.clone(), fx.engine.clone());

    // Demote the sole admin behind the catalog's back.
    let accounts = fx
        .store
        .accounts_by_workspace(&outcome.workspace_id)
        .await
        .unwrap();
    let mut account = accounts.into_iter().next().unwrap();
    account.user_is_workspace_admin = false;
    fx.store.put_account(account).await.unwrap();

    let result = reconciler.sweep().await.unwrap();
    assert_eq!(result.report.orphaned_workspaces.len(), 1);
    assert_eq!(result.summary.workspaces_deleted, 1);
    assert!(fx
        .store
        .get_workspace(&outcome.workspace_id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn skipping_blob_deletion_leaves_mirrors_in_place() {
    let fx = Fixture::new();
    let outcome = fx.populated("ada@x.com", 2).await;

    let engine = fx.engine.clone().with_blob_deletion(false);
    let summary = engine
        .delete_workspace_cascade(&outcome.workspace_id)
        .await
        .unwrap();
    assert_eq!(summary.data_deleted, 2);
    assert_eq!(summary.blob_failures, 0);
    assert_eq!(fx.blobs.len(), 2);
}
