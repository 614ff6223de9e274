//! Blob mirror: settles analytical copies of data entries.
//!
//! The mirror is an asynchronously-settled derived artifact. A data
//! row commits first; the mirror write follows off the change feed and
//! records the resulting location back onto the row. A row may
//! transiently exist with no location, and the mirror is never
//! transactionally coupled to row creation.
//!
//! Removal is fire-and-forget relative to the row delete: a failed
//! blob delete is logged and the row stays gone.

use bytes::Bytes;
use std::sync::Arc;

use strata_core::blob::{BlobLocation, BlobStore, mirror_key};
use strata_core::entity::DataEntry;
use strata_core::store::HierarchyStore;

use crate::error::{CatalogError, Result};
use crate::stream::{ChangeKind, ChangeRecord, EntityImage};

/// Mirrors data entry payloads into blob storage.
#[derive(Clone)]
pub struct DataMirror {
    store: Arc<dyn HierarchyStore>,
    blobs: Arc<dyn BlobStore>,
    bucket: String,
}

impl DataMirror {
    /// Creates a mirror writing into `bucket`.
    #[must_use]
    pub fn new(
        store: Arc<dyn HierarchyStore>,
        blobs: Arc<dyn BlobStore>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            store,
            blobs,
            bucket: bucket.into(),
        }
    }

    /// Resolves the workspace, path, and component display names for a
    /// component, walking the true ownership chain.
    ///
    /// # Errors
    ///
    /// `NotFound` when any link of the chain is missing — exactly the
    /// orphan condition, which the reconciler repairs.
    async fn entity_names(
        &self,
        entry: &DataEntry,
    ) -> Result<(String, String, String)> {
        let component = self
            .store
            .get_component(&entry.component_id)
            .await?
            .ok_or_else(|| CatalogError::not_found("component", entry.component_id.as_str()))?;
        let path = self
            .store
            .get_path(&component.path_id)
            .await?
            .ok_or_else(|| CatalogError::not_found("path", component.path_id.as_str()))?;
        let workspace = self
            .store
            .get_workspace(&path.workspace_id)
            .await?
            .ok_or_else(|| CatalogError::not_found("workspace", path.workspace_id.as_str()))?;
        Ok((workspace.name, path.name, component.name))
    }

    /// Writes the entry's payload to blob storage and records the
    /// location back onto the row.
    ///
    /// Entries with `add_to_data_lake = false` are skipped silently.
    ///
    /// # Errors
    ///
    /// `NotFound` when the ownership chain is broken; `Dependency`
    /// when the blob write or the row update fails.
    pub async fn mirror(&self, entry: &DataEntry) -> Result<Option<BlobLocation>> {
        if !entry.add_to_data_lake {
            tracing::debug!(data = %entry.id, "mirroring not requested, skipping");
            return Ok(None);
        }

        let (workspace_name, path_name, component_name) = self.entity_names(entry).await?;
        let key = mirror_key(&workspace_name, &path_name, &component_name, &entry.id);

        self.blobs
            .put_blob(
                &self.bucket,
                &key,
                Bytes::from(entry.data.clone()),
                "application/json",
            )
            .await?;

        let location = BlobLocation::new(self.blobs.scheme(), self.bucket.clone(), key);
        let updated = entry.clone().with_blob_location(location.to_string());
        self.store.put_data(updated).await?;

        tracing::info!(data = %entry.id, location = %location, "mirrored data entry");
        Ok(Some(location))
    }

    /// Best-effort removal of the entry's blob mirror.
    ///
    /// Skips entries that opted out of lake deletion or never settled
    /// a location. Blob failures are logged, never raised.
    pub async fn unmirror(&self, entry: &DataEntry) {
        if !entry.delete_in_data_lake {
            tracing::debug!(data = %entry.id, "lake deletion not requested, skipping");
            return;
        }
        let Some(raw) = entry.blob_location.as_deref() else {
            tracing::debug!(data = %entry.id, "no blob location recorded, nothing to delete");
            return;
        };
        let location: BlobLocation = match raw.parse() {
            Ok(loc) => loc,
            Err(err) => {
                tracing::warn!(data = %entry.id, location = raw, error = %err,
                    "unparseable blob location, skipping delete");
                return;
            }
        };
        match self
            .blobs
            .delete_blob(&location.bucket, &location.key)
            .await
        {
            Ok(()) => tracing::info!(data = %entry.id, location = %location, "deleted blob mirror"),
            Err(err) => tracing::warn!(data = %entry.id, location = %location, error = %err,
                "blob mirror delete failed"),
        }
    }

    /// Applies a batch of change-feed records.
    ///
    /// `Insert` of a data row mirrors it; `Remove` unmirrors it; all
    /// other records are ignored. Per-record errors are logged and the
    /// batch continues — the mirror does not use the feed's retry.
    pub async fn apply(&self, records: Vec<ChangeRecord>) {
        for record in records {
            match (record.kind, record.new_image, record.old_image) {
                (ChangeKind::Insert, Some(EntityImage::Data(entry)), _) => {
                    if let Err(err) = self.mirror(&entry).await {
                        tracing::error!(data = %entry.id, error = %err,
                            "mirror write failed, continuing batch");
                    }
                }
                (ChangeKind::Remove, _, Some(EntityImage::Data(entry))) => {
                    self.unmirror(&entry).await;
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::blob::MemoryBlobStore;
    use strata_core::entity::{Component, Path, Workspace};
    use strata_core::id::{PathId, WorkspaceId};
    use strata_core::store::MemoryStore;

    async fn seeded() -> (Arc<MemoryStore>, Arc<MemoryBlobStore>, DataMirror, DataEntry) {
        let store = Arc::new(MemoryStore::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        let mirror = DataMirror::new(store.clone(), blobs.clone(), "lake");

        let ws = Workspace::new("Proj");
        let path = Path::new(ws.id.clone(), "Ingest", "ingest");
        let comp = Component::new(ws.id.clone(), path.id.clone(), "Raw");
        let entry = DataEntry::new(comp.id.clone(), ws.id.clone(), "{\"v\":1}", "{}", true);

        store.put_workspace(ws).await.unwrap();
        store.put_path(path).await.unwrap();
        store.put_component(comp).await.unwrap();
        store.put_data(entry.clone()).await.unwrap();

        (store, blobs, mirror, entry)
    }

    #[tokio::test]
    async fn mirror_writes_blob_and_records_location() {
        let (store, blobs, mirror, entry) = seeded().await;

        let location = mirror.mirror(&entry).await.unwrap().unwrap();
        assert_eq!(location.bucket, "lake");
        assert_eq!(
            location.key,
            format!("Proj/Ingest/Raw/{}.parquet", entry.id)
        );
        assert!(blobs.get("lake", &location.key).is_some());

        let row = store.get_data(&entry.id).await.unwrap().unwrap();
        assert_eq!(row.blob_location, Some(location.to_string()));
    }

    #[tokio::test]
    async fn mirror_skips_opted_out_entries() {
        let (store, blobs, mirror, mut entry) = seeded().await;
        entry.add_to_data_lake = false;
        store.put_data(entry.clone()).await.unwrap();

        assert!(mirror.mirror(&entry).await.unwrap().is_none());
        assert!(blobs.is_empty());
    }

    #[tokio::test]
    async fn mirror_reports_broken_chain_as_not_found() {
        let (store, _, mirror, entry) = seeded().await;
        store.delete_component(&entry.component_id).await.unwrap();

        let err = mirror.mirror(&entry).await.unwrap_err();
        assert!(matches!(err, CatalogError::NotFound { entity: "component", .. }));
    }

    #[tokio::test]
    async fn unmirror_is_best_effort() {
        let (_, blobs, mirror, entry) = seeded().await;
        let location = mirror.mirror(&entry).await.unwrap().unwrap();
        let settled = entry.with_blob_location(location.to_string());

        blobs.fail_on("lake", &location.key);
        // Must not panic or error out even though the delete fails.
        mirror.unmirror(&settled).await;
        assert!(blobs.get("lake", &location.key).is_some());
    }

    #[tokio::test]
    async fn apply_handles_inserts_and_removals() {
        let (store, blobs, mirror, entry) = seeded().await;

        mirror
            .apply(vec![ChangeRecord::insertion(EntityImage::Data(
                entry.clone(),
            ))])
            .await;
        let settled = store.get_data(&entry.id).await.unwrap().unwrap();
        assert!(settled.blob_location.is_some());
        assert_eq!(blobs.len(), 1);

        mirror
            .apply(vec![ChangeRecord::removal(EntityImage::Data(settled))])
            .await;
        assert!(blobs.is_empty());

        // Unrelated images are ignored.
        mirror
            .apply(vec![ChangeRecord::removal(EntityImage::Component(
                Component::new(WorkspaceId::generate(), PathId::generate(), "X"),
            ))])
            .await;
    }
}
