//! Blob store abstraction for the analytical mirror.
//!
//! The catalog treats object storage as an opaque key/value blob API:
//! `put_blob` and `delete_blob` against a bucket. Keys follow the
//! layout `{workspace_name}/{path_name}/{component_name}/{data_id}.parquet`
//! and the resulting location is recorded back onto the data row as
//! `scheme://bucket/key`.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::RwLock;

use crate::error::{Error, Result};
use crate::id::DataId;

/// A parsed `scheme://bucket/key` blob location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobLocation {
    /// Storage scheme, e.g. `s3` or `mem`.
    pub scheme: String,
    /// Bucket name.
    pub bucket: String,
    /// Object key within the bucket.
    pub key: String,
}

impl BlobLocation {
    /// Builds a location from its parts.
    #[must_use]
    pub fn new(
        scheme: impl Into<String>,
        bucket: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            scheme: scheme.into(),
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for BlobLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}/{}", self.scheme, self.bucket, self.key)
    }
}

impl FromStr for BlobLocation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (scheme, rest) = s
            .split_once("://")
            .ok_or_else(|| Error::InvalidInput(format!("blob location '{s}' has no scheme")))?;
        let (bucket, key) = rest
            .split_once('/')
            .ok_or_else(|| Error::InvalidInput(format!("blob location '{s}' has no key")))?;
        if scheme.is_empty() || bucket.is_empty() || key.is_empty() {
            return Err(Error::InvalidInput(format!(
                "blob location '{s}' has empty parts"
            )));
        }
        Ok(Self::new(scheme, bucket, key))
    }
}

/// Formats the mirror key for a data entry.
#[must_use]
pub fn mirror_key(
    workspace_name: &str,
    path_name: &str,
    component_name: &str,
    data_id: &DataId,
) -> String {
    format!("{workspace_name}/{path_name}/{component_name}/{data_id}.parquet")
}

/// Opaque blob put/delete API over a single bucket namespace.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// The scheme used when rendering locations for this store.
    fn scheme(&self) -> &'static str;

    /// Writes an object. Overwrites any existing object at the key.
    async fn put_blob(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<()>;

    /// Deletes an object. Succeeds when the object is already absent.
    async fn delete_blob(&self, bucket: &str, key: &str) -> Result<()>;
}

/// A blob stored by [`MemoryBlobStore`].
#[derive(Debug, Clone)]
pub struct StoredBlob {
    /// Object bytes.
    pub body: Bytes,
    /// Content type recorded at write time.
    pub content_type: String,
}

/// In-memory blob store for tests and local tooling.
///
/// Supports failure injection per key so cascade and mirror tests can
/// exercise the best-effort deletion paths.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    objects: RwLock<HashMap<String, StoredBlob>>,
    fail_keys: RwLock<Vec<String>>,
}

impl MemoryBlobStore {
    /// Creates a new empty blob store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `{bucket}/{key}` so the next operation touching it fails.
    pub fn fail_on(&self, bucket: &str, key: &str) {
        if let Ok(mut keys) = self.fail_keys.write() {
            keys.push(format!("{bucket}/{key}"));
        }
    }

    /// Returns the stored object at `{bucket}/{key}`, if any.
    #[must_use]
    pub fn get(&self, bucket: &str, key: &str) -> Option<StoredBlob> {
        self.objects
            .read()
            .ok()
            .and_then(|o| o.get(&format!("{bucket}/{key}")).cloned())
    }

    /// Number of stored objects across all buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.read().map(|o| o.len()).unwrap_or(0)
    }

    /// Returns true when no objects are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_failure(&self, bucket: &str, key: &str) -> Result<()> {
        let full = format!("{bucket}/{key}");
        let failing = self
            .fail_keys
            .read()
            .map(|keys| keys.iter().any(|k| *k == full))
            .unwrap_or(false);
        if failing {
            return Err(Error::storage(format!("injected failure for {full}")));
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    fn scheme(&self) -> &'static str {
        "mem"
    }

    async fn put_blob(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<()> {
        self.check_failure(bucket, key)?;
        self.objects
            .write()
            .map_err(|_| Error::storage("lock poisoned"))?
            .insert(
                format!("{bucket}/{key}"),
                StoredBlob {
                    body,
                    content_type: content_type.to_string(),
                },
            );
        Ok(())
    }

    async fn delete_blob(&self, bucket: &str, key: &str) -> Result<()> {
        self.check_failure(bucket, key)?;
        self.objects
            .write()
            .map_err(|_| Error::storage("lock poisoned"))?
            .remove(&format!("{bucket}/{key}"));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_roundtrip() {
        let loc: BlobLocation = "s3://my-bucket/Proj/Ingest/Raw/data-1.parquet"
            .parse()
            .unwrap();
        assert_eq!(loc.bucket, "my-bucket");
        assert_eq!(loc.key, "Proj/Ingest/Raw/data-1.parquet");
        assert_eq!(
            loc.to_string(),
            "s3://my-bucket/Proj/Ingest/Raw/data-1.parquet"
        );
    }

    #[test]
    fn malformed_location_is_rejected() {
        assert!("no-scheme/bucket/key".parse::<BlobLocation>().is_err());
        assert!("s3://bucket-only".parse::<BlobLocation>().is_err());
    }

    #[tokio::test]
    async fn put_delete_roundtrip() {
        let store = MemoryBlobStore::new();
        store
            .put_blob("bucket", "a/b/c.parquet", Bytes::from("payload"), "application/json")
            .await
            .unwrap();
        assert_eq!(store.len(), 1);

        store.delete_blob("bucket", "a/b/c.parquet").await.unwrap();
        assert!(store.is_empty());

        // Deleting an absent object succeeds.
        store.delete_blob("bucket", "a/b/c.parquet").await.unwrap();
    }

    #[tokio::test]
    async fn injected_failures_surface_as_storage_errors() {
        let store = MemoryBlobStore::new();
        store.fail_on("bucket", "bad.parquet");
        let result = store
            .put_blob("bucket", "bad.parquet", Bytes::new(), "application/json")
            .await;
        assert!(result.is_err());
    }
}
