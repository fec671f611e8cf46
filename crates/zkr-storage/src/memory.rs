//! # In-Memory Store Doubles
//!
//! Gateway implementations backed by `parking_lot`-guarded maps, with
//! failure injection for exercising the degrade and conflict paths. All
//! operations are synchronous under the hood (the locks are never held
//! across an `.await`), so the doubles are safe to share across tasks.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{BlobStoreError, RecordStoreError};
use crate::traits::{BlobStore, RecordStore};
use crate::types::{BlobEntry, ContributionRow, SignedUrl};

/// In-memory blob store double.
///
/// Cloning shares the underlying map, so a test can hold one handle and
/// hand another to the component under test.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    inner: Arc<Mutex<MemoryBlobInner>>,
}

#[derive(Debug, Default)]
struct MemoryBlobInner {
    objects: BTreeMap<String, Vec<u8>>,
    unavailable: bool,
}

impl MemoryBlobStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle outage mode: while set, every operation fails with
    /// [`BlobStoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.lock().unavailable = unavailable;
    }

    /// Seed an object directly, bypassing the trait surface.
    pub fn put(&self, path: impl Into<String>, bytes: Vec<u8>) {
        self.inner.lock().objects.insert(path.into(), bytes);
    }

    /// Whether an object exists at `path`.
    pub fn contains(&self, path: &str) -> bool {
        self.inner.lock().objects.contains_key(path)
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.inner.lock().objects.len()
    }

    /// Whether the store holds no objects.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(&self) -> Result<(), BlobStoreError> {
        if self.inner.lock().unavailable {
            Err(BlobStoreError::Unavailable("injected outage".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn list(&self, prefix: &str) -> Result<Vec<BlobEntry>, BlobStoreError> {
        self.check_available()?;
        let dir = format!("{}/", prefix.trim_end_matches('/'));
        let inner = self.inner.lock();
        Ok(inner
            .objects
            .keys()
            .filter_map(|path| {
                let rest = path.strip_prefix(&dir)?;
                // Direct children only; nested paths belong to sub-listings.
                if rest.contains('/') {
                    None
                } else {
                    Some(BlobEntry::named(rest))
                }
            })
            .collect())
    }

    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        overwrite: bool,
    ) -> Result<(), BlobStoreError> {
        self.check_available()?;
        let mut inner = self.inner.lock();
        if !overwrite && inner.objects.contains_key(path) {
            return Err(BlobStoreError::AlreadyExists {
                path: path.to_string(),
            });
        }
        inner.objects.insert(path.to_string(), bytes);
        Ok(())
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>, BlobStoreError> {
        self.check_available()?;
        self.inner
            .lock()
            .objects
            .get(path)
            .cloned()
            .ok_or_else(|| BlobStoreError::NotFound {
                path: path.to_string(),
            })
    }

    async fn signed_download_url(
        &self,
        path: &str,
        ttl: Duration,
    ) -> Result<SignedUrl, BlobStoreError> {
        self.check_available()?;
        if !self.contains(path) {
            return Err(BlobStoreError::NotFound {
                path: path.to_string(),
            });
        }
        Ok(SignedUrl {
            url: format!("memory://{path}?sig=test"),
            expires_in_secs: ttl.as_secs(),
        })
    }

    async fn signed_upload_url(
        &self,
        path: &str,
        ttl: Duration,
    ) -> Result<SignedUrl, BlobStoreError> {
        self.check_available()?;
        Ok(SignedUrl {
            url: format!("memory://{path}?sig=test-upload"),
            expires_in_secs: ttl.as_secs(),
        })
    }
}

/// In-memory record store double.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    inner: Arc<Mutex<MemoryRecordInner>>,
}

#[derive(Debug, Default)]
struct MemoryRecordInner {
    rows: Vec<ContributionRow>,
    unavailable: bool,
    fail_next_insert: bool,
}

impl MemoryRecordStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle outage mode for every operation.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.lock().unavailable = unavailable;
    }

    /// Make only the next `insert` fail, then recover. Exercises the
    /// best-effort metadata-write path.
    pub fn fail_next_insert(&self) {
        self.inner.lock().fail_next_insert = true;
    }

    fn check_available(&self) -> Result<(), RecordStoreError> {
        if self.inner.lock().unavailable {
            Err(RecordStoreError::Unavailable("injected outage".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn insert(&self, row: ContributionRow) -> Result<(), RecordStoreError> {
        self.check_available()?;
        let mut inner = self.inner.lock();
        if inner.fail_next_insert {
            inner.fail_next_insert = false;
            return Err(RecordStoreError::Unavailable("injected insert failure".into()));
        }
        inner.rows.push(row);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ContributionRow>, RecordStoreError> {
        self.check_available()?;
        let mut rows = self.inner.lock().rows.clone();
        rows.sort_by_key(|r| (r.circuit, r.index));
        Ok(rows)
    }

    async fn delete_all(&self) -> Result<u64, RecordStoreError> {
        self.check_available()?;
        let mut inner = self.inner.lock();
        let removed = inner.rows.len() as u64;
        inner.rows.clear();
        Ok(removed)
    }

    async fn replace_all(&self, rows: Vec<ContributionRow>) -> Result<u64, RecordStoreError> {
        self.check_available()?;
        let mut inner = self.inner.lock();
        inner.rows = rows;
        Ok(inner.rows.len() as u64)
    }

    async fn count(&self) -> Result<u64, RecordStoreError> {
        self.check_available()?;
        Ok(self.inner.lock().rows.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;
    use zkr_core::CircuitId;

    fn row(circuit: CircuitId, index: u32) -> ContributionRow {
        ContributionRow {
            id: Uuid::new_v4(),
            circuit,
            index,
            contributor_name: format!("contributor-{index}"),
            contribution_hash: format!("hash-{index}"),
            verified: false,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn blob_upload_and_download_roundtrip() {
        let store = MemoryBlobStore::new();
        store
            .upload("ceremony/age-verification/a_0001.keymaterial", vec![1, 2], false)
            .await
            .unwrap();
        let bytes = store
            .download("ceremony/age-verification/a_0001.keymaterial")
            .await
            .unwrap();
        assert_eq!(bytes, vec![1, 2]);
    }

    #[tokio::test]
    async fn blob_create_if_absent_refuses_overwrite() {
        let store = MemoryBlobStore::new();
        store.upload("p/x", vec![1], false).await.unwrap();
        let err = store.upload("p/x", vec![2], false).await.unwrap_err();
        assert!(matches!(err, BlobStoreError::AlreadyExists { .. }));
        // The original bytes survive the refused write.
        assert_eq!(store.download("p/x").await.unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn blob_overwrite_allowed_when_requested() {
        let store = MemoryBlobStore::new();
        store.upload("p/x", vec![1], false).await.unwrap();
        store.upload("p/x", vec![2], true).await.unwrap();
        assert_eq!(store.download("p/x").await.unwrap(), vec![2]);
    }

    #[tokio::test]
    async fn blob_list_returns_direct_children_only() {
        let store = MemoryBlobStore::new();
        store.put("ceremony/age-verification/a_0001.keymaterial", vec![]);
        store.put("ceremony/age-verification/a_0002.keymaterial", vec![]);
        store.put("ceremony/age-verification/nested/deep", vec![]);
        store.put("ceremony/range-proof/r_0001.keymaterial", vec![]);

        let entries = store.list("ceremony/age-verification").await.unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["a_0001.keymaterial", "a_0002.keymaterial"]
        );
    }

    #[tokio::test]
    async fn blob_list_missing_directory_is_empty() {
        let store = MemoryBlobStore::new();
        assert!(store.list("ceremony/nothing-here").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn blob_outage_fails_every_operation() {
        let store = MemoryBlobStore::new();
        store.put("p/x", vec![1]);
        store.set_unavailable(true);

        assert!(store.list("p").await.unwrap_err().is_unavailable());
        assert!(store.download("p/x").await.unwrap_err().is_unavailable());
        assert!(store
            .upload("p/y", vec![], false)
            .await
            .unwrap_err()
            .is_unavailable());

        store.set_unavailable(false);
        assert!(store.download("p/x").await.is_ok());
    }

    #[tokio::test]
    async fn signed_download_url_requires_existing_object() {
        let store = MemoryBlobStore::new();
        let err = store
            .signed_download_url("p/missing", Duration::from_secs(60))
            .await
            .unwrap_err();
        assert!(matches!(err, BlobStoreError::NotFound { .. }));

        store.put("p/x", vec![1]);
        let url = store
            .signed_download_url("p/x", Duration::from_secs(3600))
            .await
            .unwrap();
        assert_eq!(url.expires_in_secs, 3600);
    }

    #[tokio::test]
    async fn record_list_orders_by_circuit_then_index() {
        let store = MemoryRecordStore::new();
        store.insert(row(CircuitId::RangeProof, 2)).await.unwrap();
        store.insert(row(CircuitId::AgeVerification, 1)).await.unwrap();
        store.insert(row(CircuitId::RangeProof, 1)).await.unwrap();

        let rows = store.list().await.unwrap();
        let keys: Vec<_> = rows.iter().map(|r| (r.circuit, r.index)).collect();
        assert_eq!(
            keys,
            vec![
                (CircuitId::AgeVerification, 1),
                (CircuitId::RangeProof, 1),
                (CircuitId::RangeProof, 2),
            ]
        );
    }

    #[tokio::test]
    async fn record_replace_all_swaps_table() {
        let store = MemoryRecordStore::new();
        store.insert(row(CircuitId::TokenSwap, 1)).await.unwrap();

        let count = store
            .replace_all(vec![row(CircuitId::HashPreimage, 1), row(CircuitId::HashPreimage, 2)])
            .await
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(store.count().await.unwrap(), 2);
        assert!(store
            .list()
            .await
            .unwrap()
            .iter()
            .all(|r| r.circuit == CircuitId::HashPreimage));
    }

    #[tokio::test]
    async fn record_fail_next_insert_recovers() {
        let store = MemoryRecordStore::new();
        store.fail_next_insert();
        assert!(store.insert(row(CircuitId::TokenSwap, 1)).await.is_err());
        assert!(store.insert(row(CircuitId::TokenSwap, 1)).await.is_ok());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn record_delete_all_reports_removed_count() {
        let store = MemoryRecordStore::new();
        store.insert(row(CircuitId::TokenSwap, 1)).await.unwrap();
        store.insert(row(CircuitId::TokenSwap, 2)).await.unwrap();
        assert_eq!(store.delete_all().await.unwrap(), 2);
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
