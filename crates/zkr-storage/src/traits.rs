//! # Storage Gateway Traits
//!
//! The two trait seams the ceremony and proof layers are written against.
//! Implementations are injected at construction time — there is no
//! module-level client singleton anywhere in the stack, which is what
//! makes the coordinator testable against the in-memory doubles.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::{BlobStoreError, RecordStoreError};
use crate::types::{BlobEntry, ContributionRow, SignedUrl};

/// Object storage holding key-material files and proof artifacts.
///
/// Paths are `/`-separated, with the first segment acting as the circuit
/// "directory" for ceremony artifacts (`ceremony/{circuit}/{name}`).
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// List the objects directly under `prefix`.
    ///
    /// An empty listing and a missing directory are the same thing.
    async fn list(&self, prefix: &str) -> Result<Vec<BlobEntry>, BlobStoreError>;

    /// Write an object.
    ///
    /// With `overwrite = false` the write is atomic create-if-absent and
    /// fails with [`BlobStoreError::AlreadyExists`] when the path is
    /// occupied. That refusal is load-bearing: it is how a contribution
    /// index race becomes detectable instead of silently destructive.
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        overwrite: bool,
    ) -> Result<(), BlobStoreError>;

    /// Read an object in full.
    async fn download(&self, path: &str) -> Result<Vec<u8>, BlobStoreError>;

    /// Issue a time-bounded URL for reading `path`.
    async fn signed_download_url(
        &self,
        path: &str,
        ttl: Duration,
    ) -> Result<SignedUrl, BlobStoreError>;

    /// Issue a time-bounded URL for writing `path`.
    ///
    /// Issuing the URL has no side effect; nothing exists at `path` until
    /// the holder actually uploads.
    async fn signed_upload_url(
        &self,
        path: &str,
        ttl: Duration,
    ) -> Result<SignedUrl, BlobStoreError>;
}

/// Row storage for contributor metadata.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert one row.
    async fn insert(&self, row: ContributionRow) -> Result<(), RecordStoreError>;

    /// All rows, ordered by circuit then index.
    async fn list(&self) -> Result<Vec<ContributionRow>, RecordStoreError>;

    /// Delete every row, returning how many were removed.
    async fn delete_all(&self) -> Result<u64, RecordStoreError>;

    /// Replace the whole table with `rows`, returning the new row count.
    async fn replace_all(&self, rows: Vec<ContributionRow>) -> Result<u64, RecordStoreError>;

    /// Current row count.
    async fn count(&self) -> Result<u64, RecordStoreError>;
}
