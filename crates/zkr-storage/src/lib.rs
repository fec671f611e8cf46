//! # zkr-storage — Storage Gateway Boundary
//!
//! The ceremony's state lives in two independently-failing stores:
//!
//! - a **blob store** holding the key-material files themselves (the source
//!   of truth for which contributions exist), and
//! - a **record store** holding contributor metadata rows (an annotation
//!   layer that can be rebuilt from blob names, but not vice versa).
//!
//! This crate defines the two trait seams, the typed results and failure
//! modes that cross them, and the implementations:
//!
//! - [`MemoryBlobStore`] / [`MemoryRecordStore`]: in-memory doubles with
//!   failure injection, used by coordinator and engine tests.
//! - [`HttpBlobStore`]: REST object-storage client (list / upload /
//!   download / signed URLs) over `reqwest`.
//! - [`PgRecordStore`]: Postgres-backed record store over `sqlx`.
//!
//! ## Crate Policy
//!
//! No business logic lives here. The gateway is consumed, not built:
//! callers decide what a listing means, what an upload conflict means, and
//! how an outage degrades.

pub mod error;
pub mod http_blob;
pub mod memory;
pub mod pg_record;
pub mod traits;
pub mod types;

pub use error::{BlobStoreError, RecordStoreError};
pub use http_blob::{HttpBlobStore, HttpBlobStoreConfig};
pub use memory::{MemoryBlobStore, MemoryRecordStore};
pub use pg_record::PgRecordStore;
pub use traits::{BlobStore, RecordStore};
pub use types::{BlobEntry, ContributionRow, SignedUrl};
