//! # Storage Gateway Result Types
//!
//! Explicit result shapes for the two store boundaries, so the rest of the
//! stack never inspects loosely-typed storage payloads directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use zkr_core::CircuitId;

/// One object in a blob-store listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobEntry {
    /// Object name relative to the listed directory (no path separators).
    pub name: String,
    /// When the object was created, if the store reports it.
    pub created_at: Option<DateTime<Utc>>,
}

impl BlobEntry {
    /// Entry with just a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            created_at: None,
        }
    }
}

/// A time-bounded URL for reading or writing one object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedUrl {
    /// The full URL, including the signature token.
    pub url: String,
    /// Seconds until the signature expires.
    pub expires_in_secs: u64,
}

/// One contributor-metadata row in the record store.
///
/// The blob store remains authoritative for which contributions exist;
/// rows annotate who contributed and when, and can be rebuilt from blob
/// names by the reconcile path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionRow {
    /// Row id.
    pub id: Uuid,
    /// Circuit this contribution extends.
    pub circuit: CircuitId,
    /// 1-based contribution index, strictly increasing per circuit.
    pub index: u32,
    /// Display name supplied by the contributor.
    pub contributor_name: String,
    /// Opaque commitment to the contributed randomness.
    pub contribution_hash: String,
    /// Set by an out-of-band audit; false until then.
    pub verified: bool,
    /// When the row was recorded.
    pub created_at: DateTime<Utc>,
}
