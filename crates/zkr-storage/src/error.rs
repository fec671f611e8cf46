//! # Storage Gateway Error Types
//!
//! Both stores fail independently, and callers react differently to each
//! failure class: transient unavailability degrades read paths to a default
//! snapshot, while an upload conflict is the signal that two contributors
//! raced for the same index. The error types here make those classes
//! explicit so no caller has to pattern-match on message strings.

use thiserror::Error;

/// Error from a blob-store operation.
#[derive(Error, Debug)]
pub enum BlobStoreError {
    /// The store is unreachable or returned a server-side failure.
    /// Transient and retry-safe.
    #[error("blob store unavailable: {0}")]
    Unavailable(String),

    /// No blob exists at the requested path.
    #[error("blob not found: {path}")]
    NotFound {
        /// The path that was requested.
        path: String,
    },

    /// A create-if-absent upload found the path already occupied.
    ///
    /// This is the detectable form of the contribution index race: the
    /// store's overwrite policy is "refuse", so a lost race surfaces here
    /// instead of silently destroying the winner's artifact.
    #[error("blob already exists: {path}")]
    AlreadyExists {
        /// The path that was already occupied.
        path: String,
    },

    /// The store answered, but not in the shape the client expects.
    #[error("blob store protocol error: {0}")]
    Protocol(String),
}

impl BlobStoreError {
    /// Whether this failure should be treated as a transient outage.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Error from a record-store operation.
#[derive(Error, Debug)]
pub enum RecordStoreError {
    /// The store is unreachable or returned a server-side failure.
    #[error("record store unavailable: {0}")]
    Unavailable(String),

    /// A row violated a store constraint.
    #[error("record rejected: {0}")]
    Rejected(String),
}

impl RecordStoreError {
    /// Whether this failure should be treated as a transient outage.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}
