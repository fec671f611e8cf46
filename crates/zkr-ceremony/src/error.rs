//! # Ceremony Error Types
//!
//! Write-path failures from the coordinator. Read paths (status calls) do
//! not use this type — they degrade to a default snapshot instead of
//! propagating storage errors, because ceremony status is advisory.

use thiserror::Error;
use zkr_core::CircuitId;

/// Error from a ceremony write or descriptor operation.
#[derive(Error, Debug)]
pub enum CeremonyError {
    /// The backing store is unreachable. Transient; retry later.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// The circuit has no key material yet, so there is nothing to
    /// download or extend.
    #[error("no key material found for circuit {circuit}; ceremony may not be initialized")]
    ArtifactMissing {
        /// The circuit whose directory was empty.
        circuit: CircuitId,
    },

    /// Two contributions raced for the same index and the retry also lost.
    /// Retryable: the caller should recompute and resubmit.
    #[error("contribution index {index} for {circuit} was claimed concurrently")]
    IndexConflict {
        /// The circuit being extended.
        circuit: CircuitId,
        /// The index both contributions tried to claim.
        index: u32,
    },

    /// The artifact upload itself failed. Fatal to the contribution —
    /// unlike the metadata row, the artifact is never best-effort.
    #[error("artifact upload failed: {0}")]
    UploadFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_conflict_message_names_circuit_and_index() {
        let err = CeremonyError::IndexConflict {
            circuit: CircuitId::AgeVerification,
            index: 4,
        };
        let msg = err.to_string();
        assert!(msg.contains("age-verification"));
        assert!(msg.contains('4'));
    }

    #[test]
    fn artifact_missing_mentions_initialization() {
        let err = CeremonyError::ArtifactMissing {
            circuit: CircuitId::RangeProof,
        };
        assert!(err.to_string().contains("not be initialized"));
    }
}
