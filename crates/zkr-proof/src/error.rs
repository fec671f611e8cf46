//! # Proof Lifecycle Error Types
//!
//! The taxonomy a failed proof request is reported through. The split
//! matters to callers: `ProvingFailed` means the cryptographic backend
//! rejected the inputs (retrying the same request will fail again), while
//! `ArtifactMissing` and `StorageUnavailable` mean infrastructure — the
//! request may succeed later.
//!
//! All variants are `Clone` so a single generation's outcome can be
//! fanned out to every caller deduplicated onto it.

use thiserror::Error;
use zkr_core::CircuitId;

use crate::artifacts::ArtifactKind;

/// Error from proof generation.
#[derive(Error, Debug, Clone)]
pub enum ProofError {
    /// One of the circuit's three assets could not be retrieved.
    /// Fatal to this request; not retried automatically.
    #[error("artifact missing for circuit {circuit}: {asset}")]
    ArtifactMissing {
        /// The circuit whose assets were requested.
        circuit: CircuitId,
        /// Which of the three assets was absent.
        asset: ArtifactKind,
    },

    /// The artifact store is unreachable. Transient; retry later.
    #[error("artifact storage unavailable: {0}")]
    StorageUnavailable(String),

    /// The proving capability raised. Indicates bad inputs for the
    /// circuit, not infrastructure.
    #[error("proving failed: {0}")]
    ProvingFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_missing_names_circuit_and_asset() {
        let err = ProofError::ArtifactMissing {
            circuit: CircuitId::AgeVerification,
            asset: ArtifactKind::ProvingKey,
        };
        let msg = err.to_string();
        assert!(msg.contains("age-verification"));
        assert!(msg.contains("proving key"));
    }

    #[test]
    fn backend_and_infrastructure_errors_read_differently() {
        let backend = ProofError::ProvingFailed("unsatisfiable constraint".into()).to_string();
        let infra = ProofError::StorageUnavailable("connect timeout".into()).to_string();
        assert!(backend.contains("proving failed"));
        assert!(infra.contains("unavailable"));
    }
}
