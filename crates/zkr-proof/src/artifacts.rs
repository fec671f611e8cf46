//! # Proof Artifact Loader
//!
//! Fetches the three assets a proof requires for a circuit: the compiled
//! circuit program, the proving key, and the verification key.
//!
//! The serving path reads fixed per-circuit paths under `circuits/` — the
//! latest *finalized* key material — not the ceremony's in-progress
//! `ceremony/{circuit}/` sequence. Promotion from ceremony output to the
//! serving path is an operator action outside this loader.
//!
//! ## All-or-Nothing
//!
//! Partial retrieval is not a valid state: a missing asset fails the whole
//! load with [`ProofError::ArtifactMissing`] naming the asset. The two key
//! fetches are independent reads and run concurrently.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use zkr_core::CircuitId;
use zkr_storage::{BlobStore, BlobStoreError};

use crate::error::ProofError;

/// Which of a circuit's three assets an operation refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// The compiled circuit program (witness generator).
    Program,
    /// The proving key consumed to produce a proof.
    ProvingKey,
    /// The verification key used to check one.
    VerificationKey,
}

impl ArtifactKind {
    /// Human-readable name used in error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Program => "program",
            Self::ProvingKey => "proving key",
            Self::VerificationKey => "verification key",
        }
    }

    /// Blob path of this asset for a circuit.
    pub fn path(&self, circuit: CircuitId) -> String {
        match self {
            Self::Program => format!("circuits/{circuit}.wasm"),
            Self::ProvingKey => format!("circuits/{circuit}.zkey"),
            Self::VerificationKey => format!("circuits/{circuit}_vkey.json"),
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three byte buffers a proof generation consumes.
#[derive(Debug, Clone)]
pub struct CircuitArtifacts {
    /// Compiled circuit program.
    pub program: Vec<u8>,
    /// Proving key.
    pub proving_key: Vec<u8>,
    /// Verification key.
    pub verification_key: Vec<u8>,
}

/// Resolves circuit assets from the blob store.
#[derive(Clone)]
pub struct ArtifactLoader {
    blob: Arc<dyn BlobStore>,
}

impl ArtifactLoader {
    /// Loader over an injected blob store.
    pub fn new(blob: Arc<dyn BlobStore>) -> Self {
        Self { blob }
    }

    /// Load all three assets for a circuit, or none.
    pub async fn load(&self, circuit: CircuitId) -> Result<CircuitArtifacts, ProofError> {
        let program = self.fetch(circuit, ArtifactKind::Program).await?;
        // The two keys are independent reads.
        let (proving_key, verification_key) = tokio::try_join!(
            self.fetch(circuit, ArtifactKind::ProvingKey),
            self.fetch(circuit, ArtifactKind::VerificationKey),
        )?;
        Ok(CircuitArtifacts {
            program,
            proving_key,
            verification_key,
        })
    }

    async fn fetch(&self, circuit: CircuitId, asset: ArtifactKind) -> Result<Vec<u8>, ProofError> {
        self.blob
            .download(&asset.path(circuit))
            .await
            .map_err(|e| match e {
                BlobStoreError::NotFound { .. } => ProofError::ArtifactMissing { circuit, asset },
                other => ProofError::StorageUnavailable(other.to_string()),
            })
    }
}
