//! # Proving Capability Boundary
//!
//! The proving and verifying cryptography is an opaque capability:
//! `prove(inputs, program, proving_key) -> (proof, public_signals)` and
//! `verify(verification_key, public_signals, proof) -> bool`. This module
//! defines that seam and a deterministic in-process implementation used by
//! tests and development deployments.
//!
//! Backends are expected to move CPU-bound work off the caller's task —
//! proof generation takes hundreds of milliseconds to low seconds.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use thiserror::Error;

use zkr_core::{ProofData, PROOF_A_LEN, PROOF_B_LEN, PROOF_C_LEN};

/// Error from the proving capability.
#[derive(Error, Debug, Clone)]
pub enum BackendError {
    /// Proof generation raised.
    #[error("prover error: {0}")]
    Proving(String),
    /// Verification raised (distinct from a proof that verifies false).
    #[error("verifier error: {0}")]
    Verification(String),
}

/// The opaque proving capability.
#[async_trait]
pub trait ProvingBackend: Send + Sync {
    /// Produce a proof and its public signals.
    async fn prove(
        &self,
        inputs: &BTreeMap<String, String>,
        program: &[u8],
        proving_key: &[u8],
    ) -> Result<(ProofData, Vec<String>), BackendError>;

    /// Check a proof against a verification key.
    async fn verify(
        &self,
        verification_key: &[u8],
        public_signals: &[String],
        proof: &ProofData,
    ) -> Result<bool, BackendError>;
}

/// Deterministic, transparent backend for tests and development.
///
/// Proof bytes are SHA-256 expansions of the inputs and key material —
/// no zero-knowledge property, but fully deterministic and shaped exactly
/// like real output, so everything downstream (caching, encoding, API
/// responses) exercises the real code paths.
#[derive(Debug, Clone, Default)]
pub struct DeterministicBackend;

impl DeterministicBackend {
    /// New backend.
    pub fn new() -> Self {
        Self
    }

    /// Expand a seed digest to `len` bytes by counter-mode rehashing.
    fn expand(seed: &[u8], domain: u8, len: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(len);
        let mut counter = 0u32;
        while out.len() < len {
            let mut hasher = Sha256::new();
            hasher.update([domain]);
            hasher.update(counter.to_le_bytes());
            hasher.update(seed);
            out.extend_from_slice(&hasher.finalize());
            counter += 1;
        }
        out.truncate(len);
        out
    }

    fn derive(inputs: &BTreeMap<String, String>, proving_key: &[u8]) -> ProofData {
        let mut hasher = Sha256::new();
        hasher.update(
            serde_json::to_string(inputs).expect("string map serialization cannot fail"),
        );
        hasher.update(proving_key);
        let seed = hasher.finalize();

        ProofData {
            a: Self::expand(&seed, b'a', PROOF_A_LEN),
            b: Self::expand(&seed, b'b', PROOF_B_LEN),
            c: Self::expand(&seed, b'c', PROOF_C_LEN),
        }
    }
}

#[async_trait]
impl ProvingBackend for DeterministicBackend {
    async fn prove(
        &self,
        inputs: &BTreeMap<String, String>,
        _program: &[u8],
        proving_key: &[u8],
    ) -> Result<(ProofData, Vec<String>), BackendError> {
        let inputs = inputs.clone();
        let proving_key = proving_key.to_vec();
        // Real backends burn CPU here; keep the same off-task discipline.
        let proof = tokio::task::spawn_blocking(move || Self::derive(&inputs, &proving_key))
            .await
            .map_err(|e| BackendError::Proving(format!("proving task failed: {e}")))?;
        Ok((proof, vec!["1".to_string()]))
    }

    async fn verify(
        &self,
        _verification_key: &[u8],
        _public_signals: &[String],
        proof: &ProofData,
    ) -> Result<bool, BackendError> {
        Ok(proof.has_expected_lengths())
    }
}
