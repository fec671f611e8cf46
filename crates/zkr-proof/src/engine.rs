//! # Proof Engine
//!
//! The primary generation path: load the circuit's artifacts, invoke the
//! proving capability, verify the result, and return everything the caller
//! needs — proof, public signals, validity, timing.
//!
//! ## Output contract
//!
//! Every generation path produces a [`GeneratedProof`]. The engine always
//! yields `Real`; the toolchain fallback may yield `Placeholder`. The two
//! are distinct enum variants rather than a flag on a shared shape, so a
//! non-cryptographic placeholder can never be mistaken for a real proof by
//! a consumer that matches on the result.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use zkr_core::{CircuitId, ProofRequest, ProofResult};

use crate::artifacts::ArtifactLoader;
use crate::backend::ProvingBackend;
use crate::error::ProofError;

/// A generation outcome: a real proof, or an explicitly non-cryptographic
/// placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeneratedProof {
    /// A proof produced and checked by the cryptographic capability.
    Real(ProofResult),
    /// A stand-in produced when no real proving path exists. Carries no
    /// validity claim of any kind.
    Placeholder(PlaceholderProof),
}

impl GeneratedProof {
    /// Whether this is a real proof.
    pub fn is_real(&self) -> bool {
        matches!(self, Self::Real(_))
    }

    /// The real result, if this is one.
    pub fn as_real(&self) -> Option<&ProofResult> {
        match self {
            Self::Real(result) => Some(result),
            Self::Placeholder(_) => None,
        }
    }
}

/// A clearly-flagged non-cryptographic stand-in.
///
/// Produced by the toolchain fallback for circuits outside its allow-list
/// or when the toolchain itself fails. Deliberately has no `is_valid`
/// field — there is nothing to be valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderProof {
    /// The circuit that was requested.
    pub circuit: CircuitId,
    /// Why no real proof was produced.
    pub reason: String,
    /// When the placeholder was produced.
    pub generated_at: DateTime<Utc>,
}

/// Anything that can turn a proof request into a generated proof.
///
/// Implemented by [`ProofEngine`] (always real) and
/// [`crate::toolchain::ToolchainProver`] (real or placeholder). The proof
/// cache wraps this seam, so both paths share caching, de-duplication,
/// and cancellation.
#[async_trait]
pub trait ProofGenerator: Send + Sync {
    /// Generate a proof for the request.
    async fn generate(&self, request: &ProofRequest) -> Result<GeneratedProof, ProofError>;
}

/// The primary proof generation path.
pub struct ProofEngine {
    loader: ArtifactLoader,
    backend: Arc<dyn ProvingBackend>,
}

impl ProofEngine {
    /// Engine over an artifact loader and a proving backend.
    pub fn new(loader: ArtifactLoader, backend: Arc<dyn ProvingBackend>) -> Self {
        Self { loader, backend }
    }

    /// Generate and verify a proof.
    ///
    /// Verification failure — the capability raising, or the proof simply
    /// not verifying — is reported through `is_valid = false`, never as an
    /// error: the caller decides whether an invalid-but-generated proof is
    /// still useful.
    pub async fn prove(&self, request: &ProofRequest) -> Result<ProofResult, ProofError> {
        let circuit = request.circuit;
        let artifacts = self.loader.load(circuit).await?;

        let started = Instant::now();
        let (proof_data, public_signals) = self
            .backend
            .prove(&request.inputs, &artifacts.program, &artifacts.proving_key)
            .await
            .map_err(|e| ProofError::ProvingFailed(e.to_string()))?;

        let is_valid = match self
            .backend
            .verify(&artifacts.verification_key, &public_signals, &proof_data)
            .await
        {
            Ok(valid) => valid,
            Err(err) => {
                tracing::warn!(
                    circuit = %circuit,
                    error = %err,
                    "proof generated but verification raised; reporting invalid"
                );
                false
            }
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        tracing::info!(
            circuit = %circuit,
            is_valid,
            elapsed_ms,
            signals = public_signals.len(),
            "proof generated"
        );

        let proof_hash = proof_data.display_hash();
        Ok(ProofResult {
            circuit,
            proof_data,
            public_signals,
            is_valid,
            verification_key: String::from_utf8_lossy(&artifacts.verification_key).into_owned(),
            proof_hash,
            generated_at: Utc::now(),
            elapsed_ms,
        })
    }
}

#[async_trait]
impl ProofGenerator for ProofEngine {
    async fn generate(&self, request: &ProofRequest) -> Result<GeneratedProof, ProofError> {
        self.prove(request).await.map(GeneratedProof::Real)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::ArtifactKind;
    use crate::backend::{BackendError, DeterministicBackend};
    use std::collections::BTreeMap;
    use zkr_core::ProofData;
    use zkr_storage::MemoryBlobStore;

    fn seeded_store(circuit: CircuitId) -> MemoryBlobStore {
        let store = MemoryBlobStore::new();
        store.put(ArtifactKind::Program.path(circuit), b"wasm".to_vec());
        store.put(ArtifactKind::ProvingKey.path(circuit), b"zkey".to_vec());
        store.put(
            ArtifactKind::VerificationKey.path(circuit),
            br#"{"protocol":"groth16","curve":"bn128"}"#.to_vec(),
        );
        store
    }

    fn engine(circuit: CircuitId) -> ProofEngine {
        ProofEngine::new(
            ArtifactLoader::new(Arc::new(seeded_store(circuit))),
            Arc::new(DeterministicBackend::new()),
        )
    }

    fn request(circuit: CircuitId) -> ProofRequest {
        ProofRequest::new(
            circuit,
            [
                ("birthYear", "1990"),
                ("currentYear", "2024"),
                ("minimumAge", "18"),
            ],
        )
    }

    #[tokio::test]
    async fn prove_returns_valid_verified_result() {
        let result = engine(CircuitId::AgeVerification)
            .prove(&request(CircuitId::AgeVerification))
            .await
            .unwrap();
        assert_eq!(result.circuit, CircuitId::AgeVerification);
        assert!(result.is_valid);
        assert!(result.proof_data.has_expected_lengths());
        assert_eq!(result.public_signals, vec!["1"]);
        assert!(result.verification_key.contains("groth16"));
        assert_eq!(result.proof_hash.chars().count(), 66);
    }

    #[tokio::test]
    async fn missing_artifacts_fail_the_request() {
        let engine = ProofEngine::new(
            ArtifactLoader::new(Arc::new(MemoryBlobStore::new())),
            Arc::new(DeterministicBackend::new()),
        );
        let err = engine.prove(&request(CircuitId::RangeProof)).await.unwrap_err();
        assert!(matches!(err, ProofError::ArtifactMissing { .. }));
    }

    /// Backend whose verify step always raises.
    struct VerifyRaises;

    #[async_trait]
    impl ProvingBackend for VerifyRaises {
        async fn prove(
            &self,
            inputs: &BTreeMap<String, String>,
            program: &[u8],
            proving_key: &[u8],
        ) -> Result<(ProofData, Vec<String>), BackendError> {
            DeterministicBackend::new().prove(inputs, program, proving_key).await
        }
        async fn verify(
            &self,
            _vk: &[u8],
            _signals: &[String],
            _proof: &ProofData,
        ) -> Result<bool, BackendError> {
            Err(BackendError::Verification("curve point not on curve".into()))
        }
    }

    #[tokio::test]
    async fn verification_raising_reports_invalid_not_error() {
        let engine = ProofEngine::new(
            ArtifactLoader::new(Arc::new(seeded_store(CircuitId::AgeVerification))),
            Arc::new(VerifyRaises),
        );
        let result = engine
            .prove(&request(CircuitId::AgeVerification))
            .await
            .unwrap();
        assert!(!result.is_valid);
        assert!(result.proof_data.has_expected_lengths());
    }

    /// Backend whose prove step always raises.
    struct ProveRaises;

    #[async_trait]
    impl ProvingBackend for ProveRaises {
        async fn prove(
            &self,
            _inputs: &BTreeMap<String, String>,
            _program: &[u8],
            _proving_key: &[u8],
        ) -> Result<(ProofData, Vec<String>), BackendError> {
            Err(BackendError::Proving("witness generation failed".into()))
        }
        async fn verify(
            &self,
            _vk: &[u8],
            _signals: &[String],
            _proof: &ProofData,
        ) -> Result<bool, BackendError> {
            Ok(true)
        }
    }

    #[tokio::test]
    async fn proving_failure_is_fatal_with_backend_message() {
        let engine = ProofEngine::new(
            ArtifactLoader::new(Arc::new(seeded_store(CircuitId::AgeVerification))),
            Arc::new(ProveRaises),
        );
        let err = engine
            .prove(&request(CircuitId::AgeVerification))
            .await
            .unwrap_err();
        match err {
            ProofError::ProvingFailed(msg) => assert!(msg.contains("witness generation failed")),
            other => panic!("expected ProvingFailed, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn generator_wraps_result_as_real() {
        let engine = engine(CircuitId::AgeVerification);
        let generated = engine
            .generate(&request(CircuitId::AgeVerification))
            .await
            .unwrap();
        assert!(generated.is_real());
        assert!(generated.as_real().unwrap().is_valid);
    }

    #[test]
    fn placeholder_serializes_with_distinct_tag() {
        let placeholder = GeneratedProof::Placeholder(PlaceholderProof {
            circuit: CircuitId::PrivateVoting,
            reason: "circuit not in toolchain allow-list".into(),
            generated_at: Utc::now(),
        });
        let json = serde_json::to_string(&placeholder).unwrap();
        assert!(json.contains("\"kind\":\"placeholder\""));
        assert!(!json.contains("is_valid"));
    }
}
