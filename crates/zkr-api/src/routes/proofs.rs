//! # Proof API
//!
//! End-user-facing proof lifecycle: generation (cached, deduplicated,
//! cancellable), standalone verification, and compact encoding for
//! on-chain submission.
//!
//! ## Failure classes
//!
//! A failed generation distinguishes the cryptographic backend rejecting
//! the inputs (`success = false` with a `proving failed` message — the
//! same request will fail again) from infrastructure trouble (404/503 —
//! retry later). Placeholder results from the toolchain fallback are
//! returned under their own `placeholder` field, never as a `proof`.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use utoipa::ToSchema;

use zkr_core::{CircuitId, ProofData, ProofRequest};
use zkr_proof::{GeneratedProof, Generation, ProofError, ProvingBackend};

use crate::error::AppError;
use crate::state::AppState;

/// Build the proofs router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/proofs/generate", post(post_generate))
        .route("/api/proofs/verify", post(post_verify))
        .route("/api/proofs/encode", post(post_encode))
}

// ── Request / response types ────────────────────────────────────────────

/// Proof generation request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct GenerateRequest {
    /// Circuit id (e.g. `age-verification`).
    pub circuit: String,
    /// Named inputs: opaque decimal-string field elements.
    #[schema(value_type = Object)]
    pub inputs: BTreeMap<String, String>,
    /// Bypass a fresh cache entry and regenerate.
    #[serde(default)]
    pub force_refresh: bool,
}

/// A real, cryptographically generated proof.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProofPayload {
    pub circuit: String,
    /// The three pairing-group elements, hex-encoded.
    #[schema(value_type = Object)]
    pub proof_data: ProofData,
    pub public_signals: Vec<String>,
    /// Display fingerprint of the proof; not cryptographically meaningful.
    pub proof_hash: String,
    pub verification_key: String,
    pub timestamp: DateTime<Utc>,
    pub is_valid: bool,
    pub elapsed_ms: u64,
    pub from_cache: bool,
}

/// A non-cryptographic placeholder. Deliberately shares no shape with
/// [`ProofPayload`]: there is no validity to claim.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PlaceholderPayload {
    pub circuit: String,
    pub reason: String,
    pub generated_at: DateTime<Utc>,
}

/// Proof generation response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GenerateResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof: Option<ProofPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<PlaceholderPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Standalone verification request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyRequest {
    pub verification_key: String,
    pub public_signals: Vec<String>,
    /// The three pairing-group elements, hex-encoded.
    #[schema(value_type = Object)]
    pub proof_data: ProofData,
}

/// Standalone verification response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyResponse {
    pub success: bool,
    pub is_valid: bool,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Compact-encoding request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct EncodeRequest {
    pub circuit: String,
    /// The three pairing-group elements, hex-encoded.
    #[schema(value_type = Object)]
    pub proof_data: ProofData,
    pub public_signals: Vec<String>,
}

/// Compact-encoding response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EncodeResponse {
    pub circuit: String,
    /// The fixed-layout buffer, hex-encoded.
    pub encoded: String,
    /// Buffer length in bytes.
    pub length: usize,
}

// ── Handlers ────────────────────────────────────────────────────────────

/// POST /api/proofs/generate — Generate (or reuse) a proof.
#[utoipa::path(
    post,
    path = "/api/proofs/generate",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Generation outcome", body = GenerateResponse),
        (status = 404, description = "Circuit artifacts missing"),
        (status = 422, description = "Unknown circuit"),
        (status = 503, description = "Artifact storage unavailable"),
    ),
    tag = "proofs"
)]
pub(crate) async fn post_generate(
    State(state): State<AppState>,
    Json(body): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    let circuit: CircuitId = body.circuit.parse()?;
    let request = ProofRequest {
        circuit,
        inputs: body.inputs,
    };

    match state.proofs.get_or_generate(&request, body.force_refresh).await {
        Ok(Generation::Completed { proof, from_cache }) => Ok(Json(match proof {
            GeneratedProof::Real(result) => GenerateResponse {
                success: true,
                proof: Some(ProofPayload {
                    circuit: result.circuit.to_string(),
                    proof_data: result.proof_data,
                    public_signals: result.public_signals,
                    proof_hash: result.proof_hash,
                    verification_key: result.verification_key,
                    timestamp: result.generated_at,
                    is_valid: result.is_valid,
                    elapsed_ms: result.elapsed_ms,
                    from_cache,
                }),
                placeholder: None,
                error: None,
            },
            GeneratedProof::Placeholder(placeholder) => GenerateResponse {
                success: true,
                proof: None,
                placeholder: Some(PlaceholderPayload {
                    circuit: placeholder.circuit.to_string(),
                    reason: placeholder.reason,
                    generated_at: placeholder.generated_at,
                }),
                error: None,
            },
        })),
        Ok(Generation::Cancelled) => Ok(Json(GenerateResponse {
            success: false,
            proof: None,
            placeholder: None,
            error: Some("superseded by a newer proof request".to_string()),
        })),
        // Backend rejection: the inputs are bad for this circuit, so the
        // request shape was valid but the proof cannot exist. Reported in
        // the body; retrying unchanged will fail again.
        Err(ProofError::ProvingFailed(msg)) => Ok(Json(GenerateResponse {
            success: false,
            proof: None,
            placeholder: None,
            error: Some(format!("proving failed: {msg}")),
        })),
        // Infrastructure trouble: retry later. Distinguished by status.
        Err(infra) => Err(infra.into()),
    }
}

/// POST /api/proofs/verify — Verify a proof against a verification key.
#[utoipa::path(
    post,
    path = "/api/proofs/verify",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Verification outcome", body = VerifyResponse),
    ),
    tag = "proofs"
)]
pub(crate) async fn post_verify(
    State(state): State<AppState>,
    Json(body): Json<VerifyRequest>,
) -> Json<VerifyResponse> {
    let started = Instant::now();
    let verdict = state
        .verifier
        .verify(
            body.verification_key.as_bytes(),
            &body.public_signals,
            &body.proof_data,
        )
        .await;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    Json(match verdict {
        Ok(is_valid) => VerifyResponse {
            success: true,
            is_valid,
            elapsed_ms,
            error: None,
        },
        Err(err) => VerifyResponse {
            success: false,
            is_valid: false,
            elapsed_ms,
            error: Some(err.to_string()),
        },
    })
}

/// POST /api/proofs/encode — Encode a proof for on-chain submission.
#[utoipa::path(
    post,
    path = "/api/proofs/encode",
    request_body = EncodeRequest,
    responses(
        (status = 200, description = "Compact buffer", body = EncodeResponse),
        (status = 422, description = "Unknown circuit or malformed proof"),
    ),
    tag = "proofs"
)]
pub(crate) async fn post_encode(
    Json(body): Json<EncodeRequest>,
) -> Result<Json<EncodeResponse>, AppError> {
    let circuit: CircuitId = body.circuit.parse()?;
    let buffer = zkr_encode::encode(&body.proof_data, &body.public_signals, circuit)?;
    Ok(Json(EncodeResponse {
        circuit: circuit.to_string(),
        length: buffer.len(),
        encoded: buffer.iter().map(|b| format!("{b:02x}")).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppConfig;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use zkr_proof::{ArtifactKind, DeterministicBackend};
    use zkr_storage::{MemoryBlobStore, MemoryRecordStore};
    use tower::ServiceExt;

    fn seeded_state(circuit: CircuitId) -> AppState {
        let blob = MemoryBlobStore::new();
        blob.put(ArtifactKind::Program.path(circuit), b"wasm".to_vec());
        blob.put(ArtifactKind::ProvingKey.path(circuit), b"zkey".to_vec());
        blob.put(
            ArtifactKind::VerificationKey.path(circuit),
            br#"{"protocol":"groth16"}"#.to_vec(),
        );
        AppState::with_gateways(
            Arc::new(blob),
            Arc::new(MemoryRecordStore::new()),
            Arc::new(DeterministicBackend::new()),
            AppConfig::default(),
        )
    }

    fn app(state: AppState) -> Router {
        router().with_state(state)
    }

    async fn post_json(app: &Router, uri: &str, body: serde_json::Value) -> axum::response::Response {
        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        app.clone().oneshot(req).await.unwrap()
    }

    async fn body_json<T: serde::de::DeserializeOwned>(resp: axum::response::Response) -> T {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn generate_body() -> serde_json::Value {
        serde_json::json!({
            "circuit": "age-verification",
            "inputs": {"birthYear": "1990", "currentYear": "2024", "minimumAge": "18"}
        })
    }

    #[tokio::test]
    async fn generate_returns_valid_proof() {
        let app = app(seeded_state(CircuitId::AgeVerification));
        let resp = post_json(&app, "/api/proofs/generate", generate_body()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: GenerateResponse = body_json(resp).await;
        assert!(body.success);
        let proof = body.proof.expect("real proof expected");
        assert_eq!(proof.circuit, "age-verification");
        assert!(proof.is_valid);
        assert!(!proof.from_cache);
        assert_eq!(proof.public_signals, vec!["1"]);
        assert_eq!(proof.proof_hash.chars().count(), 66);
        assert!(body.placeholder.is_none());
    }

    #[tokio::test]
    async fn repeated_generate_hits_cache() {
        let app = app(seeded_state(CircuitId::AgeVerification));
        post_json(&app, "/api/proofs/generate", generate_body()).await;
        let resp = post_json(&app, "/api/proofs/generate", generate_body()).await;

        let body: GenerateResponse = body_json(resp).await;
        assert!(body.proof.unwrap().from_cache);
    }

    #[tokio::test]
    async fn force_refresh_bypasses_cache() {
        let app = app(seeded_state(CircuitId::AgeVerification));
        post_json(&app, "/api/proofs/generate", generate_body()).await;

        let mut body = generate_body();
        body["force_refresh"] = serde_json::json!(true);
        let resp = post_json(&app, "/api/proofs/generate", body).await;
        let body: GenerateResponse = body_json(resp).await;
        assert!(!body.proof.unwrap().from_cache);
    }

    #[tokio::test]
    async fn unknown_circuit_is_rejected() {
        let app = app(seeded_state(CircuitId::AgeVerification));
        let resp = post_json(
            &app,
            "/api/proofs/generate",
            serde_json::json!({"circuit": "not-a-real-circuit", "inputs": {}}),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn missing_artifacts_return_404() {
        // State seeded for a different circuit only.
        let app = app(seeded_state(CircuitId::RangeProof));
        let resp = post_json(&app, "/api/proofs/generate", generate_body()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn verify_endpoint_checks_proof_shape() {
        let app = app(seeded_state(CircuitId::AgeVerification));

        // Generate a proof, then verify it standalone.
        let resp = post_json(&app, "/api/proofs/generate", generate_body()).await;
        let generated: GenerateResponse = body_json(resp).await;
        let proof = generated.proof.unwrap();

        let resp = post_json(
            &app,
            "/api/proofs/verify",
            serde_json::json!({
                "verification_key": proof.verification_key,
                "public_signals": proof.public_signals,
                "proof_data": proof.proof_data,
            }),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let verdict: VerifyResponse = body_json(resp).await;
        assert!(verdict.success);
        assert!(verdict.is_valid);
    }

    #[tokio::test]
    async fn verify_rejects_truncated_proof() {
        let app = app(seeded_state(CircuitId::AgeVerification));
        let resp = post_json(
            &app,
            "/api/proofs/verify",
            serde_json::json!({
                "verification_key": "{}",
                "public_signals": ["1"],
                "proof_data": {"a": "11", "b": "22", "c": "33"},
            }),
        )
        .await;
        let verdict: VerifyResponse = body_json(resp).await;
        assert!(verdict.success);
        assert!(!verdict.is_valid);
    }

    #[tokio::test]
    async fn encode_endpoint_produces_fixed_layout_buffer() {
        let app = app(seeded_state(CircuitId::AgeVerification));
        let resp = post_json(&app, "/api/proofs/generate", generate_body()).await;
        let generated: GenerateResponse = body_json(resp).await;
        let proof = generated.proof.unwrap();

        let resp = post_json(
            &app,
            "/api/proofs/encode",
            serde_json::json!({
                "circuit": "age-verification",
                "proof_data": proof.proof_data,
                "public_signals": proof.public_signals,
            }),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let encoded: EncodeResponse = body_json(resp).await;
        assert_eq!(encoded.length, 293);
        assert_eq!(encoded.encoded.len(), 293 * 2);
        // First byte is the circuit's small id.
        assert!(encoded.encoded.starts_with("00"));
    }

    #[tokio::test]
    async fn encode_rejects_circuit_without_small_id() {
        let app = app(seeded_state(CircuitId::AgeVerification));
        let resp = post_json(
            &app,
            "/api/proofs/encode",
            serde_json::json!({
                "circuit": "private-voting",
                "proof_data": {
                    "a": "11".repeat(64),
                    "b": "22".repeat(128),
                    "c": "33".repeat(64),
                },
                "public_signals": ["1"],
            }),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn encode_rejects_malformed_proof_widths() {
        let app = app(seeded_state(CircuitId::AgeVerification));
        let resp = post_json(
            &app,
            "/api/proofs/encode",
            serde_json::json!({
                "circuit": "age-verification",
                "proof_data": {"a": "11", "b": "22", "c": "33"},
                "public_signals": ["1"],
            }),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
