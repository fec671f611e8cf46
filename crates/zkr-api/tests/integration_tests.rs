//! End-to-end flow over the assembled application: ceremony contributions
//! advance a circuit's index, a proof request against seeded key material
//! verifies, and the compact encoding comes out bit-exact.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use zkr_api::{AppConfig, AppState};
use zkr_proof::{ArtifactKind, DeterministicBackend};
use zkr_storage::{MemoryBlobStore, MemoryRecordStore};

const BOUNDARY: &str = "zkr-e2e-boundary";

fn test_app() -> (axum::Router, MemoryBlobStore) {
    let blob = MemoryBlobStore::new();
    // Serving-path key material for the proof request.
    for circuit in [zkr_core::CircuitId::AgeVerification] {
        blob.put(ArtifactKind::Program.path(circuit), b"wasm".to_vec());
        blob.put(ArtifactKind::ProvingKey.path(circuit), b"zkey".to_vec());
        blob.put(
            ArtifactKind::VerificationKey.path(circuit),
            br#"{"protocol":"groth16","curve":"bn128"}"#.to_vec(),
        );
    }
    let state = AppState::with_gateways(
        Arc::new(blob.clone()),
        Arc::new(MemoryRecordStore::new()),
        Arc::new(DeterministicBackend::new()),
        AppConfig::default(),
    );
    (zkr_api::app(state), blob)
}

fn contribution_request(circuit: &str, contributor: &str, hash: &str) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in [
        ("circuit", circuit),
        ("contributor_name", contributor),
        ("contribution_hash", hash),
    ] {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\ncontent-disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\ncontent-disposition: form-data; name=\"keymaterial\"; \
             filename=\"c.keymaterial\"\r\ncontent-type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(hash.as_bytes());
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/ceremony/keymaterial")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(resp: axum::response::Response) -> serde_json::Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn ceremony_then_proof_then_encoding() {
    let (app, _blob) = test_app();

    // The circuit starts uninitialized.
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/ceremony/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = json_body(resp).await;
    assert_eq!(
        status["per_circuit"]["age-verification"]["current_index"],
        0
    );

    // Three contributions land at indices 1..3.
    for (i, hash) in ["h1", "h2", "h3"].iter().enumerate() {
        let resp = app
            .clone()
            .oneshot(contribution_request(
                "age-verification",
                &format!("contributor-{}", i + 1),
                hash,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let accepted = json_body(resp).await;
        assert_eq!(accepted["index"], (i + 1) as u64);
    }

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/ceremony/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = json_body(resp).await;
    assert_eq!(
        status["per_circuit"]["age-verification"]["current_index"],
        3
    );
    assert_eq!(
        status["per_circuit"]["age-verification"]["latest_artifact_name"],
        "age-verification_0003.keymaterial"
    );
    // Other circuits lag, so the global gate stays closed.
    assert_eq!(status["phase"], "contribution");

    // A proof request against the serving-path key material verifies.
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/proofs/generate")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"circuit":"age-verification","inputs":{"birthYear":"1990","currentYear":"2024","minimumAge":"18"}}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let generated = json_body(resp).await;
    assert_eq!(generated["success"], true);
    assert_eq!(generated["proof"]["is_valid"], true);
    let proof_data = generated["proof"]["proof_data"].clone();
    let public_signals = generated["proof"]["public_signals"].clone();
    assert_eq!(public_signals.as_array().unwrap().len(), 1);

    // The compact encoding is 293 bytes and leads with the small id.
    let encode_body = serde_json::json!({
        "circuit": "age-verification",
        "proof_data": proof_data,
        "public_signals": public_signals,
    });
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/proofs/encode")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(encode_body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let encoded = json_body(resp).await;
    assert_eq!(encoded["length"], 293);
    let hex = encoded["encoded"].as_str().unwrap();
    assert_eq!(hex.len(), 293 * 2);
    assert!(hex.starts_with("00"), "first byte must be the small id 0");
}
