//! # Ceremony API
//!
//! Operator and contributor endpoints for the trusted-setup ceremony:
//! global status, key-material download descriptors, upload-slot
//! reservation, multipart contribution submission, and record-store
//! reconciliation.
//!
//! Status reads never fail — a storage outage yields the degraded default
//! snapshot with `source = "degraded_default"`. Write paths surface typed
//! failures: 409 for a lost index race, 503 for storage outages.

use axum::extract::{Multipart, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

use zkr_ceremony::{ReconcileAction, SnapshotSource};
use zkr_core::CircuitId;

use crate::error::AppError;
use crate::state::AppState;

/// Build the ceremony router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/ceremony/status", get(get_status))
        .route(
            "/api/ceremony/keymaterial",
            get(get_keymaterial).post(post_contribution),
        )
        .route("/api/ceremony/upload-target", get(get_upload_target))
        .route(
            "/api/ceremony/reconcile",
            get(get_sync_status).post(post_reconcile),
        )
}

// ── Response types ──────────────────────────────────────────────────────

/// Per-circuit progress entry.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CircuitStatusPayload {
    /// Highest contribution index in the circuit's blob directory.
    pub current_index: u32,
    /// Name of the artifact carrying that index.
    pub latest_artifact_name: Option<String>,
}

/// One contributor metadata row.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ContributionPayload {
    pub circuit: String,
    pub index: u32,
    pub contributor_name: String,
    pub contribution_hash: String,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

/// Global ceremony snapshot.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CeremonyStatusPayload {
    /// `contribution`, `ready_to_finalize`, or `finalized`.
    pub phase: String,
    /// Progress per circuit, keyed by circuit id.
    #[schema(value_type = Object)]
    pub per_circuit: BTreeMap<String, CircuitStatusPayload>,
    pub total_circuits: usize,
    /// Minimum contribution count across circuits — the gating value.
    pub min_contributions: u32,
    pub total_contributions: u32,
    pub required_contributions: u32,
    /// True once every circuit has at least one contribution.
    pub initialized: bool,
    pub contributions: Vec<ContributionPayload>,
    /// `live` or `degraded_default`.
    pub source: String,
}

/// Download descriptor for a circuit's latest key material.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct KeyMaterialPayload {
    pub circuit: String,
    pub current_index: u32,
    pub next_index: u32,
    pub artifact_name: String,
    pub download_url: String,
    pub expires_in_secs: u64,
}

/// Reserved slot for the next contribution upload.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadTargetPayload {
    pub circuit: String,
    pub next_index: u32,
    pub artifact_name: String,
    pub upload_url: String,
    pub expires_in_secs: u64,
}

/// Response to an accepted contribution.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ContributionAcceptedPayload {
    pub circuit: String,
    pub index: u32,
    pub artifact_name: String,
    pub contributor_name: String,
    pub contribution_hash: String,
}

/// Reconcile request body.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReconcileRequest {
    /// `clean` deletes all rows; `sync` rebuilds them from blob names.
    #[schema(value_type = String)]
    pub action: ReconcileAction,
}

/// Reconcile outcome.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReconcilePayload {
    pub action: String,
    /// Rows deleted (`clean`) or created (`sync`).
    pub rows: u64,
}

/// Two-store agreement report.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SyncStatusPayload {
    pub blob_artifacts: u64,
    pub record_rows: u64,
    pub in_sync: bool,
}

/// Query selecting one circuit.
#[derive(Debug, Deserialize)]
pub struct CircuitQuery {
    pub circuit: String,
}

// ── Handlers ────────────────────────────────────────────────────────────

/// GET /api/ceremony/status — Global ceremony snapshot.
#[utoipa::path(
    get,
    path = "/api/ceremony/status",
    responses(
        (status = 200, description = "Ceremony snapshot (degraded default during storage outages)", body = CeremonyStatusPayload),
    ),
    tag = "ceremony"
)]
pub(crate) async fn get_status(State(state): State<AppState>) -> Json<CeremonyStatusPayload> {
    let status = state.coordinator.ceremony_status().await;

    let per_circuit = status
        .per_circuit
        .iter()
        .map(|(circuit, s)| {
            (
                circuit.to_string(),
                CircuitStatusPayload {
                    current_index: s.current_index,
                    latest_artifact_name: s.latest_artifact_name.clone(),
                },
            )
        })
        .collect();

    Json(CeremonyStatusPayload {
        phase: status.phase.to_string(),
        total_circuits: status.per_circuit.len(),
        per_circuit,
        min_contributions: status.min_contributions,
        total_contributions: status.total_contributions,
        required_contributions: status.required_contributions,
        initialized: status.initialized,
        contributions: status
            .contributions
            .into_iter()
            .map(|row| ContributionPayload {
                circuit: row.circuit.to_string(),
                index: row.index,
                contributor_name: row.contributor_name,
                contribution_hash: row.contribution_hash,
                verified: row.verified,
                created_at: row.created_at,
            })
            .collect(),
        source: match status.source {
            SnapshotSource::Live => "live".to_string(),
            SnapshotSource::DegradedDefault => "degraded_default".to_string(),
        },
    })
}

/// GET /api/ceremony/keymaterial?circuit= — Latest key-material download
/// descriptor for a circuit.
#[utoipa::path(
    get,
    path = "/api/ceremony/keymaterial",
    params(("circuit" = String, Query, description = "Circuit id")),
    responses(
        (status = 200, description = "Signed download descriptor", body = KeyMaterialPayload),
        (status = 404, description = "Circuit has no key material yet"),
        (status = 422, description = "Unknown circuit"),
    ),
    tag = "ceremony"
)]
pub(crate) async fn get_keymaterial(
    State(state): State<AppState>,
    Query(query): Query<CircuitQuery>,
) -> Result<Json<KeyMaterialPayload>, AppError> {
    let circuit: CircuitId = query.circuit.parse()?;
    let descriptor = state.coordinator.download_descriptor(circuit).await?;
    Ok(Json(KeyMaterialPayload {
        circuit: descriptor.circuit.to_string(),
        current_index: descriptor.current_index,
        next_index: descriptor.next_index,
        artifact_name: descriptor.artifact_name,
        expires_in_secs: descriptor.download_url.expires_in_secs,
        download_url: descriptor.download_url.url,
    }))
}

/// GET /api/ceremony/upload-target?circuit= — Reserve (without claiming)
/// the next contribution slot.
#[utoipa::path(
    get,
    path = "/api/ceremony/upload-target",
    params(("circuit" = String, Query, description = "Circuit id")),
    responses(
        (status = 200, description = "Signed upload descriptor", body = UploadTargetPayload),
        (status = 422, description = "Unknown circuit"),
    ),
    tag = "ceremony"
)]
pub(crate) async fn get_upload_target(
    State(state): State<AppState>,
    Query(query): Query<CircuitQuery>,
) -> Result<Json<UploadTargetPayload>, AppError> {
    let circuit: CircuitId = query.circuit.parse()?;
    let target = state.coordinator.upload_target(circuit).await?;
    Ok(Json(UploadTargetPayload {
        circuit: target.circuit.to_string(),
        next_index: target.next_index,
        artifact_name: target.artifact_name,
        expires_in_secs: target.upload_url.expires_in_secs,
        upload_url: target.upload_url.url,
    }))
}

/// POST /api/ceremony/keymaterial — Submit a contribution.
///
/// Multipart form fields: `circuit`, `contributor_name`,
/// `contribution_hash`, and the key-material file as `keymaterial`.
#[utoipa::path(
    post,
    path = "/api/ceremony/keymaterial",
    responses(
        (status = 200, description = "Contribution accepted", body = ContributionAcceptedPayload),
        (status = 409, description = "Contribution index was claimed concurrently; retry"),
        (status = 422, description = "Unknown circuit or missing field"),
        (status = 503, description = "Storage unavailable"),
    ),
    tag = "ceremony"
)]
pub(crate) async fn post_contribution(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ContributionAcceptedPayload>, AppError> {
    let mut circuit: Option<String> = None;
    let mut contributor_name: Option<String> = None;
    let mut contribution_hash: Option<String> = None;
    let mut keymaterial: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "circuit" => circuit = Some(read_text(field).await?),
            "contributor_name" => contributor_name = Some(read_text(field).await?),
            "contribution_hash" => contribution_hash = Some(read_text(field).await?),
            "keymaterial" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("unreadable keymaterial: {e}")))?;
                keymaterial = Some(bytes.to_vec());
            }
            other => {
                tracing::debug!(field = other, "ignoring unknown multipart field");
            }
        }
    }

    let circuit: CircuitId = require(circuit, "circuit")?.parse()?;
    let contributor_name = require(contributor_name, "contributor_name")?;
    let contribution_hash = require(contribution_hash, "contribution_hash")?;
    let keymaterial = keymaterial
        .filter(|bytes| !bytes.is_empty())
        .ok_or_else(|| AppError::Validation("missing required field: keymaterial".to_string()))?;

    let recorded = state
        .coordinator
        .record_contribution(circuit, &contributor_name, &contribution_hash, keymaterial)
        .await?;

    Ok(Json(ContributionAcceptedPayload {
        circuit: recorded.circuit.to_string(),
        index: recorded.index,
        artifact_name: recorded.artifact_name,
        contributor_name: recorded.contributor_name,
        contribution_hash: recorded.contribution_hash,
    }))
}

/// POST /api/ceremony/reconcile — Run a record-store reconciliation.
#[utoipa::path(
    post,
    path = "/api/ceremony/reconcile",
    request_body = ReconcileRequest,
    responses(
        (status = 200, description = "Reconciliation outcome", body = ReconcilePayload),
        (status = 503, description = "Storage unavailable"),
    ),
    tag = "ceremony"
)]
pub(crate) async fn post_reconcile(
    State(state): State<AppState>,
    Json(body): Json<ReconcileRequest>,
) -> Result<Json<ReconcilePayload>, AppError> {
    let outcome = state.coordinator.reconcile(body.action).await?;
    Ok(Json(ReconcilePayload {
        action: match outcome.action {
            ReconcileAction::Clean => "clean".to_string(),
            ReconcileAction::Sync => "sync".to_string(),
        },
        rows: outcome.rows,
    }))
}

/// GET /api/ceremony/reconcile — Report two-store agreement.
#[utoipa::path(
    get,
    path = "/api/ceremony/reconcile",
    responses(
        (status = 200, description = "Blob vs record-store counts", body = SyncStatusPayload),
        (status = 503, description = "Storage unavailable"),
    ),
    tag = "ceremony"
)]
pub(crate) async fn get_sync_status(
    State(state): State<AppState>,
) -> Result<Json<SyncStatusPayload>, AppError> {
    let status = state.coordinator.sync_status().await?;
    Ok(Json(SyncStatusPayload {
        blob_artifacts: status.blob_artifacts,
        record_rows: status.record_rows,
        in_sync: status.in_sync,
    }))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("unreadable field: {e}")))
}

fn require(value: Option<String>, name: &str) -> Result<String, AppError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::Validation(format!("missing required field: {name}")))
}
