//! # OpenAPI Document
//!
//! Auto-generated OpenAPI 3 spec assembled from the route handlers'
//! `#[utoipa::path]` annotations and the payload schemas.

use utoipa::OpenApi;

use crate::error::{ErrorBody, ErrorDetail};
use crate::routes::ceremony::{
    CeremonyStatusPayload, CircuitStatusPayload, ContributionAcceptedPayload, ContributionPayload,
    KeyMaterialPayload, ReconcilePayload, ReconcileRequest, SyncStatusPayload, UploadTargetPayload,
};
use crate::routes::health::HealthPayload;
use crate::routes::proofs::{
    EncodeRequest, EncodeResponse, GenerateRequest, GenerateResponse, PlaceholderPayload,
    ProofPayload, VerifyRequest, VerifyResponse,
};

/// The zkRune proof service API document.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "zkRune Proof Service",
        description = "Trusted-setup ceremony coordination, zero-knowledge proof generation, and compact on-chain proof encoding."
    ),
    paths(
        crate::routes::health::get_health,
        crate::routes::ceremony::get_status,
        crate::routes::ceremony::get_keymaterial,
        crate::routes::ceremony::get_upload_target,
        crate::routes::ceremony::post_contribution,
        crate::routes::ceremony::post_reconcile,
        crate::routes::ceremony::get_sync_status,
        crate::routes::proofs::post_generate,
        crate::routes::proofs::post_verify,
        crate::routes::proofs::post_encode,
    ),
    components(schemas(
        ErrorBody,
        ErrorDetail,
        HealthPayload,
        CeremonyStatusPayload,
        CircuitStatusPayload,
        ContributionPayload,
        ContributionAcceptedPayload,
        KeyMaterialPayload,
        UploadTargetPayload,
        ReconcileRequest,
        ReconcilePayload,
        SyncStatusPayload,
        GenerateRequest,
        GenerateResponse,
        ProofPayload,
        PlaceholderPayload,
        VerifyRequest,
        VerifyResponse,
        EncodeRequest,
        EncodeResponse,
    )),
    tags(
        (name = "ceremony", description = "Trusted-setup ceremony coordination"),
        (name = "proofs", description = "Proof generation, verification, and encoding"),
        (name = "health", description = "Deployment probes"),
    )
)]
pub struct ApiDoc;
