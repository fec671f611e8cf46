//! # Health Probes
//!
//! Unauthenticated liveness endpoint for deployment orchestration.

use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::AppState;

/// Liveness response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthPayload {
    pub status: String,
}

/// Build the health router.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(get_health))
}

/// GET /health — Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is live", body = HealthPayload)),
    tag = "health"
)]
pub(crate) async fn get_health() -> Json<HealthPayload> {
    Json(HealthPayload {
        status: "ok".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppConfig;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_returns_ok() {
        let app = router().with_state(AppState::in_memory(AppConfig::default()));
        let resp = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let payload: HealthPayload = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(payload.status, "ok");
    }
}
