//! # zkr-api — Axum API Service
//!
//! The HTTP surface of the zkRune proof service:
//!
//! - `/api/ceremony/*` — trusted-setup ceremony status, key-material
//!   descriptors, contribution submission, reconciliation
//! - `/api/proofs/*` — proof generation, verification, compact encoding
//! - `/health` — deployment probes (unauthenticated)
//! - `/metrics` — Prometheus scrape endpoint (when enabled)
//!
//! ## Architecture
//!
//! Request/response types are compile-time contracts via serde derive,
//! with OpenAPI schemas generated through utoipa. Route handlers hold no
//! business logic — they parse, delegate to the domain crates, and map
//! results. All errors map to structured HTTP responses via [`AppError`].

pub mod error;
pub mod metrics;
pub mod openapi;
pub mod routes;
pub mod state;

pub use error::AppError;
pub use metrics::ApiMetrics;
pub use state::{AppConfig, AppState};

use axum::middleware::from_fn;
use axum::routing::get;
use axum::{Extension, Json, Router};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

/// Assemble the full application router.
pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        .merge(routes::health::router())
        .merge(routes::ceremony::router())
        .merge(routes::proofs::router())
        .route(
            "/api/openapi.json",
            get(|| async { Json(openapi::ApiDoc::openapi()) }),
        );

    if state.config.metrics_enabled {
        let api_metrics = ApiMetrics::new();
        router = router
            .route("/metrics", get(metrics::get_metrics))
            .layer(from_fn(metrics::track_requests))
            .layer(Extension(api_metrics));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn app_serves_merged_routes() {
        let app = app(AppState::in_memory(AppConfig::default()));

        for uri in [
            "/health",
            "/api/ceremony/status",
            "/api/openapi.json",
            "/metrics",
        ] {
            let resp = app
                .clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::OK, "GET {uri}");
        }
    }

    #[tokio::test]
    async fn metrics_route_absent_when_disabled() {
        let config = AppConfig {
            metrics_enabled: false,
            ..AppConfig::default()
        };
        let app = app(AppState::in_memory(config));
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn metrics_scrape_counts_requests() {
        let app = app(AppState::in_memory(AppConfig::default()));

        app.clone()
            .oneshot(
                Request::builder()
                    .uri("/api/ceremony/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let bytes = http_body_util::BodyExt::collect(resp.into_body())
            .await
            .unwrap()
            .to_bytes();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("zkr_http_requests_total"));
        assert!(text.contains("/api/ceremony/status"));
        assert!(text.contains("zkr_ceremony_min_contributions"));
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let app = app(AppState::in_memory(AppConfig::default()));
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/api/nothing")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
