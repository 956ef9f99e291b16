pub mod error;
pub mod health;
pub mod powerflow;

use axum::{routing::get, Router};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::{config::Config, state::AppState};

pub fn router(state: AppState, cfg: &Config) -> Router {
    let mut router = Router::new()
        .route("/api/powerflow", get(powerflow::run_power_flow))
        .route("/api/export/csv", get(powerflow::export_csv))
        .route("/healthz", get(health::healthz))
        .with_state(state);

    if cfg.server.enable_cors {
        use tower_http::cors::Any;
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([axum::http::Method::GET])
            .expose_headers([axum::http::header::CONTENT_DISPOSITION]);
        router = router.layer(cors);
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TimeoutLayer::new(Duration::from_secs(cfg.server.request_timeout_secs))),
        )
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::MockComputationRunner;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use std::sync::Arc;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_healthz() {
        let cfg = Config::default();
        let app = router(
            AppState::with_runner(&cfg, Arc::new(MockComputationRunner::new())),
            &cfg,
        );
        let resp = app
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let v: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(v["status"], "healthy");
        assert_eq!(v["default_rid"], "model/CloudPSS/IEEE3");
        assert_eq!(v["poll_timeout_secs"], 180);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let cfg = Config::default();
        let app = router(
            AppState::with_runner(&cfg, Arc::new(MockComputationRunner::new())),
            &cfg,
        );
        let resp = app
            .oneshot(Request::builder().uri("/api/v1/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
