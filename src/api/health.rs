use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::AppState;

/// Liveness response; the remote runner is not probed
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    timestamp: chrono::DateTime<chrono::Utc>,
    default_rid: String,
    poll_timeout_secs: u64,
}

/// GET /healthz
pub async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: chrono::Utc::now(),
        default_rid: state.default_rid.to_string(),
        poll_timeout_secs: state.orchestrator.poll_settings().timeout.as_secs(),
    })
}
