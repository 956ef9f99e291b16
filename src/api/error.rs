use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::error::PowerFlowError;

/// A core error bound to the request that produced it
#[derive(Debug, Error)]
#[error("{source}")]
pub struct ApiError {
    pub rid: Option<String>,
    #[source]
    pub source: PowerFlowError,
}

/// Error payload; callers check for `error` even on 200 responses
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    rid: Option<String>,
}

impl ApiError {
    pub fn new(rid: impl Into<String>, source: PowerFlowError) -> Self {
        Self {
            rid: Some(rid.into()),
            source,
        }
    }

    /// Failed or timed-out computations complete the request normally
    fn status_code(&self) -> StatusCode {
        match self.source {
            PowerFlowError::Computation(_) | PowerFlowError::Timeout { .. } => StatusCode::OK,
            PowerFlowError::Validation(_) | PowerFlowError::Configuration(_) => {
                StatusCode::BAD_REQUEST
            }
        }
    }
}

impl From<PowerFlowError> for ApiError {
    fn from(source: PowerFlowError) -> Self {
        Self { rid: None, source }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self.source {
            PowerFlowError::Computation(_) | PowerFlowError::Timeout { .. } => {
                tracing::warn!(rid = ?self.rid, error = %self.source, "power flow request failed");
            }
            _ => tracing::debug!(rid = ?self.rid, error = %self.source, "rejected request"),
        }

        let body = ErrorResponse {
            error: self.source.to_string(),
            kind: self.source.kind(),
            rid: self.rid,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            ApiError::from(PowerFlowError::Computation("x".into())).status_code(),
            StatusCode::OK
        );
        assert_eq!(
            ApiError::from(PowerFlowError::Timeout {
                waited: Duration::from_secs(1)
            })
            .status_code(),
            StatusCode::OK
        );
        assert_eq!(
            ApiError::from(PowerFlowError::Validation("x".into())).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(PowerFlowError::Configuration("x".into())).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_error_display_is_core_message() {
        let error = ApiError::new("model/a/b", PowerFlowError::Computation("job failed".into()));
        assert_eq!(error.to_string(), "computation failed: job failed");
    }
}
