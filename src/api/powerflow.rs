//! Power flow endpoints: structured results and CSV download

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::error::ApiError;
use crate::error::PowerFlowError;
use crate::results::{
    branch_checks, csv_filename, to_csv, BranchCheck, LogLine, ResultTable, TableKind,
};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PowerFlowQuery {
    pub rid: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PowerFlowResponse {
    pub rid: String,
    pub buses: ResultTable,
    pub branches: ResultTable,
    pub logs: Vec<LogLine>,
    pub checks: Vec<BranchCheck>,
    pub computed_at: DateTime<Utc>,
}

fn resolve_rid(state: &AppState, rid: Option<String>) -> String {
    match rid {
        Some(rid) if !rid.trim().is_empty() => rid.trim().to_string(),
        _ => state.default_rid.to_string(),
    }
}

/// GET /api/powerflow?rid=
pub async fn run_power_flow(
    State(st): State<AppState>,
    Query(q): Query<PowerFlowQuery>,
) -> Result<Json<PowerFlowResponse>, ApiError> {
    let rid = resolve_rid(&st, q.rid);
    let outcome = st
        .orchestrator
        .run_power_flow(&rid)
        .await
        .map_err(|e| ApiError::new(rid.as_str(), e))?;

    let checks = branch_checks(&outcome.branches);
    Ok(Json(PowerFlowResponse {
        rid: outcome.rid,
        buses: outcome.buses,
        branches: outcome.branches,
        logs: outcome.logs,
        checks,
        computed_at: Utc::now(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub rid: Option<String>,
    pub table: Option<String>,
}

/// GET /api/export/csv?rid=&table=buses|branches
///
/// Recomputes the power flow on every download.
pub async fn export_csv(
    State(st): State<AppState>,
    Query(q): Query<ExportQuery>,
) -> Result<Response, ApiError> {
    let rid = resolve_rid(&st, q.rid);
    let requested = q.table.unwrap_or_else(|| TableKind::Buses.to_string());
    let table = TableKind::from_str(requested.trim()).map_err(|_| {
        ApiError::new(
            rid.as_str(),
            PowerFlowError::Validation(format!(
                "table must be 'buses' or 'branches', got '{requested}'"
            )),
        )
    })?;

    let outcome = st
        .orchestrator
        .run_power_flow(&rid)
        .await
        .map_err(|e| ApiError::new(rid.as_str(), e))?;
    let selected = match table {
        TableKind::Buses => &outcome.buses,
        TableKind::Branches => &outcome.branches,
    };

    let bytes = to_csv(selected).map_err(|e| {
        ApiError::new(
            rid.as_str(),
            PowerFlowError::Computation(format!("CSV encoding failed: {e}")),
        )
    })?;
    let filename = csv_filename(&rid, table);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}
