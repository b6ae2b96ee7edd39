//! Audit log routes.

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use domain::models::{AuditEntry, ListAuditLogsQuery};
use serde::Serialize;

use crate::app::AppState;
use crate::error::ApiError;

/// Create audit logs router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_audit_logs))
}

/// Response for audit log listing.
#[derive(Debug, Serialize)]
pub struct ListAuditLogsResponse {
    pub data: Vec<AuditEntry>,
    pub limit: i64,
}

/// List audit entries, newest first, filtered by collection, document,
/// user or action.
///
/// GET /api/v1/admin/audit-logs
pub async fn list_audit_logs(
    State(state): State<AppState>,
    Query(query): Query<ListAuditLogsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let data = state.audit_logs.list(&query).await?;

    Ok(Json(ListAuditLogsResponse {
        data,
        limit: query.effective_limit(),
    }))
}
