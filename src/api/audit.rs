//! Audit log API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;

use crate::db::{
    clear_audit_logs, delete_audit_log, list_audit_logs, AuditLogListResponse, AuditLogQuery,
};
use crate::AppState;

use super::auth::AdminActor;
use super::error::ApiError;
use super::MessageResponse;

/// List audit logs with filtering and pagination
///
/// Query parameters:
/// - action: Filter by action type (e.g., "request.approved")
/// - status: Filter by outcome ("Success" or "Failure")
/// - resource_type: Filter by resource type (e.g., "contact_request")
/// - page: Page number (1-indexed, default 1)
/// - per_page: Items per page (default 50, max 100)
pub async fn list_logs(
    _admin: AdminActor,
    State(state): State<Arc<AppState>>,
    Query(query): Query<AuditLogQuery>,
) -> Result<Json<AuditLogListResponse>, ApiError> {
    Ok(Json(list_audit_logs(&state.db, &query).await?))
}

pub async fn clear_logs(
    _admin: AdminActor,
    State(state): State<Arc<AppState>>,
) -> Result<Json<MessageResponse>, ApiError> {
    let removed = clear_audit_logs(&state.db).await?;
    tracing::info!(removed = removed, "Audit log cleared");
    Ok(Json(MessageResponse::new("Cleared")))
}

pub async fn delete_log(
    _admin: AdminActor,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    if !delete_audit_log(&state.db, id).await? {
        return Err(ApiError::not_found(format!("Log entry {} not found", id)));
    }
    Ok(Json(MessageResponse::new("Log deleted")))
}
