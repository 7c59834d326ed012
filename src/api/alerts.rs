//! Admin alert inbox.

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::db::Alert;
use crate::AppState;

use super::auth::AdminActor;
use super::error::ApiError;
use super::MessageResponse;

/// GET /api/alerts
pub async fn list_alerts(
    _admin: AdminActor,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Alert>>, ApiError> {
    Ok(Json(Alert::list(&state.db).await?))
}

/// PUT /api/alerts/:id/read
pub async fn mark_read(
    _admin: AdminActor,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    if !Alert::mark_read(&state.db, id).await? {
        return Err(ApiError::not_found(format!("Alert {} not found", id)));
    }
    Ok(Json(MessageResponse::new("Alert marked as read")))
}

/// PUT /api/alerts/read-all
pub async fn mark_all_read(
    _admin: AdminActor,
    State(state): State<Arc<AppState>>,
) -> Result<Json<MessageResponse>, ApiError> {
    Alert::mark_all_read(&state.db).await?;
    Ok(Json(MessageResponse::new("All alerts marked as read")))
}

/// DELETE /api/alerts/:id
pub async fn delete_alert(
    _admin: AdminActor,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    if !Alert::delete(&state.db, id).await? {
        return Err(ApiError::not_found(format!("Alert {} not found", id)));
    }
    Ok(Json(MessageResponse::new("Alert deleted")))
}

/// DELETE /api/alerts
pub async fn clear_alerts(
    _admin: AdminActor,
    State(state): State<Arc<AppState>>,
) -> Result<Json<MessageResponse>, ApiError> {
    Alert::clear(&state.db).await?;
    Ok(Json(MessageResponse::new("Cleared")))
}
