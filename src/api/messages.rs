use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::db::{CreateMessageRequest, Message, SenderRole};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};

/// Post a chat message into a request thread
pub async fn post_message(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateMessageRequest>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    if req.contact_request_id.is_none() {
        errors.add("contact_request_id", "contact_request_id is required");
    }
    if req.sender_id.is_none() {
        errors.add("sender_id", "sender_id is required");
    }
    let role = req.sender_role.parse::<SenderRole>();
    if let Err(e) = &role {
        errors.add("sender_role", e.clone());
    }
    errors.finish()?;

    let (Some(request_id), Some(sender_id), Ok(role)) = (req.contact_request_id, req.sender_id, role)
    else {
        return Err(ApiError::bad_request("Invalid message"));
    };

    let message = Message::append(
        &state.db,
        request_id,
        sender_id,
        req.sender_name.as_deref(),
        role,
        &req.message,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(message)))
}

/// The thread of a request, oldest first
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    Path(contact_request_id): Path<i64>,
) -> Result<Json<Vec<Message>>, ApiError> {
    Ok(Json(
        Message::list_for_request(&state.db, contact_request_id).await?,
    ))
}

pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Message>, ApiError> {
    Ok(Json(Message::mark_read(&state.db, id).await?))
}
