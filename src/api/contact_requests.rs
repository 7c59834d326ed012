use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::db::{
    actions, resource_types, ContactRequest, CreateContactRequest, NewAuditEntry, RequestStatus,
    TransitionRequest,
};
use crate::engine::record_audit;
use crate::AppState;

use super::auth::AdminActor;
use super::error::ApiError;
use super::MessageResponse;

#[derive(Debug, Serialize)]
pub struct RequestSubmitted {
    pub id: i64,
    pub message: String,
    pub status: String,
}

/// Submit a new request from a client to a provider
pub async fn create_request(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateContactRequest>,
) -> Result<(StatusCode, Json<RequestSubmitted>), ApiError> {
    let request = ContactRequest::create(&state.db, &req).await?;

    tracing::info!(
        request_id = request.id,
        client_id = request.client_id,
        provider_id = request.provider_id,
        "Contact request submitted"
    );

    Ok((
        StatusCode::CREATED,
        Json(RequestSubmitted {
            id: request.id,
            message: "Request submitted".to_string(),
            status: request.status,
        }),
    ))
}

pub async fn list_requests(
    _admin: AdminActor,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ContactRequest>>, ApiError> {
    Ok(Json(ContactRequest::list_all(&state.db).await?))
}

pub async fn get_request(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ContactRequest>, ApiError> {
    ContactRequest::get_by_id(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Contact request {} not found", id)))
}

/// A client's requests, unresolved first
pub async fn list_for_client(
    State(state): State<Arc<AppState>>,
    Path(client_id): Path<i64>,
) -> Result<Json<Vec<ContactRequest>>, ApiError> {
    Ok(Json(ContactRequest::list_for_client(&state.db, client_id).await?))
}

/// Approved requests addressed to a provider
pub async fn list_for_provider(
    State(state): State<Arc<AppState>>,
    Path(provider_id): Path<i64>,
) -> Result<Json<Vec<ContactRequest>>, ApiError> {
    Ok(Json(ContactRequest::list_for_provider(&state.db, provider_id).await?))
}

/// Approve or reject a pending request
pub async fn transition_request(
    admin: AdminActor,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<TransitionRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let target: RequestStatus = body
        .status
        .parse()
        .map_err(|e: String| ApiError::validation_field("status", e))?;

    // The notification task runs detached; its handle is not needed here
    let outcome = state
        .lifecycle
        .transition(id, target, &admin.actor())
        .await?;

    Ok(Json(MessageResponse::new(format!(
        "Request {}",
        outcome.request.status
    ))))
}

/// Delete a request and its message thread
pub async fn delete_request(
    admin: AdminActor,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    let request = ContactRequest::delete(&state.db, id).await?;

    record_audit(
        state.audit.as_ref(),
        NewAuditEntry::success(
            actions::REQUEST_DELETE,
            admin.actor(),
            resource_types::CONTACT_REQUEST,
        )
        .resource(id)
        .detail(format!(
            "Deleted request from {} to {}",
            request.client_display_name(),
            request.provider_display_name()
        )),
    )
    .await;

    Ok(Json(MessageResponse::new("Request deleted")))
}
