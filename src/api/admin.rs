//! Provider account moderation.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::db::{actions, resource_types, NewAuditEntry, User, UserResponse, UserStatus};
use crate::engine::record_audit;
use crate::AppState;

use super::auth::AdminActor;
use super::error::ApiError;
use super::MessageResponse;

#[derive(Debug, Deserialize)]
pub struct ProviderStatusRequest {
    pub status: String,
}

/// Providers waiting for a decision, oldest first
///
/// GET /api/admin/pending-providers
pub async fn pending_providers(
    _admin: AdminActor,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let providers = User::list_pending_providers(&state.db).await?;
    Ok(Json(providers.into_iter().map(UserResponse::from).collect()))
}

/// Approve (`active`) or reject a provider account
///
/// PUT /api/admin/providers/:id/status
pub async fn set_provider_status(
    admin: AdminActor,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<ProviderStatusRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let status = match body.status.parse::<UserStatus>() {
        Ok(status @ (UserStatus::Active | UserStatus::Rejected)) => status,
        _ => {
            return Err(ApiError::validation_field(
                "status",
                "Status must be 'active' or 'rejected'",
            ))
        }
    };

    let provider = User::set_provider_status(&state.db, id, status).await?;

    let (action, verb) = match status {
        UserStatus::Active => (actions::PROVIDER_APPROVE, "Approved"),
        _ => (actions::PROVIDER_REJECT, "Rejected"),
    };

    tracing::info!(provider_id = id, status = %status, actor = %admin.actor(), "Provider status changed");

    record_audit(
        state.audit.as_ref(),
        NewAuditEntry::success(action, admin.actor(), resource_types::USER)
            .resource(id)
            .detail(format!("{} provider: {} ({})", verb, provider.name, provider.email)),
    )
    .await;

    // Delivered in the background
    let _ = state.notifier.provider_status_changed(&provider, status);

    Ok(Json(MessageResponse::new(format!("Provider {}", status))))
}
