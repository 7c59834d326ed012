use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::db::{actions, resource_types, NewAuditEntry, UpdateUserRequest, User, UserResponse};
use crate::engine::record_audit;
use crate::AppState;

use super::auth::{AdminActor, Caller};
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_email, validate_name, validate_phone};
use super::MessageResponse;

/// GET /api/users
pub async fn list_users(
    _admin: AdminActor,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = User::list(&state.db).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Update profile fields. Users may edit their own profile; admins any.
pub async fn update_user(
    caller: Caller,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(update): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    if !caller.is_admin() && caller.user_id() != Some(id) {
        return Err(ApiError::forbidden("You can only update your own profile"));
    }

    let mut errors = ValidationErrorBuilder::new();
    if let Some(name) = &update.name {
        errors.check("name", validate_name(name));
    }
    if let Some(email) = &update.email {
        errors.check("email", validate_email(email));
    }
    if let Some(phone) = &update.phone_number {
        errors.check("phone_number", validate_phone(phone));
    }
    errors.finish()?;

    let user = User::update_profile(&state.db, id, &update).await?;

    record_audit(
        state.audit.as_ref(),
        NewAuditEntry::success(actions::USER_UPDATE, caller.actor(), resource_types::USER)
            .resource(id)
            .detail(format!("Updated profile of {}", user.name)),
    )
    .await;

    Ok(Json(UserResponse::from(user)))
}

/// Delete an account together with the requests it takes part in
pub async fn delete_user(
    admin: AdminActor,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    let user = User::delete(&state.db, id).await?;

    tracing::info!(user_id = id, actor = %admin.actor(), "User deleted");

    record_audit(
        state.audit.as_ref(),
        NewAuditEntry::success(actions::USER_DELETE, admin.actor(), resource_types::USER)
            .resource(id)
            .detail(format!("Deleted: {}", user.name)),
    )
    .await;

    Ok(Json(MessageResponse::new("User deleted")))
}
