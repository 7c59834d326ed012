use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{request::Parts, HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::crypto::{generate_token, hash_password, hash_token, tokens_match, verify_password};
use crate::db::{
    actions, resource_types, Alert, AlertSeverity, LoginRequest, LoginResponse, NewAuditEntry,
    NewUser, RegisterRequest, Role, Session, User, UserResponse, UserStatus,
};
use crate::engine::record_audit;
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{
    parse_registration_role, validate_email, validate_name, validate_password, validate_phone,
};
use super::MessageResponse;

#[derive(Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: UserResponse,
}

#[derive(Serialize)]
pub struct MeResponse {
    pub user: UserResponse,
}

/// Extract the bearer token from request headers
fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get("Authorization").and_then(|h| h.to_str().ok()) {
        if let Some(token) = auth_header.strip_prefix("Bearer ") {
            return Some(token.trim().to_string());
        }
    }

    // Fall back to X-API-Key header
    headers
        .get("X-API-Key")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
}

/// Whoever is calling an endpoint
#[derive(Debug, Clone)]
pub enum Caller {
    /// Presented the configured admin token
    AdminToken,
    /// Logged-in account
    User(User),
}

impl Caller {
    pub fn is_admin(&self) -> bool {
        match self {
            Caller::AdminToken => true,
            Caller::User(user) => user.is_admin(),
        }
    }

    /// Name recorded as the actor of audited actions
    pub fn actor(&self) -> String {
        match self {
            Caller::AdminToken => "admin-token".to_string(),
            Caller::User(user) => user.email.clone(),
        }
    }

    pub fn user_id(&self) -> Option<i64> {
        match self {
            Caller::AdminToken => None,
            Caller::User(user) => Some(user.id),
        }
    }
}

/// Resolve the caller from the bearer token
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Caller, ApiError> {
    let token = extract_token(headers).ok_or_else(|| ApiError::unauthorized("Missing token"))?;

    // Constant-time check against the configured admin token first
    if tokens_match(&state.config.auth.admin_token, &token) {
        return Ok(Caller::AdminToken);
    }

    Session::user_for_token_hash(&state.db, &hash_token(&token))
        .await?
        .map(Caller::User)
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired token"))
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        authenticate(state, &parts.headers).await
    }
}

/// A logged-in account (the admin token does not count)
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        match authenticate(state, &parts.headers).await? {
            Caller::User(user) => Ok(AuthUser(user)),
            Caller::AdminToken => Err(ApiError::unauthorized(
                "This endpoint requires a user session",
            )),
        }
    }
}

/// Admin token holder or an ADMIN account
pub struct AdminActor(pub Caller);

impl AdminActor {
    pub fn actor(&self) -> String {
        self.0.actor()
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AdminActor {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let caller = authenticate(state, &parts.headers).await?;
        if !caller.is_admin() {
            return Err(ApiError::forbidden("Administrator access required"));
        }
        Ok(AdminActor(caller))
    }
}

/// Register a client or provider account. Providers start out pending.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    errors.check("name", validate_name(&request.name));
    errors.check("email", validate_email(&request.email));
    errors.check("password", validate_password(&request.password));
    let role = parse_registration_role(&request.role);
    if let Err(message) = &role {
        errors.add("role", message.clone());
    }
    if let Some(phone) = &request.phone_number {
        errors.check("phone_number", validate_phone(phone));
    }
    errors.finish()?;
    let role = role.map_err(|e| ApiError::validation_field("role", e))?;

    if User::get_by_email(&state.db, &request.email).await?.is_some() {
        return Err(ApiError::conflict("User already exists"));
    }

    let password_hash = hash_password(&request.password)
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {}", e)))?;
    let status = UserStatus::initial_for(role);

    let user = User::create(
        &state.db,
        &NewUser {
            name: request.name.trim(),
            email: &request.email,
            password_hash: &password_hash,
            role,
            status,
            phone_number: request.phone_number.as_deref(),
        },
    )
    .await?;

    tracing::info!(user_id = user.id, role = %role, "Registered account");

    record_audit(
        state.audit.as_ref(),
        NewAuditEntry::success(actions::USER_REGISTER, &user.email, resource_types::USER)
            .resource(user.id)
            .detail(format!("{} registered as {}", user.name, role)),
    )
    .await;

    if role == Role::Provider {
        if let Err(e) = Alert::create(
            &state.db,
            "Provider awaiting approval",
            &format!("{} ({}) registered as a provider", user.name, user.email),
            AlertSeverity::Warning,
        )
        .await
        {
            tracing::warn!(error = %e, "Failed to raise provider registration alert");
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User created".to_string(),
            user: UserResponse::from(user),
        }),
    ))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = User::get_by_email(&state.db, &request.email)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    if !verify_password(&request.password, &user.password_hash) {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let token = generate_token();
    let expires_at = chrono::Duration::try_hours(state.config.auth.session_hours)
        .and_then(|lifetime| chrono::Utc::now().checked_add_signed(lifetime))
        .ok_or_else(|| ApiError::internal("Session expiry out of range"))?
        .to_rfc3339_opts(chrono::SecondsFormat::Micros, true);

    Session::create(&state.db, user.id, &hash_token(&token), &expires_at).await?;

    tracing::debug!(user_id = user.id, "Session created");

    Ok(Json(LoginResponse {
        token,
        user: UserResponse::from(user),
    }))
}

pub async fn me(AuthUser(user): AuthUser) -> Json<MeResponse> {
    Json(MeResponse {
        user: UserResponse::from(user),
    })
}

/// End the presented session
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<MessageResponse>, ApiError> {
    let token = extract_token(&headers).ok_or_else(|| ApiError::unauthorized("Missing token"))?;
    Session::delete_by_token_hash(&state.db, &hash_token(&token)).await?;
    Ok(Json(MessageResponse::new("Logged out")))
}
