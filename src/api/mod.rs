mod admin;
mod alerts;
mod audit;
pub mod auth;
mod contact_requests;
pub mod error;
mod messages;
mod users;
mod validation;

#[cfg(test)]
mod tests;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::AppState;

/// `{"message": "..."}` acknowledgement body
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    // Auth is enforced per handler through the AdminActor / AuthUser / Caller extractors
    let api_routes = Router::new()
        .route("/", get(api_index))
        // Accounts
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .route("/users", get(users::list_users))
        .route("/users/:id", put(users::update_user).delete(users::delete_user))
        // Provider moderation
        .route("/admin/pending-providers", get(admin::pending_providers))
        .route("/admin/providers/:id/status", put(admin::set_provider_status))
        // Contact requests
        .route(
            "/contact-requests",
            get(contact_requests::list_requests).post(contact_requests::create_request),
        )
        .route(
            "/contact-requests/:id",
            get(contact_requests::get_request)
                .put(contact_requests::transition_request)
                .delete(contact_requests::delete_request),
        )
        .route("/contact-requests/client/:id", get(contact_requests::list_for_client))
        .route("/contact-requests/provider/:id", get(contact_requests::list_for_provider))
        // Messages
        .route("/messages", post(messages::post_message))
        .route("/messages/:id", get(messages::list_messages))
        .route("/messages/:id/read", put(messages::mark_read))
        // Audit log
        .route("/logs", get(audit::list_logs).delete(audit::clear_logs))
        .route("/logs/:id", axum::routing::delete(audit::delete_log))
        // Alerts
        .route("/alerts", get(alerts::list_alerts).delete(alerts::clear_alerts))
        .route("/alerts/read-all", put(alerts::mark_all_read))
        .route("/alerts/:id", axum::routing::delete(alerts::delete_alert))
        .route("/alerts/:id/read", put(alerts::mark_read));

    let cors = build_cors_layer(&state.config.server.cors_origins);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn build_cors_layer(allowed_origins: &str) -> CorsLayer {
    if allowed_origins.trim() == "*" {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| match s.parse::<HeaderValue>() {
            Ok(origin) => Some(origin),
            Err(_) => {
                warn!(origin = %s, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    info!("CORS: restricted to {} origin(s)", origins.len());

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::HeaderName::from_static("x-api-key"),
        ])
}

async fn health_check() -> &'static str {
    "OK"
}

async fn api_index() -> Json<MessageResponse> {
    Json(MessageResponse::new("KIND Service API is running"))
}
