//! End-to-end tests of the HTTP surface against an in-memory database.

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use super::create_router;
use crate::config::Config;
use crate::db::testing::{seed_request, seed_user, setup};
use crate::db::{Alert, ContactRequest, Message, Role};
use crate::notifications::testing::RecordingDispatcher;
use crate::{AppState, DbPool};

const ADMIN_TOKEN: &str = "test-admin-token";

async fn test_app() -> (Router, DbPool) {
    let db = setup().await;
    let mut config = Config::default();
    config.auth.admin_token = ADMIN_TOKEN.to_string();

    let state = Arc::new(AppState::new(
        config,
        db.clone(),
        Arc::new(RecordingDispatcher::default()),
    ));
    (create_router(state), db)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, value)
}

async fn register_and_login(app: &Router, name: &str, email: &str, role: &str) -> (i64, String) {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/register",
        None,
        Some(json!({
            "name": name,
            "email": email,
            "password": "Sup3r-secret",
            "role": role,
            "phone_number": "+254712345678"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let id = body["user"]["id"].as_i64().unwrap();

    let (status, body) = send(
        app,
        Method::POST,
        "/api/login",
        None,
        Some(json!({ "email": email, "password": "Sup3r-secret" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    (id, body["token"].as_str().unwrap().to_string())
}

#[tokio::test]
async fn test_health_and_index() {
    let (app, _) = test_app().await;

    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("OK".to_string()));

    let (status, body) = send(&app, Method::GET, "/api", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "KIND Service API is running");
}

#[tokio::test]
async fn test_approve_then_reject_over_http() {
    let (app, db) = test_app().await;
    seed_request(&db).await;

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/contact-requests/1",
        Some(ADMIN_TOKEN),
        Some(json!({ "status": "approved" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Request approved");

    let (status, thread) = send(&app, Method::GET, "/api/messages/1", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let thread = thread.as_array().unwrap();
    assert_eq!(thread.len(), 1);
    assert_eq!(thread[0]["sender_role"], "SYSTEM");
    assert_eq!(thread[0]["sender_name"], "KIND App");

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/contact-requests/1",
        Some(ADMIN_TOKEN),
        Some(json!({ "status": "rejected" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_transition");

    let (status, body) = send(&app, Method::GET, "/api/contact-requests/1", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "approved");
    assert!(body["approved_at"].is_string());

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/contact-requests/999",
        Some(ADMIN_TOKEN),
        Some(json!({ "status": "approved" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn test_transition_requires_admin() {
    let (app, db) = test_app().await;
    seed_request(&db).await;
    let (_, client_token) = register_and_login(&app, "Amina", "amina@example.com", "CLIENT").await;

    let body = Some(json!({ "status": "approved" }));
    let (status, _) = send(&app, Method::PUT, "/api/contact-requests/1", None, body.clone()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/contact-requests/1",
        Some("wrong-token"),
        body.clone(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/contact-requests/1",
        Some(&client_token),
        body,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "forbidden");

    let stored = ContactRequest::get_by_id(&db, 1).await.unwrap().unwrap();
    assert_eq!(stored.status, "pending");
}

#[tokio::test]
async fn test_unknown_status_is_a_validation_error() {
    let (app, db) = test_app().await;
    seed_request(&db).await;

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/contact-requests/1",
        Some(ADMIN_TOKEN),
        Some(json!({ "status": "cancelled" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "validation_error");
    assert!(body["error"]["details"]["status"].is_array());
}

#[tokio::test]
async fn test_submit_and_list_requests() {
    let (app, db) = test_app().await;
    seed_user(&db, 10, "Wanjiru", Role::Client).await;
    seed_user(&db, 20, "Otieno", Role::Provider).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/contact-requests",
        None,
        Some(json!({
            "client_id": 10,
            "client_name": "Wanjiru K.",
            "provider_id": 20,
            "message": "Leaking sink",
            "task_description": "Kitchen sink leaks under the cabinet",
            "estimated_budget": 2500
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Request submitted");
    assert_eq!(body["status"], "pending");
    let id = body["id"].as_i64().unwrap();

    let (_, list) = send(&app, Method::GET, "/api/contact-requests/client/10", None, None).await;
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["client_name"], "Wanjiru K.");
    assert_eq!(list[0]["provider_name"], "Otieno");
    assert_eq!(list[0]["estimated_budget"], "2500");

    // Providers only see approved work
    let (_, list) = send(&app, Method::GET, "/api/contact-requests/provider/20", None, None).await;
    assert!(list.as_array().unwrap().is_empty());

    send(
        &app,
        Method::PUT,
        &format!("/api/contact-requests/{}", id),
        Some(ADMIN_TOKEN),
        Some(json!({ "status": "approved" })),
    )
    .await;
    let (_, list) = send(&app, Method::GET, "/api/contact-requests/provider/20", None, None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, Method::GET, "/api/contact-requests", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, all) = send(&app, Method::GET, "/api/contact-requests", Some(ADMIN_TOKEN), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_submit_requires_participants() {
    let (app, db) = test_app().await;
    seed_user(&db, 10, "Wanjiru", Role::Client).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/contact-requests",
        None,
        Some(json!({ "client_id": 10, "message": "Hello" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["details"]["provider_id"].is_array());

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/contact-requests",
        None,
        Some(json!({ "client_id": 10, "provider_id": 77 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // A client cannot be addressed as a provider
    seed_user(&db, 11, "Amina", Role::Client).await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/contact-requests",
        None,
        Some(json!({ "client_id": 10, "provider_id": 11 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["details"]["provider_id"].is_array());
}

#[tokio::test]
async fn test_message_endpoints() {
    let (app, db) = test_app().await;
    seed_request(&db).await;

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/messages",
        None,
        Some(json!({
            "contact_request_id": 1,
            "sender_id": 10,
            "sender_name": "Wanjiru",
            "sender_role": "CLIENT",
            "message": "When can you come?"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["message"], "When can you come?");
    assert!(created["read_at"].is_null());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/messages",
        None,
        Some(json!({
            "contact_request_id": 1,
            "sender_id": 10,
            "sender_role": "SYSTEM",
            "message": "Deposit waived"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["details"]["sender_role"].is_array());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/messages",
        None,
        Some(json!({
            "contact_request_id": 1,
            "sender_id": 20,
            "sender_role": "PROVIDER",
            "message": "   "
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["details"]["message"].is_array());

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/messages",
        None,
        Some(json!({
            "contact_request_id": 42,
            "sender_id": 20,
            "sender_role": "PROVIDER",
            "message": "Hello?"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/messages",
        None,
        Some(json!({
            "contact_request_id": 1,
            "sender_id": 10,
            "sender_role": "PROVIDER",
            "message": "I am the plumber now"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["details"]["sender_id"].is_array());

    let id = created["id"].as_i64().unwrap();
    let (status, read) = send(&app, Method::PUT, &format!("/api/messages/{}/read", id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(read["read_at"].is_string());

    let (_, thread) = send(&app, Method::GET, "/api/messages/1", None, None).await;
    assert_eq!(thread.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_register_login_me_logout() {
    let (app, _) = test_app().await;
    let (id, token) = register_and_login(&app, "Amina", "amina@example.com", "client").await;

    let (status, body) = send(&app, Method::GET, "/api/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], id);
    assert_eq!(body["user"]["role"], "CLIENT");
    assert_eq!(body["user"]["status"], "active");
    assert!(body["user"].get("password_hash").is_none());

    let (status, _) = send(&app, Method::POST, "/api/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::GET, "/api/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/login",
        None,
        Some(json!({ "email": "amina@example.com", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_registration_rules() {
    let (app, db) = test_app().await;
    register_and_login(&app, "Otieno", "otieno@example.com", "PROVIDER").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/register",
        None,
        Some(json!({
            "name": "Otieno Again",
            "email": "otieno@example.com",
            "password": "Sup3r-secret",
            "role": "CLIENT"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "conflict");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/register",
        None,
        Some(json!({
            "name": "Mallory",
            "email": "mallory@example.com",
            "password": "Sup3r-secret",
            "role": "ADMIN"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["details"]["role"].is_array());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/register",
        None,
        Some(json!({ "name": "", "email": "bad", "password": "x", "role": "CLIENT" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let details = body["error"]["details"].as_object().unwrap();
    assert!(details.contains_key("name"));
    assert!(details.contains_key("email"));
    assert!(details.contains_key("password"));

    // The provider registration raised an alert for the admins
    let alerts = Alert::list(&db).await.unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].severity, "warning");
}

#[tokio::test]
async fn test_provider_moderation() {
    let (app, _) = test_app().await;
    let (provider_id, _) =
        register_and_login(&app, "Otieno", "otieno@example.com", "PROVIDER").await;

    let (status, pending) = send(
        &app,
        Method::GET,
        "/api/admin/pending-providers",
        Some(ADMIN_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending.as_array().unwrap().len(), 1);
    assert_eq!(pending[0]["status"], "pending");

    let uri = format!("/api/admin/providers/{}/status", provider_id);
    let (status, _) = send(
        &app,
        Method::PUT,
        &uri,
        Some(ADMIN_TOKEN),
        Some(json!({ "status": "pending" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::PUT,
        &uri,
        Some(ADMIN_TOKEN),
        Some(json!({ "status": "active" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Provider active");

    let (_, pending) = send(
        &app,
        Method::GET,
        "/api/admin/pending-providers",
        Some(ADMIN_TOKEN),
        None,
    )
    .await;
    assert!(pending.as_array().unwrap().is_empty());

    let (status, logs) = send(
        &app,
        Method::GET,
        "/api/logs?action=provider.approve",
        Some(ADMIN_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(logs["total"], 1);
    assert_eq!(logs["items"][0]["actor"], "admin-token");

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/admin/providers/999/status",
        Some(ADMIN_TOKEN),
        Some(json!({ "status": "rejected" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_profile_updates() {
    let (app, _) = test_app().await;
    let (amina, amina_token) = register_and_login(&app, "Amina", "amina@example.com", "CLIENT").await;
    let (juma, _) = register_and_login(&app, "Juma", "juma@example.com", "CLIENT").await;

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/users/{}", amina),
        Some(&amina_token),
        Some(json!({ "location": "Kisumu" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["location"], "Kisumu");
    assert_eq!(body["name"], "Amina");

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/users/{}", juma),
        Some(&amina_token),
        Some(json!({ "location": "Mombasa" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/users/{}", amina),
        Some(&amina_token),
        Some(json!({ "email": "juma@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/users/{}", juma),
        Some(ADMIN_TOKEN),
        Some(json!({ "phone_number": "not a phone" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["details"]["phone_number"].is_array());
}

#[tokio::test]
async fn test_delete_user_cascades() {
    let (app, db) = test_app().await;
    seed_request(&db).await;
    Message::append(&db, 1, 10, None, crate::db::SenderRole::Client, "Hello")
        .await
        .unwrap();

    let (status, users) = send(&app, Method::GET, "/api/users", Some(ADMIN_TOKEN), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(users.as_array().unwrap().iter().all(|u| u["role"] != "SYSTEM"));

    let (status, body) = send(&app, Method::DELETE, "/api/users/10", Some(ADMIN_TOKEN), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User deleted");

    assert!(ContactRequest::get_by_id(&db, 1).await.unwrap().is_none());
    assert!(Message::list_for_request(&db, 1).await.unwrap().is_empty());

    let (status, _) = send(&app, Method::DELETE, "/api/users/10", Some(ADMIN_TOKEN), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let system_id = crate::db::User::system_account_id(&db).await.unwrap().unwrap();
    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/users/{}", system_id),
        Some(ADMIN_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_request_removes_thread() {
    let (app, db) = test_app().await;
    seed_request(&db).await;
    send(
        &app,
        Method::PUT,
        "/api/contact-requests/1",
        Some(ADMIN_TOKEN),
        Some(json!({ "status": "approved" })),
    )
    .await;

    let (status, _) = send(&app, Method::DELETE, "/api/contact-requests/1", Some(ADMIN_TOKEN), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, thread) = send(&app, Method::GET, "/api/messages/1", None, None).await;
    assert!(thread.as_array().unwrap().is_empty());

    let (status, _) = send(&app, Method::DELETE, "/api/contact-requests/1", Some(ADMIN_TOKEN), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, logs) = send(&app, Method::GET, "/api/logs?action=request.delete", Some(ADMIN_TOKEN), None).await;
    assert_eq!(logs["total"], 1);
}

#[tokio::test]
async fn test_alert_and_log_maintenance() {
    let (app, db) = test_app().await;
    let alert = Alert::create(&db, "SMS failed", "Gateway timeout", crate::db::AlertSeverity::Critical)
        .await
        .unwrap();
    Alert::create(&db, "SMS failed", "Gateway timeout", crate::db::AlertSeverity::Critical)
        .await
        .unwrap();

    let (status, _) = send(&app, Method::GET, "/api/alerts", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/alerts/{}/read", alert.id),
        Some(ADMIN_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::PUT, "/api/alerts/read-all", Some(ADMIN_TOKEN), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, alerts) = send(&app, Method::GET, "/api/alerts", Some(ADMIN_TOKEN), None).await;
    assert!(alerts.as_array().unwrap().iter().all(|a| a["is_read"] == true));

    let (status, _) = send(&app, Method::DELETE, "/api/alerts/999", Some(ADMIN_TOKEN), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, "/api/alerts", Some(ADMIN_TOKEN), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(Alert::list(&db).await.unwrap().is_empty());

    seed_request(&db).await;
    send(
        &app,
        Method::PUT,
        "/api/contact-requests/1",
        Some(ADMIN_TOKEN),
        Some(json!({ "status": "rejected" })),
    )
    .await;
    let (_, logs) = send(&app, Method::GET, "/api/logs", Some(ADMIN_TOKEN), None).await;
    assert_eq!(logs["total"], 1);
    let log_id = logs["items"][0]["id"].as_i64().unwrap();

    let (status, _) = send(&app, Method::DELETE, &format!("/api/logs/{}", log_id), Some(ADMIN_TOKEN), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, Method::DELETE, &format!("/api/logs/{}", log_id), Some(ADMIN_TOKEN), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::DELETE, "/api/logs", Some(ADMIN_TOKEN), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_logs_page_far_past_the_end() {
    let (app, db) = test_app().await;
    seed_request(&db).await;
    send(
        &app,
        Method::PUT,
        "/api/contact-requests/1",
        Some(ADMIN_TOKEN),
        Some(json!({ "status": "approved" })),
    )
    .await;

    let (status, logs) = send(
        &app,
        Method::GET,
        "/api/logs?page=9223372036854775807",
        Some(ADMIN_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(logs["total"], 1);
    assert!(logs["items"].as_array().unwrap().is_empty());
}
