//! Fixtures shared by the test modules.

use super::{init_in_memory, ContactRequest, CreateContactRequest, DbPool, Role, UserStatus};
use crate::utils::now_timestamp;

pub(crate) async fn setup() -> DbPool {
    init_in_memory().await.expect("in-memory database")
}

/// Insert an account with a fixed id
pub(crate) async fn seed_user(db: &DbPool, id: i64, name: &str, role: Role) {
    sqlx::query(
        r#"
        INSERT INTO users (id, name, email, password_hash, role, status, phone_number, created_at)
        VALUES (?, ?, ?, '', ?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(format!("user{}@example.com", id))
    .bind(role.as_str())
    .bind(UserStatus::initial_for(role).as_str())
    .bind(format!("+2547000000{:02}", id % 100))
    .bind(now_timestamp())
    .execute(db)
    .await
    .expect("seed user");
}

/// Client 10, provider 20 and one pending request between them
pub(crate) async fn seed_request(db: &DbPool) -> ContactRequest {
    seed_user(db, 10, "Wanjiru", Role::Client).await;
    seed_user(db, 20, "Otieno", Role::Provider).await;

    ContactRequest::create(
        db,
        &CreateContactRequest {
            client_id: Some(10),
            provider_id: Some(20),
            message: Some("Need a plumber".to_string()),
            ..Default::default()
        },
    )
    .await
    .expect("seed request")
}
