//! Database seeders for built-in accounts
//!
//! Runs on every startup; each seeder is idempotent.

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::info;

use super::{NewUser, Role, User, UserStatus};
use crate::crypto::hash_password;
use crate::utils::now_timestamp;

/// Email of the account that authors platform messages
pub const SYSTEM_EMAIL: &str = "system@kind.app";

/// Seed the system account. It has no password and cannot log in.
pub async fn seed_system_account(pool: &SqlitePool) -> Result<()> {
    let result = sqlx::query(
        r#"
        INSERT OR IGNORE INTO users (name, email, password_hash, role, status, created_at)
        VALUES ('KIND App', ?, '', ?, ?, ?)
        "#,
    )
    .bind(SYSTEM_EMAIL)
    .bind(Role::System.as_str())
    .bind(UserStatus::Active.as_str())
    .bind(now_timestamp())
    .execute(pool)
    .await?;

    if result.rows_affected() > 0 {
        info!("Seeded system account {}", SYSTEM_EMAIL);
    }
    Ok(())
}

/// Create the bootstrap administrator if no account uses that email yet.
/// Returns whether an account was created.
pub async fn ensure_admin_user(pool: &SqlitePool, email: &str, password: &str) -> Result<bool> {
    if User::get_by_email(pool, email).await?.is_some() {
        return Ok(false);
    }

    let password_hash = hash_password(password)
        .map_err(|e| anyhow::anyhow!("Failed to hash admin password: {}", e))?;

    User::create(
        pool,
        &NewUser {
            name: "Administrator",
            email,
            password_hash: &password_hash,
            role: Role::Admin,
            status: UserStatus::Active,
            phone_number: None,
        },
    )
    .await
    .context("Failed to create admin user")?;

    info!("Created admin user {}", email);
    Ok(true)
}
