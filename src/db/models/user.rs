//! User accounts, sessions and the DTOs around them.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Sqlite, SqlitePool};

use crate::error::{MarketError, MarketResult};
use crate::utils::now_timestamp;

/// Account role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Client,
    Provider,
    Admin,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Client => "CLIENT",
            Self::Provider => "PROVIDER",
            Self::Admin => "ADMIN",
            Self::System => "SYSTEM",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "CLIENT" => Ok(Self::Client),
            "PROVIDER" => Ok(Self::Provider),
            "ADMIN" => Ok(Self::Admin),
            "SYSTEM" => Ok(Self::System),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// Account-level approval state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Pending,
    Rejected,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Pending => "pending",
            Self::Rejected => "rejected",
        }
    }

    /// Initial status for a freshly registered account
    pub fn initial_for(role: Role) -> Self {
        match role {
            Role::Provider => Self::Pending,
            _ => Self::Active,
        }
    }
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "pending" => Ok(Self::Pending),
            "rejected" => Ok(Self::Rejected),
            _ => Err(format!("Unknown user status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub status: String,
    pub phone_number: Option<String>,
    pub service: Option<String>,
    pub location: Option<String>,
    pub motivation: Option<String>,
    pub qualifications: Option<String>,
    pub photo_url: Option<String>,
    pub certificates_url: Option<String>,
    pub rating: Option<f64>,
    pub jobs_done: i64,
    pub created_at: String,
}

impl User {
    pub fn role_enum(&self) -> Option<Role> {
        self.role.parse().ok()
    }

    pub fn is_admin(&self) -> bool {
        self.role_enum() == Some(Role::Admin)
    }
}

/// Public view of a user, without credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
    pub status: String,
    pub phone_number: Option<String>,
    pub service: Option<String>,
    pub location: Option<String>,
    pub motivation: Option<String>,
    pub qualifications: Option<String>,
    pub photo_url: Option<String>,
    pub certificates_url: Option<String>,
    pub rating: Option<f64>,
    pub jobs_done: i64,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            status: user.status,
            phone_number: user.phone_number,
            service: user.service,
            location: user.location,
            motivation: user.motivation,
            qualifications: user.qualifications,
            photo_url: user.photo_url,
            certificates_url: user.certificates_url,
            rating: user.rating,
            jobs_done: user.jobs_done,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    pub id: String,
    pub user_id: i64,
    pub token_hash: String,
    pub expires_at: String,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: String,
    pub phone_number: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

/// Profile fields a user (or an admin) may change
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub service: Option<String>,
    pub location: Option<String>,
    pub motivation: Option<String>,
    pub qualifications: Option<String>,
    pub photo_url: Option<String>,
    pub certificates_url: Option<String>,
}

/// Values for a new account row
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: Role,
    pub status: UserStatus,
    pub phone_number: Option<&'a str>,
}

impl User {
    pub async fn create(db: &SqlitePool, new: &NewUser<'_>) -> Result<User, sqlx::Error> {
        let now = now_timestamp();
        let id = sqlx::query(
            r#"
            INSERT INTO users (name, email, password_hash, role, status, phone_number, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.name)
        .bind(new.email)
        .bind(new.password_hash)
        .bind(new.role.as_str())
        .bind(new.status.as_str())
        .bind(new.phone_number)
        .bind(&now)
        .execute(db)
        .await?
        .last_insert_rowid();

        Self::get_by_id(db, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn get_by_id<'e, E>(executor: E, id: i64) -> Result<Option<User>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn get_by_email(db: &SqlitePool, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(db)
            .await
    }

    /// Id of the account that authors system messages
    pub async fn system_account_id<'e, E>(executor: E) -> Result<Option<i64>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        sqlx::query_scalar("SELECT id FROM users WHERE role = 'SYSTEM' ORDER BY id LIMIT 1")
            .fetch_optional(executor)
            .await
    }

    /// All human accounts, newest first
    pub async fn list(db: &SqlitePool) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM users WHERE role != 'SYSTEM' ORDER BY created_at DESC, id DESC")
            .fetch_all(db)
            .await
    }

    pub async fn list_pending_providers(db: &SqlitePool) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as(
            "SELECT * FROM users WHERE role = 'PROVIDER' AND status = 'pending' ORDER BY created_at ASC, id ASC",
        )
        .fetch_all(db)
        .await
    }

    /// Set the account status of a provider. Fails with `NotFound` when the id
    /// does not belong to a provider.
    pub async fn set_provider_status(
        db: &SqlitePool,
        id: i64,
        status: UserStatus,
    ) -> MarketResult<User> {
        let result = sqlx::query("UPDATE users SET status = ? WHERE id = ? AND role = 'PROVIDER'")
            .bind(status.as_str())
            .bind(id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(MarketError::not_found("Provider", id));
        }

        Self::get_by_id(db, id)
            .await?
            .ok_or_else(|| MarketError::not_found("Provider", id))
    }

    /// Apply a partial profile update. Absent fields keep their value.
    pub async fn update_profile(
        db: &SqlitePool,
        id: i64,
        update: &UpdateUserRequest,
    ) -> MarketResult<User> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                name = COALESCE(?, name),
                email = COALESCE(?, email),
                phone_number = COALESCE(?, phone_number),
                service = COALESCE(?, service),
                location = COALESCE(?, location),
                motivation = COALESCE(?, motivation),
                qualifications = COALESCE(?, qualifications),
                photo_url = COALESCE(?, photo_url),
                certificates_url = COALESCE(?, certificates_url)
            WHERE id = ? AND role != 'SYSTEM'
            "#,
        )
        .bind(&update.name)
        .bind(&update.email)
        .bind(&update.phone_number)
        .bind(&update.service)
        .bind(&update.location)
        .bind(&update.motivation)
        .bind(&update.qualifications)
        .bind(&update.photo_url)
        .bind(&update.certificates_url)
        .bind(id)
        .execute(db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(MarketError::not_found("User", id));
        }

        Self::get_by_id(db, id)
            .await?
            .ok_or_else(|| MarketError::not_found("User", id))
    }

    /// Delete an account. Contact requests where the user is client or
    /// provider go with it, and their messages cascade from those requests.
    pub async fn delete(db: &SqlitePool, id: i64) -> MarketResult<User> {
        let user = Self::get_by_id(db, id)
            .await?
            .ok_or_else(|| MarketError::not_found("User", id))?;

        if user.role_enum() == Some(Role::System) {
            return Err(MarketError::validation(
                "id",
                "The system account cannot be deleted",
            ));
        }

        let mut tx = db.begin().await?;
        sqlx::query("DELETE FROM contact_requests WHERE client_id = ? OR provider_id = ?")
            .bind(id)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(user)
    }
}

impl Session {
    pub async fn create(
        db: &SqlitePool,
        user_id: i64,
        token_hash: &str,
        expires_at: &str,
    ) -> Result<(), sqlx::Error> {
        let id = uuid::Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO sessions (id, user_id, token_hash, expires_at, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .bind(now_timestamp())
        .execute(db)
        .await?;
        Ok(())
    }

    /// Resolve the owner of an unexpired session
    pub async fn user_for_token_hash(
        db: &SqlitePool,
        token_hash: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT users.* FROM sessions
            JOIN users ON users.id = sessions.user_id
            WHERE sessions.token_hash = ? AND sessions.expires_at > ?
            "#,
        )
        .bind(token_hash)
        .bind(now_timestamp())
        .fetch_optional(db)
        .await
    }

    pub async fn delete_by_token_hash(db: &SqlitePool, token_hash: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
            .bind(token_hash)
            .execute(db)
            .await?;
        Ok(result.rows_affected())
    }
}
