//! Per-request chat thread. Messages are append-only; only `read_at` changes.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Sqlite, SqlitePool};

use super::ContactRequest;
use crate::error::{MarketError, MarketResult};
use crate::utils::now_timestamp;

/// Display name used for messages authored by the platform
pub const SYSTEM_SENDER_NAME: &str = "KIND App";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum SenderRole {
    Client,
    Provider,
    System,
}

impl SenderRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Client => "CLIENT",
            Self::Provider => "PROVIDER",
            Self::System => "SYSTEM",
        }
    }
}

impl std::fmt::Display for SenderRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SenderRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "CLIENT" => Ok(Self::Client),
            "PROVIDER" => Ok(Self::Provider),
            "SYSTEM" => Ok(Self::System),
            _ => Err(format!("Unknown sender role: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Message {
    pub id: i64,
    pub contact_request_id: i64,
    pub sender_id: i64,
    pub sender_name: Option<String>,
    pub sender_role: String,
    pub message: String,
    pub created_at: String,
    pub read_at: Option<String>,
}

/// Body of `POST /api/messages`
#[derive(Debug, Deserialize)]
pub struct CreateMessageRequest {
    pub contact_request_id: Option<i64>,
    pub sender_id: Option<i64>,
    pub sender_name: Option<String>,
    #[serde(default)]
    pub sender_role: String,
    #[serde(default)]
    pub message: String,
}

impl Message {
    /// Append a participant's chat message. The sender must be the request's
    /// client (role CLIENT) or provider (role PROVIDER). System messages are
    /// rejected here; they are only written by the request lifecycle.
    pub async fn append(
        db: &SqlitePool,
        contact_request_id: i64,
        sender_id: i64,
        sender_name: Option<&str>,
        sender_role: SenderRole,
        text: &str,
    ) -> MarketResult<Message> {
        if text.trim().is_empty() {
            return Err(MarketError::validation("message", "Message text is required"));
        }
        if sender_role == SenderRole::System {
            return Err(MarketError::validation(
                "sender_role",
                "System messages cannot be posted directly",
            ));
        }

        let request = ContactRequest::get_by_id(db, contact_request_id)
            .await?
            .ok_or_else(|| MarketError::not_found("Contact request", contact_request_id))?;

        let participant = match sender_role {
            SenderRole::Client => Some(request.client_id),
            SenderRole::Provider => Some(request.provider_id),
            SenderRole::System => None,
        };
        if participant != Some(sender_id) {
            return Err(MarketError::validation(
                "sender_id",
                format!(
                    "User {} is not the {} of request {}",
                    sender_id,
                    sender_role.as_str().to_lowercase(),
                    contact_request_id
                ),
            ));
        }

        let id = Self::insert(db, contact_request_id, sender_id, sender_name, sender_role, text).await?;

        Self::get_by_id(db, id)
            .await?
            .ok_or_else(|| MarketError::not_found("Message", id))
    }

    /// Write the platform's message into a request thread. Runs inside the
    /// transaction that approves the request.
    pub(crate) async fn insert_system<'e, E>(
        executor: E,
        contact_request_id: i64,
        system_user_id: i64,
        text: &str,
    ) -> Result<i64, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        Self::insert(
            executor,
            contact_request_id,
            system_user_id,
            Some(SYSTEM_SENDER_NAME),
            SenderRole::System,
            text,
        )
        .await
    }

    async fn insert<'e, E>(
        executor: E,
        contact_request_id: i64,
        sender_id: i64,
        sender_name: Option<&str>,
        sender_role: SenderRole,
        text: &str,
    ) -> Result<i64, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            r#"
            INSERT INTO messages (contact_request_id, sender_id, sender_name, sender_role, message, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(contact_request_id)
        .bind(sender_id)
        .bind(sender_name)
        .bind(sender_role.as_str())
        .bind(text)
        .bind(now_timestamp())
        .execute(executor)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn get_by_id(db: &SqlitePool, id: i64) -> Result<Option<Message>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM messages WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// The thread of a request in the order it was written
    pub async fn list_for_request(
        db: &SqlitePool,
        contact_request_id: i64,
    ) -> Result<Vec<Message>, sqlx::Error> {
        sqlx::query_as(
            "SELECT * FROM messages WHERE contact_request_id = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(contact_request_id)
        .fetch_all(db)
        .await
    }

    /// Mark a message as read. The first read timestamp is kept.
    pub async fn mark_read(db: &SqlitePool, id: i64) -> MarketResult<Message> {
        let result = sqlx::query("UPDATE messages SET read_at = COALESCE(read_at, ?) WHERE id = ?")
            .bind(now_timestamp())
            .bind(id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(MarketError::not_found("Message", id));
        }

        Self::get_by_id(db, id)
            .await?
            .ok_or_else(|| MarketError::not_found("Message", id))
    }
}
