//! Contact requests: a client's solicitation of a provider, gated by admin approval.

use serde::{de::Error as _, Deserialize, Deserializer, Serialize};
use sqlx::{FromRow, Sqlite, SqlitePool};

use super::{Role, User};
use crate::error::{MarketError, MarketResult};
use crate::utils::now_timestamp;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(format!("Unknown request status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContactRequest {
    pub id: i64,
    pub client_id: i64,
    pub client_name: Option<String>,
    pub provider_id: i64,
    pub provider_name: Option<String>,
    pub message: Option<String>,
    pub task_description: Option<String>,
    pub estimated_budget: Option<String>,
    pub status: String,
    pub created_at: String,
    pub approved_at: Option<String>,
    /// Set on either terminal transition
    pub resolved_at: Option<String>,
}

impl ContactRequest {
    pub fn status_enum(&self) -> RequestStatus {
        self.status.parse().unwrap_or(RequestStatus::Pending)
    }

    /// Display name of the client, falling back to a generic salutation
    pub fn client_display_name(&self) -> &str {
        self.client_name.as_deref().unwrap_or("client")
    }

    pub fn provider_display_name(&self) -> &str {
        self.provider_name.as_deref().unwrap_or("provider")
    }
}

/// Body of `POST /api/contact-requests`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateContactRequest {
    pub client_id: Option<i64>,
    pub client_name: Option<String>,
    pub provider_id: Option<i64>,
    pub provider_name: Option<String>,
    pub message: Option<String>,
    pub task_description: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub estimated_budget: Option<String>,
}

/// Budgets arrive both as free text ("5,000 KES") and as bare numbers
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expected a string or a number, found {}",
            other
        ))),
    }
}

/// Body of `PUT /api/contact-requests/:id`
#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub status: String,
}

impl ContactRequest {
    /// Create a pending request. The client must be a CLIENT account and the
    /// provider a PROVIDER account; missing display names are taken from them.
    pub async fn create(db: &SqlitePool, req: &CreateContactRequest) -> MarketResult<ContactRequest> {
        let client_id = req
            .client_id
            .ok_or_else(|| MarketError::validation("client_id", "client_id is required"))?;
        let provider_id = req
            .provider_id
            .ok_or_else(|| MarketError::validation("provider_id", "provider_id is required"))?;

        let client = User::get_by_id(db, client_id).await?.ok_or_else(|| {
            MarketError::validation("client_id", format!("Client {} does not exist", client_id))
        })?;
        let provider = User::get_by_id(db, provider_id).await?.ok_or_else(|| {
            MarketError::validation(
                "provider_id",
                format!("Provider {} does not exist", provider_id),
            )
        })?;

        if client.role_enum() != Some(Role::Client) {
            return Err(MarketError::validation(
                "client_id",
                format!("User {} is not a client", client_id),
            ));
        }
        if provider.role_enum() != Some(Role::Provider) {
            return Err(MarketError::validation(
                "provider_id",
                format!("User {} is not a provider", provider_id),
            ));
        }

        let client_name = req.client_name.clone().unwrap_or(client.name);
        let provider_name = req.provider_name.clone().unwrap_or(provider.name);
        let now = now_timestamp();

        let id = sqlx::query(
            r#"
            INSERT INTO contact_requests (client_id, client_name, provider_id, provider_name, message, task_description, estimated_budget, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, 'pending', ?)
            "#,
        )
        .bind(client_id)
        .bind(&client_name)
        .bind(provider_id)
        .bind(&provider_name)
        .bind(&req.message)
        .bind(&req.task_description)
        .bind(&req.estimated_budget)
        .bind(&now)
        .execute(db)
        .await?
        .last_insert_rowid();

        Self::get_by_id(db, id)
            .await?
            .ok_or_else(|| MarketError::not_found("Contact request", id))
    }

    pub async fn get_by_id<'e, E>(executor: E, id: i64) -> Result<Option<ContactRequest>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as("SELECT * FROM contact_requests WHERE id = ?")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Every request, newest first
    pub async fn list_all(db: &SqlitePool) -> Result<Vec<ContactRequest>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM contact_requests ORDER BY created_at DESC, id DESC")
            .fetch_all(db)
            .await
    }

    /// A client's requests: pending ones first, then resolved ones with the most
    /// recently resolved first, ties broken by creation time (newest first).
    pub async fn list_for_client(db: &SqlitePool, client_id: i64) -> Result<Vec<ContactRequest>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT * FROM contact_requests
            WHERE client_id = ?
            ORDER BY
                CASE WHEN status = 'pending' THEN 0 ELSE 1 END ASC,
                resolved_at DESC,
                created_at DESC,
                id DESC
            "#,
        )
        .bind(client_id)
        .fetch_all(db)
        .await
    }

    /// Approved requests addressed to a provider, most recently approved first
    pub async fn list_for_provider(db: &SqlitePool, provider_id: i64) -> Result<Vec<ContactRequest>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT * FROM contact_requests
            WHERE provider_id = ? AND status = 'approved'
            ORDER BY approved_at DESC, id DESC
            "#,
        )
        .bind(provider_id)
        .fetch_all(db)
        .await
    }

    /// Move a pending request to a terminal status. Returns the number of rows
    /// changed: 0 when the request is missing or no longer pending.
    pub(crate) async fn resolve<'e, E>(
        executor: E,
        id: i64,
        status: RequestStatus,
        now: &str,
    ) -> Result<u64, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let approved_at = (status == RequestStatus::Approved).then_some(now);

        let result = sqlx::query(
            r#"
            UPDATE contact_requests
            SET status = ?, approved_at = ?, resolved_at = ?
            WHERE id = ? AND status = 'pending'
            "#,
        )
        .bind(status.as_str())
        .bind(approved_at)
        .bind(now)
        .bind(id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    /// Delete a request together with its message thread
    pub async fn delete(db: &SqlitePool, id: i64) -> MarketResult<ContactRequest> {
        let request = Self::get_by_id(db, id)
            .await?
            .ok_or_else(|| MarketError::not_found("Contact request", id))?;

        sqlx::query("DELETE FROM contact_requests WHERE id = ?")
            .bind(id)
            .execute(db)
            .await?;

        Ok(request)
    }
}
