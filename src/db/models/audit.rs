//! Audit log models for tracking administrative actions.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::utils::now_timestamp;

/// Audit log entry
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuditLog {
    pub id: i64,
    pub action: String,
    pub actor: String,
    pub status: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub detail: Option<String>,
    pub created_at: String,
}

/// Outcome recorded with an audit entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditStatus {
    Success,
    Failure,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Failure => "Failure",
        }
    }
}

/// A new audit entry, before it has an id and timestamp
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub action: String,
    pub actor: String,
    pub status: AuditStatus,
    pub resource_type: &'static str,
    pub resource_id: Option<String>,
    pub detail: Option<String>,
}

impl NewAuditEntry {
    pub fn success(action: impl Into<String>, actor: impl Into<String>, resource_type: &'static str) -> Self {
        Self {
            action: action.into(),
            actor: actor.into(),
            status: AuditStatus::Success,
            resource_type,
            resource_id: None,
            detail: None,
        }
    }

    pub fn failure(action: impl Into<String>, actor: impl Into<String>, resource_type: &'static str) -> Self {
        Self {
            status: AuditStatus::Failure,
            ..Self::success(action, actor, resource_type)
        }
    }

    pub fn resource(mut self, id: impl ToString) -> Self {
        self.resource_id = Some(id.to_string());
        self
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Response for listing audit logs with pagination
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogListResponse {
    pub items: Vec<AuditLog>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

/// Query parameters for filtering audit logs
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AuditLogQuery {
    /// Filter by action (e.g., "request.approved")
    pub action: Option<String>,
    /// Filter by outcome ("Success" or "Failure")
    pub status: Option<String>,
    /// Filter by resource type (e.g., "contact_request")
    pub resource_type: Option<String>,
    /// Page number (1-indexed, defaults to 1)
    pub page: Option<i64>,
    /// Items per page (defaults to 50, max 100)
    pub per_page: Option<i64>,
}

/// Common audit action types
pub mod actions {
    pub const REQUEST_APPROVED: &str = "request.approved";
    pub const REQUEST_REJECTED: &str = "request.rejected";
    pub const REQUEST_TRANSITION: &str = "request.transition";
    pub const REQUEST_DELETE: &str = "request.delete";

    pub const PROVIDER_APPROVE: &str = "provider.approve";
    pub const PROVIDER_REJECT: &str = "provider.reject";

    pub const USER_REGISTER: &str = "user.register";
    pub const USER_UPDATE: &str = "user.update";
    pub const USER_DELETE: &str = "user.delete";
}

/// Common resource types
pub mod resource_types {
    pub const CONTACT_REQUEST: &str = "contact_request";
    pub const USER: &str = "user";
}

/// Insert an audit entry
pub async fn insert_audit_log(db: &SqlitePool, entry: &NewAuditEntry) -> Result<i64, sqlx::Error> {
    let now = now_timestamp();

    let result = sqlx::query(
        r#"
        INSERT INTO audit_logs (action, actor, status, resource_type, resource_id, detail, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&entry.action)
    .bind(&entry.actor)
    .bind(entry.status.as_str())
    .bind(entry.resource_type)
    .bind(&entry.resource_id)
    .bind(&entry.detail)
    .bind(&now)
    .execute(db)
    .await?;

    tracing::debug!(
        action = %entry.action,
        actor = %entry.actor,
        status = entry.status.as_str(),
        resource_id = ?entry.resource_id,
        "Audit log recorded"
    );

    Ok(result.last_insert_rowid())
}

/// List audit logs with filtering and pagination
pub async fn list_audit_logs(
    db: &SqlitePool,
    query: &AuditLogQuery,
) -> Result<AuditLogListResponse, sqlx::Error> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(50).clamp(1, 100);
    let offset = (page - 1).saturating_mul(per_page);

    // Build dynamic WHERE clause
    let mut conditions = Vec::new();
    let mut bindings: Vec<String> = Vec::new();

    if let Some(action) = &query.action {
        conditions.push("action = ?");
        bindings.push(action.clone());
    }

    if let Some(status) = &query.status {
        conditions.push("status = ?");
        bindings.push(status.clone());
    }

    if let Some(resource_type) = &query.resource_type {
        conditions.push("resource_type = ?");
        bindings.push(resource_type.clone());
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let count_sql = format!("SELECT COUNT(*) FROM audit_logs {}", where_clause);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for binding in &bindings {
        count_query = count_query.bind(binding);
    }
    let total = count_query.fetch_one(db).await?;

    let sql = format!(
        "SELECT * FROM audit_logs {} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        where_clause
    );
    let mut query_builder = sqlx::query_as::<_, AuditLog>(&sql);
    for binding in &bindings {
        query_builder = query_builder.bind(binding);
    }
    query_builder = query_builder.bind(per_page).bind(offset);

    let items = query_builder.fetch_all(db).await?;

    let total_pages = (total + per_page - 1) / per_page;

    Ok(AuditLogListResponse {
        items,
        total,
        page,
        per_page,
        total_pages,
    })
}

/// Delete a single audit entry. Returns whether it existed.
pub async fn delete_audit_log(db: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM audit_logs WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Remove every audit entry, returning how many were deleted
pub async fn clear_audit_logs(db: &SqlitePool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM audit_logs").execute(db).await?;
    Ok(result.rows_affected())
}
