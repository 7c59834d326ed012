//! Administrator alerts: platform events that need a human to look at them.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::utils::now_timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Critical,
    Warning,
    Info,
    Success,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Critical => "critical",
            AlertSeverity::Warning => "warning",
            AlertSeverity::Info => "info",
            AlertSeverity::Success => "success",
        }
    }
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Alert {
    pub id: i64,
    pub title: String,
    pub message: String,
    pub severity: String,
    #[sqlx(try_from = "i64")]
    pub is_read: bool,
    pub created_at: String,
}

impl Alert {
    pub async fn create(
        db: &SqlitePool,
        title: &str,
        message: &str,
        severity: AlertSeverity,
    ) -> Result<Alert, sqlx::Error> {
        let id = sqlx::query(
            "INSERT INTO alerts (title, message, severity, is_read, created_at) VALUES (?, ?, ?, 0, ?)",
        )
        .bind(title)
        .bind(message)
        .bind(severity.as_str())
        .bind(now_timestamp())
        .execute(db)
        .await?
        .last_insert_rowid();

        Self::get_by_id(db, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn get_by_id(db: &SqlitePool, id: i64) -> Result<Option<Alert>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM alerts WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// All alerts, newest first
    pub async fn list(db: &SqlitePool) -> Result<Vec<Alert>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM alerts ORDER BY created_at DESC, id DESC")
            .fetch_all(db)
            .await
    }

    /// Returns false when no alert has that id
    pub async fn mark_read(db: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE alerts SET is_read = 1 WHERE id = ?")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn mark_all_read(db: &SqlitePool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE alerts SET is_read = 1 WHERE is_read = 0")
            .execute(db)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete(db: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM alerts WHERE id = ?")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn clear(db: &SqlitePool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM alerts").execute(db).await?;
        Ok(result.rows_affected())
    }
}
