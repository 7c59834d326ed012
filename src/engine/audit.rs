use async_trait::async_trait;

use crate::db::{insert_audit_log, NewAuditEntry};
use crate::DbPool;

/// Destination for audit entries of administrative actions.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, entry: &NewAuditEntry) -> anyhow::Result<()>;
}

/// Writes audit entries to the `audit_logs` table
pub struct SqliteAuditSink {
    db: DbPool,
}

impl SqliteAuditSink {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuditSink for SqliteAuditSink {
    async fn record(&self, entry: &NewAuditEntry) -> anyhow::Result<()> {
        insert_audit_log(&self.db, entry).await?;
        Ok(())
    }
}

/// Record an entry, logging instead of failing when the sink errors
pub async fn record_audit(sink: &dyn AuditSink, entry: NewAuditEntry) {
    if let Err(e) = sink.record(&entry).await {
        tracing::warn!(
            action = %entry.action,
            resource_type = entry.resource_type,
            error = %e,
            "Failed to create audit log entry"
        );
    }
}
