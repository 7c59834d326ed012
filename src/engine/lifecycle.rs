//! State machine for contact requests.
//!
//! A request moves exactly once from `pending` to `approved` or `rejected`.
//! Approval writes a system message into the request thread in the same
//! transaction as the status change, then notifies the parties on a
//! detached task.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

use super::audit::{record_audit, AuditSink};
use crate::db::{
    actions, resource_types, ContactRequest, Message, NewAuditEntry, RequestStatus, User,
};
use crate::error::{MarketError, MarketResult};
use crate::notifications::{DispatchReport, Notifier};
use crate::utils::now_timestamp;
use crate::DbPool;

/// Result of a completed transition
#[derive(Debug)]
pub struct TransitionOutcome {
    pub request: ContactRequest,
    /// Id of the system message written on approval
    pub system_message_id: Option<i64>,
    /// Detached notification task, present on approval
    pub notifications: Option<JoinHandle<DispatchReport>>,
}

pub struct LifecycleManager {
    db: DbPool,
    audit: Arc<dyn AuditSink>,
    notifier: Notifier,
}

/// Text of the message the platform posts when a request is approved
pub fn approval_notice(client_name: &str) -> String {
    format!(
        "Hello {}, your request has been approved. Terms & 50% deposit apply.",
        client_name
    )
}

impl LifecycleManager {
    pub fn new(db: DbPool, audit: Arc<dyn AuditSink>, notifier: Notifier) -> Self {
        Self {
            db,
            audit,
            notifier,
        }
    }

    /// Move a pending request to `target` on behalf of `actor`.
    ///
    /// Fails with `NotFound` for unknown ids and with `InvalidTransition` when
    /// the request is no longer pending or `target` is `pending`.
    pub async fn transition(
        &self,
        id: i64,
        target: RequestStatus,
        actor: &str,
    ) -> MarketResult<TransitionOutcome> {
        if !target.is_terminal() {
            let current = ContactRequest::get_by_id(&self.db, id)
                .await?
                .ok_or_else(|| MarketError::not_found("Contact request", id))?;
            return Err(self.reject_transition(&current, target, actor).await);
        }

        let now = now_timestamp();
        let mut tx = self.db.begin().await?;

        let changed = ContactRequest::resolve(&mut *tx, id, target, &now).await?;
        if changed == 0 {
            let current = ContactRequest::get_by_id(&mut *tx, id).await?;
            tx.rollback().await?;
            return match current {
                Some(current) => Err(self.reject_transition(&current, target, actor).await),
                None => Err(MarketError::not_found("Contact request", id)),
            };
        }

        let request = ContactRequest::get_by_id(&mut *tx, id)
            .await?
            .ok_or_else(|| MarketError::not_found("Contact request", id))?;

        let system_message_id = if target == RequestStatus::Approved {
            let system_id = User::system_account_id(&mut *tx)
                .await?
                .ok_or(MarketError::SystemAccountMissing)?;
            let notice = approval_notice(request.client_display_name());
            Some(Message::insert_system(&mut *tx, id, system_id, &notice).await?)
        } else {
            None
        };

        tx.commit().await?;

        info!(
            request_id = id,
            status = %target,
            actor = %actor,
            "Contact request resolved"
        );

        let action = match target {
            RequestStatus::Approved => actions::REQUEST_APPROVED,
            _ => actions::REQUEST_REJECTED,
        };
        record_audit(
            self.audit.as_ref(),
            NewAuditEntry::success(action, actor, resource_types::CONTACT_REQUEST)
                .resource(id)
                .detail(format!("{} for {}", target, request.client_display_name())),
        )
        .await;

        let notifications = (target == RequestStatus::Approved)
            .then(|| self.notifier.request_approved(&request));

        Ok(TransitionOutcome {
            request,
            system_message_id,
            notifications,
        })
    }

    /// Audit a refused transition on an existing request and build its error
    async fn reject_transition(
        &self,
        current: &ContactRequest,
        target: RequestStatus,
        actor: &str,
    ) -> MarketError {
        let error = MarketError::InvalidTransition {
            id: current.id,
            from: current.status_enum(),
            to: target,
        };

        tracing::warn!(request_id = current.id, error = %error, "Refused request transition");

        record_audit(
            self.audit.as_ref(),
            NewAuditEntry::failure(
                actions::REQUEST_TRANSITION,
                actor,
                resource_types::CONTACT_REQUEST,
            )
            .resource(current.id)
            .detail(error.to_string()),
        )
        .await;

        error
    }
}
