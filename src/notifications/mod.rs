//! Outbound notifications (SMS) for request and provider events.
//!
//! The [`Notifier`] turns a domain event into one intent per audience and
//! delivers them on a detached task. Every intent is independent: a failure
//! is logged and raised as an admin alert, and never reaches the caller that
//! triggered the event.

mod sms;
pub mod templates;

pub use sms::SmsGatewayDispatcher;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::config::NotificationConfig;
use crate::db::{Alert, AlertSeverity, ContactRequest, User, UserStatus};
use crate::DbPool;
use templates::TemplateParams;

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Gateway rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Unknown notification template: {0}")]
    UnknownTemplate(String),

    #[error("Delivery timed out after {0:?}")]
    Timeout(Duration),
}

/// Sends a templated message to a phone number.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    async fn notify(
        &self,
        recipient_phone: &str,
        template_id: &str,
        params: &TemplateParams,
    ) -> Result<(), DeliveryError>;
}

/// Renders messages into the log instead of sending them.
pub struct LogDispatcher;

#[async_trait]
impl NotificationDispatcher for LogDispatcher {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn notify(
        &self,
        recipient_phone: &str,
        template_id: &str,
        params: &TemplateParams,
    ) -> Result<(), DeliveryError> {
        let message = templates::render(template_id, params)?;
        tracing::info!(
            to = %recipient_phone,
            template = template_id,
            message = %message,
            "Notification (no SMS gateway configured)"
        );
        Ok(())
    }
}

/// Pick the dispatcher for the configured environment
pub fn build_dispatcher(
    config: &NotificationConfig,
) -> Result<Arc<dyn NotificationDispatcher>, DeliveryError> {
    match &config.gateway_url {
        Some(url) if !url.trim().is_empty() => {
            tracing::info!(url = %url, "Using SMS gateway for notifications");
            Ok(Arc::new(SmsGatewayDispatcher::new(
                url.clone(),
                config.gateway_api_key.clone(),
                config.gateway_username.clone(),
                config.sender_id.clone(),
                config.timeout(),
            )?))
        }
        _ => {
            tracing::info!("No SMS gateway configured, notifications will be logged");
            Ok(Arc::new(LogDispatcher))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Admin,
    Client,
    Provider,
}

impl Audience {
    pub fn as_str(&self) -> &'static str {
        match self {
            Audience::Admin => "admin",
            Audience::Client => "client",
            Audience::Provider => "provider",
        }
    }
}

/// One message to one party
#[derive(Debug, Clone)]
pub struct NotificationIntent {
    pub audience: Audience,
    pub phone: Option<String>,
    pub template_id: &'static str,
    pub params: TemplateParams,
}

/// Outcome of delivering a batch of intents
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct Notifier {
    dispatcher: Arc<dyn NotificationDispatcher>,
    db: DbPool,
    admin_phone: Option<String>,
    timeout: Duration,
}

impl Notifier {
    pub fn new(
        dispatcher: Arc<dyn NotificationDispatcher>,
        db: DbPool,
        admin_phone: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            dispatcher,
            db,
            admin_phone,
            timeout,
        }
    }

    /// Notify the admin, the client and the provider that a request was
    /// approved. Runs detached; the handle resolves once every intent has
    /// been attempted.
    pub fn request_approved(&self, request: &ContactRequest) -> JoinHandle<DispatchReport> {
        let notifier = self.clone();
        let request = request.clone();

        tokio::spawn(async move {
            let client_phone = notifier.phone_of(request.client_id).await;
            let provider_phone = notifier.phone_of(request.provider_id).await;

            let params = TemplateParams::from([
                ("request_id", request.id.to_string()),
                ("client_name", request.client_display_name().to_string()),
                ("provider_name", request.provider_display_name().to_string()),
            ]);

            let intents = vec![
                NotificationIntent {
                    audience: Audience::Admin,
                    phone: notifier.admin_phone.clone(),
                    template_id: templates::REQUEST_APPROVED_ADMIN,
                    params: params.clone(),
                },
                NotificationIntent {
                    audience: Audience::Client,
                    phone: client_phone,
                    template_id: templates::REQUEST_APPROVED_CLIENT,
                    params: params.clone(),
                },
                NotificationIntent {
                    audience: Audience::Provider,
                    phone: provider_phone,
                    template_id: templates::REQUEST_APPROVED_PROVIDER,
                    params,
                },
            ];

            notifier.deliver(intents).await
        })
    }

    /// Notify the admin and the provider about an account decision
    pub fn provider_status_changed(
        &self,
        provider: &User,
        status: UserStatus,
    ) -> JoinHandle<DispatchReport> {
        let decision = match status {
            UserStatus::Active => "APPROVED",
            UserStatus::Rejected => "REJECTED",
            UserStatus::Pending => "PENDING",
        };
        let params = TemplateParams::from([
            ("provider_name", provider.name.clone()),
            ("provider_email", provider.email.clone()),
            ("status", decision.to_string()),
        ]);

        let intents = vec![
            NotificationIntent {
                audience: Audience::Admin,
                phone: self.admin_phone.clone(),
                template_id: templates::PROVIDER_STATUS_ADMIN,
                params: params.clone(),
            },
            NotificationIntent {
                audience: Audience::Provider,
                phone: provider.phone_number.clone(),
                template_id: templates::PROVIDER_STATUS_PROVIDER,
                params,
            },
        ];

        let notifier = self.clone();
        tokio::spawn(async move { notifier.deliver(intents).await })
    }

    async fn phone_of(&self, user_id: i64) -> Option<String> {
        match User::get_by_id(&self.db, user_id).await {
            Ok(user) => user.and_then(|u| u.phone_number),
            Err(e) => {
                tracing::warn!(user_id = user_id, error = %e, "Failed to load recipient phone");
                None
            }
        }
    }

    /// Attempt every intent, each bounded by the configured timeout
    pub async fn deliver(&self, intents: Vec<NotificationIntent>) -> DispatchReport {
        let mut report = DispatchReport::default();

        for intent in intents {
            let Some(phone) = intent.phone.as_deref().filter(|p| !p.trim().is_empty()) else {
                tracing::debug!(
                    audience = intent.audience.as_str(),
                    template = intent.template_id,
                    "Recipient has no phone number, skipping notification"
                );
                report.skipped += 1;
                continue;
            };

            let outcome = tokio::time::timeout(
                self.timeout,
                self.dispatcher.notify(phone, intent.template_id, &intent.params),
            )
            .await
            .unwrap_or(Err(DeliveryError::Timeout(self.timeout)));

            match outcome {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::error!(
                        dispatcher = self.dispatcher.name(),
                        audience = intent.audience.as_str(),
                        template = intent.template_id,
                        error = %e,
                        "Failed to deliver notification"
                    );
                    self.raise_delivery_alert(&intent, &e).await;
                }
            }
        }

        report
    }

    async fn raise_delivery_alert(&self, intent: &NotificationIntent, error: &DeliveryError) {
        let message = format!(
            "Could not notify the {} ({}): {}",
            intent.audience.as_str(),
            intent.template_id,
            error
        );
        if let Err(e) = Alert::create(
            &self.db,
            "Notification delivery failed",
            &message,
            AlertSeverity::Critical,
        )
        .await
        {
            tracing::warn!(error = %e, "Failed to record delivery alert");
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Records every call and always succeeds
    #[derive(Default)]
    pub(crate) struct RecordingDispatcher {
        pub sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl NotificationDispatcher for RecordingDispatcher {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn notify(
            &self,
            recipient_phone: &str,
            template_id: &str,
            _params: &TemplateParams,
        ) -> Result<(), DeliveryError> {
            self.sent
                .lock()
                .unwrap()
                .push((recipient_phone.to_string(), template_id.to_string()));
            Ok(())
        }
    }

    /// Fails every delivery
    pub(crate) struct FailingDispatcher;

    #[async_trait]
    impl NotificationDispatcher for FailingDispatcher {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn notify(&self, _: &str, _: &str, _: &TemplateParams) -> Result<(), DeliveryError> {
            Err(DeliveryError::Transport("connection refused".to_string()))
        }
    }

    /// Never answers within any reasonable timeout
    pub(crate) struct StalledDispatcher;

    #[async_trait]
    impl NotificationDispatcher for StalledDispatcher {
        fn name(&self) -> &'static str {
            "stalled"
        }

        async fn notify(&self, _: &str, _: &str, _: &TemplateParams) -> Result<(), DeliveryError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(())
        }
    }
}
