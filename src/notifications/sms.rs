//! HTTP SMS gateway dispatcher.

use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

use super::templates::{render, TemplateParams};
use super::{DeliveryError, NotificationDispatcher};

/// Posts rendered messages as `{to, message, from}` JSON to an SMS gateway.
pub struct SmsGatewayDispatcher {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    username: Option<String>,
    sender_id: Option<String>,
}

impl SmsGatewayDispatcher {
    pub fn new(
        url: String,
        api_key: Option<String>,
        username: Option<String>,
        sender_id: Option<String>,
        timeout: Duration,
    ) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            url,
            api_key,
            username,
            sender_id,
        })
    }
}

#[async_trait]
impl NotificationDispatcher for SmsGatewayDispatcher {
    fn name(&self) -> &'static str {
        "sms-gateway"
    }

    async fn notify(
        &self,
        recipient_phone: &str,
        template_id: &str,
        params: &TemplateParams,
    ) -> Result<(), DeliveryError> {
        let message = render(template_id, params)?;

        let body = json!({
            "to": recipient_phone,
            "message": message,
            "from": self.sender_id,
            "username": self.username,
        });

        let mut request = self.client.post(&self.url).json(&body);
        if let Some(api_key) = &self.api_key {
            request = request.header("apiKey", api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;
        let status = response.status();

        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            tracing::warn!(
                url = %self.url,
                status = %status,
                response_body = %body_text,
                "SMS gateway rejected message"
            );
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body: body_text,
            });
        }

        tracing::debug!(
            url = %self.url,
            template = template_id,
            status = status.as_u16(),
            "SMS accepted by gateway"
        );
        Ok(())
    }
}
