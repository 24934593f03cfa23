use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method};

use crate::error::{AppError, AppResult};
use crate::models::{CachePurgePayload, Webhook};

/// Delivery of outbound webhooks
#[async_trait]
pub trait WebhookSender: Send + Sync {
    async fn send(&self, webhook: &Webhook, payload: &CachePurgePayload) -> AppResult<()>;
}

/// reqwest-backed sender
#[derive(Clone)]
pub struct HttpWebhookSender {
    client: Client,
}

impl HttpWebhookSender {
    pub fn new(timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("hostplane/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }
}

/// Body of a webhook request: the configured payload, or the purge payload as JSON
pub fn request_body(webhook: &Webhook, payload: &CachePurgePayload) -> AppResult<String> {
    match webhook.request_payload.as_deref() {
        Some(body) if !body.is_empty() => Ok(body.to_string()),
        _ => serde_json::to_string(payload)
            .map_err(|e| AppError::Internal(format!("Serialization error: {}", e))),
    }
}

#[async_trait]
impl WebhookSender for HttpWebhookSender {
    async fn send(&self, webhook: &Webhook, payload: &CachePurgePayload) -> AppResult<()> {
        let method = Method::from_str(&webhook.request_method.to_ascii_uppercase()).map_err(|_| {
            AppError::Validation(format!("Invalid webhook method: {}", webhook.request_method))
        })?;

        let mut request = self.client.request(method, &webhook.request_url);

        let has_content_type = webhook
            .request_headers
            .keys()
            .any(|k| k.eq_ignore_ascii_case(CONTENT_TYPE.as_str()));
        if !has_content_type {
            request = request.header(CONTENT_TYPE, "application/json");
        }
        for (name, value) in &webhook.request_headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.body(request_body(webhook, payload)?).send().await?;

        if !response.status().is_success() {
            return Err(AppError::Webhook(format!(
                "{} responded with {}",
                webhook.request_url,
                response.status()
            )));
        }

        tracing::info!(webhook_id = webhook.id, app_id = webhook.app_id, "Webhook delivered");

        Ok(())
    }
}
