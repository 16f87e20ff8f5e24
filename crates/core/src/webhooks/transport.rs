//! HTTP delivery of webhook payloads.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;

use crate::errors::{Error, Result};
use crate::webhooks::webhooks_errors::WebhookError;
use crate::webhooks::webhooks_traits::WebhookTransport;

/// Header carrying the destination's shared secret for the receiver to
/// validate.
pub const WEBHOOK_SECRET_HEADER: &str = "X-Webhook-Secret";

/// Default timeout for delivery requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// `reqwest`-backed transport. One shared client, per-request timeout; the
/// response body is never read beyond the status code.
pub struct HttpWebhookTransport {
    client: reqwest::Client,
}

impl HttpWebhookTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Unexpected(format!("Failed to initialize HTTP client: {}", e)))?;

        Ok(HttpWebhookTransport { client })
    }
}

#[async_trait]
impl WebhookTransport for HttpWebhookTransport {
    async fn deliver(&self, url: &str, secret: &str, body: &Value) -> Result<()> {
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(WEBHOOK_SECRET_HEADER, secret)
            .json(body)
            .send()
            .await
            .map_err(|e| WebhookError::Delivery(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WebhookError::Delivery(format!("{} answered {}", url, status)).into());
        }

        Ok(())
    }
}
