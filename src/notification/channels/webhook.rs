//! Slack Incoming Webhook 渠道
//!
//! 直接 POST JSON 到 webhook URL，2xx 即成功，不解析响应体。

use reqwest::blocking::Client;
use tracing::debug;

use super::HttpOptions;
use crate::error::DeliveryError;
use crate::notification::channel::NotificationSink;
use crate::notification::payload::SlackPayload;

/// Incoming Webhook 渠道
#[derive(Debug)]
pub struct WebhookSink {
    client: Client,
    url: String,
}

impl WebhookSink {
    pub fn new(url: impl Into<String>, options: &HttpOptions) -> Result<Self, DeliveryError> {
        Ok(Self {
            client: options.build_client()?,
            url: url.into(),
        })
    }
}

impl NotificationSink for WebhookSink {
    fn name(&self) -> &str {
        "webhook"
    }

    fn deliver(&self, payload: &SlackPayload) -> Result<(), DeliveryError> {
        let response = self.client.post(&self.url).json(payload).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Status(status.as_u16()));
        }

        debug!(channel = %payload.channel, "Webhook accepted message");
        Ok(())
    }
}
