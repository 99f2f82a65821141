//! Slack Bot Token 渠道
//!
//! 通过 `chat.postMessage` 发送，Bearer token 认证。
//! HTTP 200 也可能是失败，需要检查响应中的 `ok` 字段。

use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;

use super::HttpOptions;
use crate::error::DeliveryError;
use crate::notification::channel::NotificationSink;
use crate::notification::payload::SlackPayload;

/// Slack Web API 地址
pub const SLACK_API_BASE: &str = "https://slack.com/api";

/// chat.postMessage 响应
#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Bot Token 渠道
pub struct TokenSink {
    client: Client,
    token: String,
    api_base: String,
}

impl TokenSink {
    pub fn new(token: impl Into<String>, options: &HttpOptions) -> Result<Self, DeliveryError> {
        Ok(Self {
            client: options.build_client()?,
            token: token.into(),
            api_base: SLACK_API_BASE.to_string(),
        })
    }

    /// 替换 API 地址（测试或私有网关）
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat.postMessage", self.api_base)
    }
}

impl std::fmt::Debug for TokenSink {
    // token 不进日志
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSink")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl NotificationSink for TokenSink {
    fn name(&self) -> &str {
        "token"
    }

    fn deliver(&self, payload: &SlackPayload) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.token)
            .json(payload)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Status(status.as_u16()));
        }

        let body: PostMessageResponse = response.json()?;
        if !body.ok {
            return Err(DeliveryError::Api(
                body.error.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        debug!(channel = %payload.channel, "chat.postMessage accepted message");
        Ok(())
    }
}
