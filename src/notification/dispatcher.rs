//! 通知分发器 - 把渲染好的消息交给唯一配置的渠道

use tracing::{info, warn};

use super::channel::{NotificationSink, SendResult};
use super::channels::{TokenSink, WebhookSink};
use super::payload::SlackPayload;
use crate::config::{SinkConfig, Transport};
use crate::error::DeliveryError;

/// 已配置的渠道：webhook 或 token，二者取一
#[derive(Debug)]
pub enum Sink {
    Webhook(WebhookSink),
    Token(TokenSink),
}

impl Sink {
    /// 按配置构建渠道
    pub fn from_config(config: &SinkConfig) -> Result<Self, DeliveryError> {
        let sink = match &config.transport {
            Transport::Webhook { url } => Sink::Webhook(WebhookSink::new(url.as_str(), &config.http)?),
            Transport::Token { token } => Sink::Token(TokenSink::new(token.as_str(), &config.http)?),
        };
        Ok(sink)
    }
}

impl NotificationSink for Sink {
    fn name(&self) -> &str {
        match self {
            Sink::Webhook(sink) => sink.name(),
            Sink::Token(sink) => sink.name(),
        }
    }

    fn deliver(&self, payload: &SlackPayload) -> Result<(), DeliveryError> {
        match self {
            Sink::Webhook(sink) => sink.deliver(payload),
            Sink::Token(sink) => sink.deliver(payload),
        }
    }
}

/// 通知分发器
///
/// 不重试；某条消息失败不影响同一批次后续消息的发送。
pub struct NotificationDispatcher<K = Sink> {
    sink: K,
    /// 是否为 dry-run 模式
    dry_run: bool,
}

impl<K: NotificationSink> NotificationDispatcher<K> {
    pub fn new(sink: K) -> Self {
        info!(sink = sink.name(), "Registering notification sink");
        Self { sink, dry_run: false }
    }

    /// 设置 dry-run 模式
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// 发送单条消息，错误只记录不上抛
    pub fn send(&self, payload: &SlackPayload) -> SendResult {
        if self.dry_run {
            info!(
                sink = self.sink.name(),
                payload = %serde_json::to_string(payload).unwrap_or_default(),
                "[DRY-RUN] Would send message"
            );
            return SendResult::Skipped("dry-run".to_string());
        }

        let result = SendResult::from(self.sink.deliver(payload));
        if let SendResult::Failed(error) = &result {
            warn!(sink = self.sink.name(), channel = %payload.channel, error = %error, "Notification delivery failed");
        }
        result
    }

    /// 按顺序逐条发送
    pub fn dispatch(&self, payloads: &[SlackPayload]) -> Vec<SendResult> {
        payloads.iter().map(|payload| self.send(payload)).collect()
    }
}
