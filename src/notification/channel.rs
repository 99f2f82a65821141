//! 通知渠道 trait 定义

use super::payload::SlackPayload;
use crate::error::DeliveryError;

/// 发送结果
#[derive(Debug, Clone, PartialEq)]
pub enum SendResult {
    /// 发送成功
    Sent,
    /// 跳过（dry-run）
    Skipped(String),
    /// 发送失败
    Failed(String),
}

impl SendResult {
    pub fn is_failed(&self) -> bool {
        matches!(self, SendResult::Failed(_))
    }
}

impl From<Result<(), DeliveryError>> for SendResult {
    fn from(result: Result<(), DeliveryError>) -> Self {
        match result {
            Ok(()) => SendResult::Sent,
            Err(e) => SendResult::Failed(e.to_string()),
        }
    }
}

/// 通知渠道 trait
///
/// 一次调用对应一次传输请求，不重试。
pub trait NotificationSink {
    /// 渠道名称（用于日志）
    fn name(&self) -> &str;

    /// 同步投递一条消息
    fn deliver(&self, payload: &SlackPayload) -> Result<(), DeliveryError>;
}
