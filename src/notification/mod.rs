//! 通知层 - 把批次渲染为 Slack 消息并投递
//!
//! # 结构
//! 1. `MessageFormatter` 把记录渲染为 `SlackPayload`（逐条或汇总）
//! 2. `NotificationDispatcher` 把 payload 交给唯一配置的渠道
//! 3. 渠道实现 `NotificationSink`：`WebhookSink` 或 `TokenSink`
//!
//! # 使用示例
//! ```ignore
//! use supervisor_notifier::notification::{MessageFormatter, NotificationDispatcher, Sink};
//!
//! let sink = Sink::from_config(&config.sink)?;
//! let dispatcher = NotificationDispatcher::new(sink);
//! let payloads = MessageFormatter::new(config.sink.identity.clone()).render(&records);
//! dispatcher.dispatch(&payloads);
//! ```

pub mod channel;
pub mod channels;
pub mod dispatcher;
pub mod formatter;
pub mod payload;

pub use channel::{NotificationSink, SendResult};
pub use channels::{HttpOptions, TokenSink, WebhookSink};
pub use dispatcher::{NotificationDispatcher, Sink};
pub use formatter::{MessageFormatter, RenderMode};
pub use payload::{Attachment, AttachmentField, Icon, MessageIdentity, SlackPayload};
