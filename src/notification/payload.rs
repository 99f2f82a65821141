//! Slack 消息 payload
//!
//! webhook 和 chat.postMessage 使用同一个 JSON 结构：
//! ```json
//! {
//!   "channel": "#ops",
//!   "username": "superslacker",
//!   "icon_emoji": ":sos:",
//!   "text": "[web-1] Process app:api, which was in state BACKOFF, got event PROCESS_STATE_FATAL",
//!   "link_names": 1,
//!   "attachments": [{ "color": "danger", "fields": [...] }]
//! }
//! ```

use serde::Serialize;

/// 机器人头像：emoji（`:sos:`）或图片 URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Icon {
    Emoji(String),
    Url(String),
}

impl Icon {
    /// 用冒号包围的视为 emoji，其余视为 URL
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.len() > 1 && value.starts_with(':') && value.ends_with(':') {
            Icon::Emoji(value.to_string())
        } else {
            Icon::Url(value.to_string())
        }
    }
}

impl Default for Icon {
    fn default() -> Self {
        Icon::Emoji(":sos:".to_string())
    }
}

/// 消息身份：发往哪个频道、以什么名字和头像
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageIdentity {
    pub channel: String,
    pub username: String,
    pub icon: Icon,
}

/// Slack 消息
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlackPayload {
    pub channel: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_emoji: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    pub text: String,
    /// 让 @channel / @user 生效
    pub link_names: u8,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl SlackPayload {
    pub fn new(identity: &MessageIdentity, text: impl Into<String>) -> Self {
        let (icon_emoji, icon_url) = match &identity.icon {
            Icon::Emoji(emoji) => (Some(emoji.clone()), None),
            Icon::Url(url) => (None, Some(url.clone())),
        };
        Self {
            channel: identity.channel.clone(),
            username: identity.username.clone(),
            icon_emoji,
            icon_url,
            text: text.into(),
            link_names: 1,
            attachments: Vec::new(),
        }
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }
}

/// 消息附件（带颜色条）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attachment {
    /// 不支持附件的客户端显示的纯文本
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<AttachmentField>,
    /// Unix 时间戳
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ts: Option<i64>,
}

impl Attachment {
    pub fn new(color: impl Into<String>) -> Self {
        Self {
            fallback: None,
            color: color.into(),
            text: None,
            fields: Vec::new(),
            ts: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = Some(fallback.into());
        self
    }

    pub fn with_field(mut self, title: impl Into<String>, value: impl Into<String>, short: bool) -> Self {
        self.fields.push(AttachmentField {
            title: title.into(),
            value: value.into(),
            short,
        });
        self
    }

    pub fn with_timestamp(mut self, ts: i64) -> Self {
        self.ts = Some(ts);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttachmentField {
    pub title: String,
    pub value: String,
    pub short: bool,
}
