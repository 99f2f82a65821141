//! 消息格式化 - 把批次记录渲染为 Slack payload
//!
//! 两种模式：
//! - 逐条（per-record）：每条记录一条消息，颜色 / emoji 取自状态映射表
//! - 汇总（batch）：整个批次一条消息，正文逐行拼接，附件使用配置的严重程度颜色和备注

use chrono::Utc;

use super::payload::{Attachment, MessageIdentity, SlackPayload};
use crate::monitor::EventRecord;

/// 渲染模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum RenderMode {
    #[default]
    PerRecord,
    Batch,
}

/// 汇总模式默认颜色
pub const DEFAULT_SEVERITY: &str = "danger";

/// 消息格式化器（无状态）
#[derive(Debug, Clone)]
pub struct MessageFormatter {
    identity: MessageIdentity,
    mode: RenderMode,
    /// 附件文本，两种模式都会带上
    annotation: Option<String>,
    /// 汇总模式附件颜色
    severity: String,
}

impl MessageFormatter {
    pub fn new(identity: MessageIdentity) -> Self {
        Self {
            identity,
            mode: RenderMode::default(),
            annotation: None,
            severity: DEFAULT_SEVERITY.to_string(),
        }
    }

    pub fn with_mode(mut self, mode: RenderMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_annotation(mut self, annotation: Option<String>) -> Self {
        self.annotation = annotation;
        self
    }

    pub fn with_severity(mut self, severity: impl Into<String>) -> Self {
        self.severity = severity.into();
        self
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    /// 渲染批次；空批次不产生任何消息
    pub fn render(&self, records: &[EventRecord]) -> Vec<SlackPayload> {
        if records.is_empty() {
            return Vec::new();
        }
        match self.mode {
            RenderMode::PerRecord => records.iter().map(|r| self.render_record(r)).collect(),
            RenderMode::Batch => vec![self.render_batch(records)],
        }
    }

    /// 单条记录 -> 独立消息
    pub fn render_record(&self, record: &EventRecord) -> SlackPayload {
        let marker = record.state.marker();
        let line = record.summary_line();

        let mut attachment = Attachment::new(marker.color)
            .with_fallback(line.clone())
            .with_field("Host", &record.hostname, true)
            .with_field("Process", record.identity(), true)
            .with_field("From state", record.from_state.as_str(), true)
            .with_field("Event", marker.short_name, true)
            .with_timestamp(Utc::now().timestamp());
        if let Some(annotation) = &self.annotation {
            attachment = attachment.with_text(annotation);
        }

        SlackPayload::new(&self.identity, format!("{} {}", marker.emoji, line))
            .with_attachment(attachment)
    }

    /// 整个批次 -> 一条消息
    pub fn render_batch(&self, records: &[EventRecord]) -> SlackPayload {
        let body = records
            .iter()
            .map(EventRecord::summary_line)
            .collect::<Vec<_>>()
            .join("\n");

        let mut attachment = Attachment::new(&self.severity)
            .with_fallback(format!("{} process event(s)", records.len()));
        if let Some(annotation) = &self.annotation {
            attachment = attachment.with_text(annotation);
        }

        SlackPayload::new(&self.identity, body).with_attachment(attachment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::payload::Icon;
    use crate::supervisor::ProcessState;

    fn identity() -> MessageIdentity {
        MessageIdentity {
            channel: "#ops".to_string(),
            username: "superslacker".to_string(),
            icon: Icon::default(),
        }
    }

    fn record(process: &str, from: ProcessState, state: ProcessState) -> EventRecord {
        EventRecord {
            hostname: "server".to_string(),
            group_name: "bar".to_string(),
            process_name: process.to_string(),
            from_state: from,
            state,
        }
    }

    #[test]
    fn test_render_mode_from_str() {
        use clap::ValueEnum;

        assert_eq!(RenderMode::from_str("per-record", false), Ok(RenderMode::PerRecord));
        assert_eq!(RenderMode::from_str("BATCH", true), Ok(RenderMode::Batch));
        assert!(RenderMode::from_str("digest", true).is_err());
    }

    #[test]
    fn test_per_record_mode() {
        let formatter = MessageFormatter::new(identity());
        let records = vec![
            record("foo", ProcessState::Backoff, ProcessState::Fatal),
            record("baz", ProcessState::Starting, ProcessState::Running),
        ];

        let payloads = formatter.render(&records);
        assert_eq!(payloads.len(), 2);

        let fatal = &payloads[0];
        assert_eq!(fatal.channel, "#ops");
        assert_eq!(
            fatal.text,
            ":sos: [server] Process bar:foo, which was in state BACKOFF, got event PROCESS_STATE_FATAL"
        );
        assert_eq!(fatal.attachments[0].color, "danger");
        let fields: Vec<(&str, &str)> = fatal.attachments[0]
            .fields
            .iter()
            .map(|f| (f.title.as_str(), f.value.as_str()))
            .collect();
        assert_eq!(
            fields,
            vec![("Host", "server"), ("Process", "bar:foo"), ("From state", "BACKOFF"), ("Event", "fatal")]
        );

        assert_eq!(payloads[1].attachments[0].color, "good");
        assert!(payloads[1].text.starts_with(":white_check_mark: "));
    }

    #[test]
    fn test_per_record_mode_carries_annotation() {
        let formatter = MessageFormatter::new(identity()).with_annotation(Some("see runbook".to_string()));
        let records = vec![
            record("foo", ProcessState::Backoff, ProcessState::Fatal),
            record("baz", ProcessState::Running, ProcessState::Exited),
        ];

        let payloads = formatter.render(&records);
        assert_eq!(payloads.len(), 2);
        for payload in &payloads {
            assert_eq!(payload.attachments[0].text.as_deref(), Some("see runbook"));
            let json = serde_json::to_string(payload).unwrap();
            assert!(json.contains(r#""text":"see runbook""#));
        }

        // 未配置时不输出 text 字段
        let plain = MessageFormatter::new(identity()).render(&records[..1]);
        assert_eq!(plain[0].attachments[0].text, None);
    }

    #[test]
    fn test_batch_mode() {
        let formatter = MessageFormatter::new(identity())
            .with_mode(RenderMode::Batch)
            .with_annotation(Some("check the on-call runbook".to_string()))
            .with_severity("warning");
        let records = vec![
            record("e1", ProcessState::Running, ProcessState::Exited),
            record("e2", ProcessState::Backoff, ProcessState::Fatal),
        ];

        let payloads = formatter.render(&records);
        assert_eq!(payloads.len(), 1);

        let lines: Vec<&str> = payloads[0].text.lines().collect();
        assert_eq!(lines, vec![records[0].summary_line(), records[1].summary_line()]);

        let attachment = &payloads[0].attachments[0];
        assert_eq!(attachment.color, "warning");
        assert_eq!(attachment.text.as_deref(), Some("check the on-call runbook"));
    }

    #[test]
    fn test_empty_batch_renders_nothing() {
        let formatter = MessageFormatter::new(identity()).with_mode(RenderMode::Batch);
        assert!(formatter.render(&[]).is_empty());
        assert!(MessageFormatter::new(identity()).render(&[]).is_empty());
    }
}
