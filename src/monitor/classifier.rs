//! 事件分类器 - 把原始 supervisor 事件转换为批次记录
//!
//! 记录的扁平 key 格式：`hostname;groupname:processname;from_state;eventname`

use std::fmt;

use crate::error::DecodeError;
use crate::supervisor::{parse_tokens, Headers, ProcessState};

/// key 各段之间的分隔符
pub const KEY_DELIMITER: char = ';';

/// 一次进程状态变化
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub hostname: String,
    pub group_name: String,
    pub process_name: String,
    /// 变化前的状态
    pub from_state: ProcessState,
    /// 变化后的状态（即事件名 `PROCESS_STATE_<STATE>` 中的 STATE）
    pub state: ProcessState,
}

impl EventRecord {
    /// 事件名，如 `PROCESS_STATE_FATAL`
    pub fn event_kind(&self) -> String {
        self.state.event_kind()
    }

    /// `group:process`
    pub fn identity(&self) -> String {
        format!("{}:{}", self.group_name, self.process_name)
    }

    pub fn key(&self) -> String {
        format!(
            "{host}{d}{identity}{d}{from}{d}{kind}",
            host = self.hostname,
            identity = self.identity(),
            from = self.from_state,
            kind = self.event_kind(),
            d = KEY_DELIMITER,
        )
    }

    /// 从 key 还原记录，`key()` 的逆操作
    pub fn parse_key(key: &str) -> Result<Self, DecodeError> {
        let malformed = || DecodeError::MalformedKey(key.to_string());

        let parts: Vec<&str> = key.split(KEY_DELIMITER).collect();
        let [hostname, identity, from_state, event_kind] = parts.as_slice() else {
            return Err(malformed());
        };
        let (group_name, process_name) = identity.split_once(':').ok_or_else(malformed)?;

        Ok(Self {
            hostname: hostname.to_string(),
            group_name: group_name.to_string(),
            process_name: process_name.to_string(),
            from_state: from_state.parse()?,
            state: ProcessState::from_event_kind(event_kind)?,
        })
    }

    /// 人类可读的一行描述
    pub fn summary_line(&self) -> String {
        format!(
            "[{}] Process {}, which was in state {}, got event {}",
            self.hostname,
            self.identity(),
            self.from_state,
            self.event_kind()
        )
    }
}

impl fmt::Display for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// 对原始事件分类
///
/// headers 必须含 `eventname`，payload 必须含 `processname`、`groupname`、`from_state`。
/// 非 `PROCESS_STATE_*` 事件和未知状态都以 `DecodeError` 拒绝。
pub fn classify(headers: &Headers, payload: &str, hostname: &str) -> Result<EventRecord, DecodeError> {
    let event_name = headers
        .get("eventname")
        .ok_or(DecodeError::MissingHeader("eventname"))?;
    let state = ProcessState::from_event_kind(event_name)?;

    let fields = parse_tokens(payload);
    let field = |name: &'static str| {
        fields
            .get(name)
            .cloned()
            .ok_or(DecodeError::MissingField(name))
    };

    let process_name = field("processname")?;
    let group_name = field("groupname")?;
    let from_state = field("from_state")?.parse()?;

    Ok(EventRecord {
        hostname: hostname.to_string(),
        group_name,
        process_name,
        from_state,
        state,
    })
}
