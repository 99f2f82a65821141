//! 进程状态枚举与展示映射表
//!
//! supervisor 的进程状态是固定的 8 个值，事件名统一为 `PROCESS_STATE_<STATE>`。

use std::fmt;
use std::str::FromStr;

use crate::error::DecodeError;

/// 事件名前缀
pub const EVENT_PREFIX: &str = "PROCESS_STATE_";

/// supervisor 进程状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessState {
    Starting,
    Running,
    Backoff,
    Stopping,
    Fatal,
    Exited,
    Stopped,
    Unknown,
}

/// 每个状态对应的颜色 / emoji / 短名
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisualMarker {
    /// Slack attachment 颜色
    pub color: &'static str,
    pub emoji: &'static str,
    pub short_name: &'static str,
}

impl ProcessState {
    pub const ALL: [ProcessState; 8] = [
        ProcessState::Starting,
        ProcessState::Running,
        ProcessState::Backoff,
        ProcessState::Stopping,
        ProcessState::Fatal,
        ProcessState::Exited,
        ProcessState::Stopped,
        ProcessState::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessState::Starting => "STARTING",
            ProcessState::Running => "RUNNING",
            ProcessState::Backoff => "BACKOFF",
            ProcessState::Stopping => "STOPPING",
            ProcessState::Fatal => "FATAL",
            ProcessState::Exited => "EXITED",
            ProcessState::Stopped => "STOPPED",
            ProcessState::Unknown => "UNKNOWN",
        }
    }

    /// 完整事件名，如 `PROCESS_STATE_FATAL`
    pub fn event_kind(&self) -> String {
        format!("{}{}", EVENT_PREFIX, self.as_str())
    }

    /// 从事件名解析（必须带 `PROCESS_STATE_` 前缀，大小写敏感）
    pub fn from_event_kind(event_kind: &str) -> Result<Self, DecodeError> {
        event_kind
            .strip_prefix(EVENT_PREFIX)
            .and_then(|state| state.parse().ok())
            .ok_or_else(|| DecodeError::UnknownEventKind(event_kind.to_string()))
    }

    /// 宽松解析配置里的事件名：允许省略前缀，忽略大小写
    pub fn from_config_name(name: &str) -> Option<Self> {
        let upper = name.trim().to_uppercase();
        let state = upper.strip_prefix(EVENT_PREFIX).unwrap_or(&upper);
        state.parse().ok()
    }

    /// 固定映射表，覆盖全部 8 个状态
    pub fn marker(&self) -> VisualMarker {
        let (color, emoji, short_name) = match self {
            ProcessState::Starting => ("warning", ":arrows_counterclockwise:", "starting"),
            ProcessState::Running => ("good", ":white_check_mark:", "running"),
            ProcessState::Backoff => ("warning", ":warning:", "backoff"),
            ProcessState::Stopping => ("warning", ":double_vertical_bar:", "stopping"),
            ProcessState::Fatal => ("danger", ":sos:", "fatal"),
            ProcessState::Exited => ("danger", ":x:", "exited"),
            ProcessState::Stopped => ("danger", ":black_square_for_stop:", "stopped"),
            ProcessState::Unknown => ("danger", ":grey_question:", "unknown"),
        };
        VisualMarker { color, emoji, short_name }
    }
}

impl FromStr for ProcessState {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProcessState::ALL
            .iter()
            .copied()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| DecodeError::UnknownState(s.to_string()))
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
