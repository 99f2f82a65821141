//! 错误类型定义
//!
//! 只有 `ConfigError` 会在启动时终止进程；其余错误都在监控循环内部被记录后丢弃。

use thiserror::Error;

/// 配置校验错误（启动阶段，致命）
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    /// 既没有 token 也没有 webhook
    #[error("one of --token or --webhook is required")]
    MissingTransport,

    /// token 和 webhook 同时设置
    #[error("--token and --webhook are mutually exclusive")]
    ConflictingTransport,

    #[error("--channel is required")]
    MissingChannel,

    /// 事件名不属于 PROCESS_STATE_* 枚举
    #[error("unknown process state event: {0}")]
    InvalidEventKind(String),

    /// supervisor 只产生 TICK_5 / TICK_60 / TICK_3600
    #[error("unsupported tick event: {0}")]
    InvalidTick(String),

    #[error("--timeout must be at least 1 second")]
    InvalidTimeout,

    #[error("invalid proxy address {address}: {reason}")]
    InvalidProxy { address: String, reason: String },

    /// 没有运行在 supervisor 之下
    #[error("must run as a supervisor event listener (SUPERVISOR_SERVER_URL not set)")]
    NotUnderSupervisor,
}

/// 事件解码错误（单个事件被丢弃，循环继续）
#[derive(Error, Debug, PartialEq)]
pub enum DecodeError {
    #[error("event header missing `{0}`")]
    MissingHeader(&'static str),

    #[error("event payload missing `{0}`")]
    MissingField(&'static str),

    #[error("not a process state event: {0}")]
    UnknownEventKind(String),

    #[error("unknown process state: {0}")]
    UnknownState(String),

    /// 批次记录 key 无法还原
    #[error("malformed record key: {0}")]
    MalformedKey(String),
}

/// supervisor 监听协议错误（管道损坏，循环终止）
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("I/O error on supervisor pipe: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed event header: {0}")]
    MalformedHeader(String),

    #[error("invalid payload length: {0}")]
    InvalidLength(String),
}

/// 通知投递错误
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("endpoint returned status {0}")]
    Status(u16),

    /// chat.postMessage 返回 ok=false
    #[error("API error: {0}")]
    Api(String),
}
