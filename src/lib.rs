//! Supervisor Notifier - 把 supervisor 进程状态变化转发到 Slack
//!
//! 作为 supervisord eventlistener 运行，从 stdin 接收 `PROCESS_STATE_*` 事件，
//! 按过滤规则累积到批次，在 `TICK_*` 事件到达时渲染并发送。

pub mod cli;
pub mod config;
pub mod error;
pub mod monitor;
pub mod notification;
pub mod supervisor;

pub use config::{AppConfig, MonitorConfig, SinkConfig, Transport};
pub use error::{ConfigError, DecodeError, DeliveryError, ProtocolError};
pub use monitor::{classify, EventMonitor, EventRecord, FilterConfig, FilterPolicy, FlushReport, PendingBatch};
pub use notification::{MessageFormatter, NotificationDispatcher, NotificationSink, RenderMode, SendResult, Sink, SlackPayload};
pub use supervisor::{Ack, EventSource, ProcessState, SourceEvent, SupervisorProtocol};
