//! supervisor 侧接口：进程状态定义与事件监听协议

pub mod protocol;
pub mod state;

pub use protocol::{parse_tokens, Ack, EventSource, Headers, SourceEvent, SupervisorProtocol};
pub use state::{ProcessState, VisualMarker, EVENT_PREFIX};
