//! supervisor 事件监听协议
//!
//! 监听进程通过 stdin/stdout 与 supervisor 通信：
//! 1. 写 `READY\n` 表示可以接收事件
//! 2. 读一行 header（空格分隔的 `key:value`），其中 `len` 指明 payload 字节数
//! 3. 读 `len` 字节 payload
//! 4. 写 `RESULT 2\nOK`（或 `RESULT 4\nFAIL`）确认，然后回到 1
//!
//! `TICK_*` 事件只用来触发批次刷新，不携带进程数据。

use std::collections::HashMap;
use std::io::{BufRead, Read, Write};

use tracing::trace;

use crate::error::ProtocolError;

/// header 或 payload 解析后的键值对
pub type Headers = HashMap<String, String>;

/// 事件源产出的一项
#[derive(Debug, Clone, PartialEq)]
pub enum SourceEvent {
    /// 普通事件（可能是进程状态事件，也可能是其他类型，由分类器判断）
    Event { headers: Headers, payload: String },
    /// 定时 tick，如 `TICK_60`
    Tick { name: String },
    /// supervisor 关闭了管道
    EndOfStream,
}

/// 事件确认结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ack {
    Ok,
    Fail,
}

impl Ack {
    fn frame(&self) -> &'static str {
        match self {
            Ack::Ok => "RESULT 2\nOK",
            Ack::Fail => "RESULT 4\nFAIL",
        }
    }
}

/// 事件源抽象：拉取下一个事件，处理完成后确认
pub trait EventSource {
    /// 阻塞直到下一个事件、tick 或流结束
    fn next_event(&mut self) -> Result<SourceEvent, ProtocolError>;

    /// 确认当前事件；下一个事件必须在确认之后才会到达
    fn acknowledge(&mut self, ack: Ack) -> Result<(), ProtocolError>;
}

/// 解析 `key:value key:value ...` 形式的 token 行
///
/// 只看第一行，payload 中换行后的正文（如 PROCESS_COMMUNICATION 的数据）被忽略。
/// 每个 token 以第一个 `:` 分割，不含 `:` 的 token 被跳过。
pub fn parse_tokens(text: &str) -> Headers {
    let first_line = text.lines().next().unwrap_or("");
    first_line
        .split_whitespace()
        .filter_map(|token| token.split_once(':'))
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

/// 基于 stdin/stdout 的协议实现
pub struct SupervisorProtocol<R, W> {
    reader: R,
    writer: W,
    line: String,
}

impl SupervisorProtocol<std::io::StdinLock<'static>, std::io::Stdout> {
    /// 使用进程的 stdin/stdout
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> SupervisorProtocol<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            line: String::new(),
        }
    }

    /// 拆出底层 reader/writer（测试用）
    pub fn into_parts(self) -> (R, W) {
        (self.reader, self.writer)
    }

    fn write_frame(&mut self, frame: &str) -> Result<(), ProtocolError> {
        self.writer.write_all(frame.as_bytes())?;
        self.writer.flush()?;
        Ok(())
    }
}

impl<R: BufRead, W: Write> EventSource for SupervisorProtocol<R, W> {
    fn next_event(&mut self) -> Result<SourceEvent, ProtocolError> {
        self.write_frame("READY\n")?;

        self.line.clear();
        let n = self.reader.read_line(&mut self.line)?;
        if n == 0 {
            return Ok(SourceEvent::EndOfStream);
        }

        let header_line = self.line.trim();
        let headers = parse_tokens(header_line);

        let len_value = headers
            .get("len")
            .ok_or_else(|| ProtocolError::MalformedHeader(header_line.to_string()))?;
        let len: usize = len_value
            .parse()
            .map_err(|_| ProtocolError::InvalidLength(len_value.clone()))?;
        let event_name = headers
            .get("eventname")
            .cloned()
            .ok_or_else(|| ProtocolError::MalformedHeader(header_line.to_string()))?;

        let mut body = vec![0u8; len];
        self.reader.read_exact(&mut body)?;
        let payload = String::from_utf8_lossy(&body).into_owned();

        trace!(event = %event_name, len, "Received supervisor event");

        if event_name.starts_with("TICK_") {
            return Ok(SourceEvent::Tick { name: event_name });
        }

        Ok(SourceEvent::Event { headers, payload })
    }

    fn acknowledge(&mut self, ack: Ack) -> Result<(), ProtocolError> {
        self.write_frame(ack.frame())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn frame(header: &str, payload: &str) -> String {
        format!("{} len:{}\n{}", header, payload.len(), payload)
    }

    #[test]
    fn test_parse_tokens() {
        let tokens = parse_tokens("processname:foo groupname:bar from_state:BACKOFF pid:42");
        assert_eq!(tokens.get("processname"), Some(&"foo".to_string()));
        assert_eq!(tokens.get("groupname"), Some(&"bar".to_string()));
        assert_eq!(tokens.get("from_state"), Some(&"BACKOFF".to_string()));
        assert_eq!(tokens.len(), 4);
    }

    #[test]
    fn test_parse_tokens_ignores_body_and_bare_words() {
        let tokens = parse_tokens("processname:foo junk url:http://x\nprocessname:other");
        assert_eq!(tokens.get("processname"), Some(&"foo".to_string()));
        // 只在第一个冒号处分割
        assert_eq!(tokens.get("url"), Some(&"http://x".to_string()));
        assert!(!tokens.contains_key("junk"));
    }

    #[test]
    fn test_reads_event_and_writes_ready() {
        let input = frame(
            "ver:3.0 server:supervisor serial:7 pool:notifier eventname:PROCESS_STATE_FATAL",
            "processname:foo groupname:bar from_state:BACKOFF",
        );
        let mut protocol = SupervisorProtocol::new(Cursor::new(input), Vec::new());

        match protocol.next_event().unwrap() {
            SourceEvent::Event { headers, payload } => {
                assert_eq!(headers.get("eventname"), Some(&"PROCESS_STATE_FATAL".to_string()));
                assert_eq!(payload, "processname:foo groupname:bar from_state:BACKOFF");
            }
            other => panic!("expected event, got {:?}", other),
        }
        protocol.acknowledge(Ack::Ok).unwrap();

        let (_, out) = protocol.into_parts();
        assert_eq!(String::from_utf8(out).unwrap(), "READY\nRESULT 2\nOK");
    }

    #[test]
    fn test_reads_tick() {
        let input = frame("ver:3.0 eventname:TICK_60", "when:1201063880");
        let mut protocol = SupervisorProtocol::new(Cursor::new(input), Vec::new());
        assert_eq!(
            protocol.next_event().unwrap(),
            SourceEvent::Tick { name: "TICK_60".to_string() }
        );
    }

    #[test]
    fn test_consecutive_events_use_len() {
        let mut input = frame("eventname:PROCESS_STATE_RUNNING", "processname:a groupname:a from_state:STARTING");
        input.push_str(&frame("eventname:TICK_5", "when:1"));
        let mut protocol = SupervisorProtocol::new(Cursor::new(input), Vec::new());

        assert!(matches!(protocol.next_event().unwrap(), SourceEvent::Event { .. }));
        protocol.acknowledge(Ack::Ok).unwrap();
        assert!(matches!(protocol.next_event().unwrap(), SourceEvent::Tick { .. }));
        protocol.acknowledge(Ack::Fail).unwrap();
        assert_eq!(protocol.next_event().unwrap(), SourceEvent::EndOfStream);

        let (_, out) = protocol.into_parts();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "READY\nRESULT 2\nOKREADY\nRESULT 4\nFAILREADY\n"
        );
    }

    #[test]
    fn test_missing_len_is_protocol_error() {
        let mut protocol =
            SupervisorProtocol::new(Cursor::new("eventname:TICK_5\n"), Vec::new());
        assert!(matches!(
            protocol.next_event(),
            Err(ProtocolError::MalformedHeader(_))
        ));
    }

    #[test]
    fn test_invalid_len() {
        let mut protocol =
            SupervisorProtocol::new(Cursor::new("eventname:TICK_5 len:abc\n"), Vec::new());
        assert!(matches!(
            protocol.next_event(),
            Err(ProtocolError::InvalidLength(value)) if value == "abc"
        ));
    }

    #[test]
    fn test_truncated_payload_is_io_error() {
        let mut protocol = SupervisorProtocol::new(
            Cursor::new("eventname:PROCESS_STATE_FATAL len:100\nprocessname:foo"),
            Vec::new(),
        );
        assert!(matches!(protocol.next_event(), Err(ProtocolError::Io(_))));
    }
}
