use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use supervisor_notifier::config::MonitorConfig;
use supervisor_notifier::notification::{
    HttpOptions, Icon, MessageIdentity, NotificationDispatcher, NotificationSink, SlackPayload,
    TokenSink, WebhookSink,
};
use supervisor_notifier::{DeliveryError, EventMonitor, SourceEvent, SupervisorProtocol};

/// 单次请求的本地 HTTP 服务，返回收到的请求原文（header 名转小写）
fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let request = read_request(&mut stream);
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );
        stream.write_all(response.as_bytes()).unwrap();
        request
    });

    (format!("http://{}", addr), handle)
}

fn read_request(stream: &mut TcpStream) -> String {
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut head = String::new();
    let mut content_length = 0usize;

    loop {
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        if line == "\r\n" || line.is_empty() {
            break;
        }
        let lower = line.to_ascii_lowercase();
        if let Some(value) = lower.strip_prefix("content-length:") {
            content_length = value.trim().parse().unwrap();
        }
        head.push_str(&lower);
    }

    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).unwrap();
    format!("{}\r\n{}", head, String::from_utf8(body).unwrap())
}

/// 一个没有进程监听的地址
fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

fn options() -> HttpOptions {
    HttpOptions {
        timeout: Duration::from_secs(5),
        proxy: None,
    }
}

fn identity() -> MessageIdentity {
    MessageIdentity {
        channel: "#ops".to_string(),
        username: "superslacker".to_string(),
        icon: Icon::default(),
    }
}

fn payload() -> SlackPayload {
    SlackPayload::new(&identity(), "[server] Process bar:foo, which was in state BACKOFF, got event PROCESS_STATE_FATAL")
}

#[test]
fn test_webhook_posts_json() {
    let (url, server) = serve_once("200 OK", "ok");
    let sink = WebhookSink::new(format!("{}/services/T/B/X", url), &options()).unwrap();

    sink.deliver(&payload()).unwrap();

    let request = server.join().unwrap();
    assert!(request.starts_with("post /services/t/b/x http/1.1"));
    assert!(request.contains("content-type: application/json"));
    assert!(request.contains(r##""channel":"#ops""##));
    assert!(request.contains(r#""icon_emoji":":sos:""#));
}

#[test]
fn test_webhook_non_success_status() {
    let (url, server) = serve_once("404 Not Found", "no_service");
    let sink = WebhookSink::new(url, &options()).unwrap();

    let result = sink.deliver(&payload());
    server.join().unwrap();

    assert!(matches!(result, Err(DeliveryError::Status(404))));
}

#[test]
fn test_token_sink_uses_bearer_auth() {
    let (url, server) = serve_once("200 OK", r#"{"ok":true,"channel":"C123","ts":"1.2"}"#);
    let sink = TokenSink::new("xoxb-test", &options())
        .unwrap()
        .with_api_base(url);

    sink.deliver(&payload()).unwrap();

    let request = server.join().unwrap();
    assert!(request.starts_with("post /chat.postmessage http/1.1"));
    assert!(request.contains("authorization: bearer xoxb-test"));
}

#[test]
fn test_token_sink_api_error() {
    let (url, server) = serve_once("200 OK", r#"{"ok":false,"error":"channel_not_found"}"#);
    let sink = TokenSink::new("xoxb-test", &options())
        .unwrap()
        .with_api_base(url);

    let result = sink.deliver(&payload());
    server.join().unwrap();

    match result {
        Err(DeliveryError::Api(error)) => assert_eq!(error, "channel_not_found"),
        other => panic!("expected API error, got {:?}", other),
    }
}

fn proxied(proxy_url: &str) -> HttpOptions {
    HttpOptions {
        proxy: Some(proxy_url.to_string()),
        ..options()
    }
}

#[test]
fn test_webhook_goes_through_proxy() {
    let (proxy_url, proxy) = serve_once("200 OK", "ok");
    // 目标主机无法解析，只有经过代理才能成功
    let sink = WebhookSink::new("http://hooks.example.invalid/services/x", &proxied(&proxy_url)).unwrap();

    sink.deliver(&payload()).unwrap();

    let request = proxy.join().unwrap();
    assert!(request.starts_with("post http://hooks.example.invalid/services/x http/1.1"));
    assert!(request.contains(r##""channel":"#ops""##));
}

#[test]
fn test_token_sink_goes_through_proxy() {
    let (proxy_url, proxy) = serve_once("200 OK", r#"{"ok":true}"#);
    let sink = TokenSink::new("xoxb-test", &proxied(&proxy_url))
        .unwrap()
        .with_api_base("http://slack.example.invalid/api");

    sink.deliver(&payload()).unwrap();

    let request = proxy.join().unwrap();
    assert!(request.starts_with("post http://slack.example.invalid/api/chat.postmessage http/1.1"));
    assert!(request.contains("authorization: bearer xoxb-test"));
}

#[test]
fn test_unreachable_sink_is_http_error() {
    let sink = WebhookSink::new(closed_port_url(), &options()).unwrap();
    assert!(matches!(sink.deliver(&payload()), Err(DeliveryError::Http(_))));
}

#[test]
fn test_flush_survives_unreachable_sink() {
    let sink = WebhookSink::new(closed_port_url(), &options()).unwrap();
    let config = MonitorConfig {
        hostname: "server".to_string(),
        ..MonitorConfig::default()
    };
    let mut monitor = EventMonitor::new(
        SupervisorProtocol::new(std::io::empty(), Vec::new()),
        NotificationDispatcher::new(sink),
        &config,
        identity(),
    );

    let mut headers = std::collections::HashMap::new();
    headers.insert("eventname".to_string(), "PROCESS_STATE_FATAL".to_string());
    monitor.handle(SourceEvent::Event {
        headers,
        payload: "processname:foo groupname:bar from_state:BACKOFF".to_string(),
    });
    assert_eq!(monitor.pending(), 1);

    monitor.handle(SourceEvent::Tick { name: "TICK_60".to_string() });
    assert_eq!(monitor.pending(), 0);

    // 下一个 tick 批次为空，不会重发
    let report = monitor.flush();
    assert_eq!(report.records, 0);
}
