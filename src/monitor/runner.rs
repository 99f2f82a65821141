//! 监控循环 - 事件源 → 分类 → 过滤 → 批次 →（tick）格式化 → 分发
//!
//! 单线程轮转：每轮只处理一个事件或一个 tick，处理完成后确认，
//! 批次只在这个线程上被修改，append 和 drain 不会交错。

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::batch::PendingBatch;
use super::classifier::classify;
use super::filter::FilterPolicy;
use crate::config::MonitorConfig;
use crate::error::{DecodeError, ProtocolError};
use crate::notification::channel::{NotificationSink, SendResult};
use crate::notification::dispatcher::{NotificationDispatcher, Sink};
use crate::notification::formatter::MessageFormatter;
use crate::notification::payload::MessageIdentity;
use crate::supervisor::{Ack, EventSource, Headers, SourceEvent};

/// 单轮处理后循环是否继续
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// 一次刷新的统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// 本次取出的记录数
    pub records: usize,
    pub sent: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// 事件监控器
pub struct EventMonitor<S, K = Sink> {
    source: S,
    policy: FilterPolicy,
    formatter: MessageFormatter,
    dispatcher: NotificationDispatcher<K>,
    batch: PendingBatch,
    hostname: String,
    tick_name: String,
    flush_interval: Duration,
    last_flush: Instant,
    /// 对外可见的待发送记录数（信号处理时打印）
    pending: Arc<AtomicUsize>,
}

impl<S: EventSource, K: NotificationSink> EventMonitor<S, K> {
    pub fn new(
        source: S,
        dispatcher: NotificationDispatcher<K>,
        config: &MonitorConfig,
        identity: MessageIdentity,
    ) -> Self {
        let formatter = MessageFormatter::new(identity)
            .with_mode(config.mode)
            .with_annotation(config.annotation.clone())
            .with_severity(config.severity.as_str());

        Self {
            source,
            policy: FilterPolicy::new(config.filter.clone()),
            formatter,
            dispatcher,
            batch: PendingBatch::with_max_len(config.max_batch),
            hostname: config.hostname.clone(),
            tick_name: config.tick_name.clone(),
            flush_interval: config.flush_interval,
            last_flush: Instant::now(),
            pending: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// 使用外部提供的待发送计数
    pub fn with_pending_counter(mut self, pending: Arc<AtomicUsize>) -> Self {
        pending.store(self.batch.len(), Ordering::Relaxed);
        self.pending = pending;
        self
    }

    /// 主循环，直到 supervisor 关闭管道
    ///
    /// 只有协议错误（无法读事件或无法确认）会返回 Err。
    pub fn run(&mut self) -> Result<(), ProtocolError> {
        info!(
            host = %self.hostname,
            tick = %self.tick_name,
            mode = ?self.formatter.mode(),
            sink = self.dispatcher.sink().name(),
            "Event monitor started"
        );

        loop {
            let event = self.source.next_event()?;
            if self.handle(event) == Flow::Stop {
                info!(dropped = self.batch.len(), "Event stream closed, stopping monitor");
                return Ok(());
            }
            self.source.acknowledge(Ack::Ok)?;
        }
    }

    /// 处理一个事件源输出（不含确认）
    pub fn handle(&mut self, event: SourceEvent) -> Flow {
        match event {
            SourceEvent::Event { headers, payload } => self.on_event(&headers, &payload),
            SourceEvent::Tick { name } => self.on_tick(&name),
            SourceEvent::EndOfStream => return Flow::Stop,
        }
        self.pending.store(self.batch.len(), Ordering::Relaxed);
        Flow::Continue
    }

    fn on_event(&mut self, headers: &Headers, payload: &str) {
        let record = match classify(headers, payload, &self.hostname) {
            Ok(record) => record,
            Err(DecodeError::UnknownEventKind(kind)) => {
                debug!(event = %kind, "Ignoring non process-state event");
                return;
            }
            Err(e) => {
                warn!(error = %e, payload = %payload, "Dropping undecodable event");
                return;
            }
        };

        if !self.policy.admit(&record.process_name, record.state) {
            debug!(process = %record.identity(), event = %record.event_kind(), "Event filtered out");
            return;
        }

        debug!(record = %record, "Queued event");
        if !self.batch.append(record) {
            warn!(dropped = self.batch.dropped(), "Batch is full, dropping event");
        }
    }

    fn on_tick(&mut self, name: &str) {
        if name != self.tick_name {
            return;
        }
        if self.last_flush.elapsed() < self.flush_interval {
            return;
        }
        self.flush();
    }

    /// 取出批次、渲染并发送；无论结果如何批次都会被清空
    pub fn flush(&mut self) -> FlushReport {
        self.last_flush = Instant::now();

        let dropped = self.batch.dropped();
        let records = self.batch.drain();
        if dropped > 0 {
            warn!(dropped, "Events dropped since last flush because the batch was full");
        }

        let mut report = FlushReport {
            records: records.len(),
            ..FlushReport::default()
        };
        if records.is_empty() {
            return report;
        }

        let payloads = self.formatter.render(&records);
        for result in self.dispatcher.dispatch(&payloads) {
            match result {
                SendResult::Sent => report.sent += 1,
                SendResult::Failed(_) => report.failed += 1,
                SendResult::Skipped(_) => report.skipped += 1,
            }
        }

        if report.failed > 0 {
            warn!(
                records = report.records,
                failed = report.failed,
                "Batch flushed with delivery failures, failed messages discarded"
            );
        } else {
            info!(records = report.records, messages = payloads.len(), "Batch flushed");
        }
        report
    }

    /// 当前批次中的记录数
    pub fn pending(&self) -> usize {
        self.batch.len()
    }

    /// 与其他线程共享的待发送计数
    pub fn pending_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.pending)
    }

    pub fn dispatcher(&self) -> &NotificationDispatcher<K> {
        &self.dispatcher
    }

    pub fn into_source(self) -> S {
        self.source
    }
}
