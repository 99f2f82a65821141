// src/cli/listen.rs
//! 监听命令 - 作为 supervisor eventlistener 运行
//!
//! supervisord 配置示例：
//! ```ini
//! [eventlistener:supernotify]
//! command=supernotify --webhook https://hooks.slack.com/services/... --channel #ops --events FATAL,EXITED
//! events=PROCESS_STATE,TICK_60
//! ```

use std::ffi::OsString;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use crate::config::{
    local_hostname, normalize_tick, split_list, validate_proxy, AppConfig, MonitorConfig,
    SinkConfig, Transport, DEFAULT_ICON, DEFAULT_TICK, DEFAULT_USERNAME,
};
use crate::error::ConfigError;
use crate::monitor::{EventMonitor, FilterConfig};
use crate::notification::channels::{HttpOptions, DEFAULT_TIMEOUT_SECS};
use crate::notification::formatter::{RenderMode, DEFAULT_SEVERITY};
use crate::notification::payload::{Icon, MessageIdentity};
use crate::notification::{NotificationDispatcher, Sink};
use crate::supervisor::SupervisorProtocol;

/// supervisor 为子进程设置的环境变量
pub const SUPERVISOR_ENV: &str = "SUPERVISOR_SERVER_URL";

/// 监听命令参数
#[derive(Args, Debug, Clone, Default)]
pub struct ListenArgs {
    /// Slack Bot token（与 --webhook 二选一）
    #[arg(long, short, env = "SUPERNOTIFY_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Slack Incoming Webhook URL（与 --token 二选一）
    #[arg(long, short, env = "SUPERNOTIFY_WEBHOOK", hide_env_values = true)]
    pub webhook: Option<String>,

    /// Slack 频道
    #[arg(long, short, env = "SUPERNOTIFY_CHANNEL")]
    pub channel: Option<String>,

    /// 消息中显示的主机名（默认本机）
    #[arg(long, short = 'n', env = "SUPERNOTIFY_HOSTNAME")]
    pub hostname: Option<String>,

    /// 机器人头像：emoji（如 :sos:）或图片 URL
    #[arg(long, short, env = "SUPERNOTIFY_ICON", default_value = DEFAULT_ICON)]
    pub icon: String,

    /// 机器人显示名
    #[arg(long, short, env = "SUPERNOTIFY_USERNAME", default_value = DEFAULT_USERNAME)]
    pub username: String,

    /// 附件文本，每条消息都会附带
    #[arg(long, short, env = "SUPERNOTIFY_ATTACHMENT")]
    pub attachment: Option<String>,

    /// 汇总模式附件颜色（good / warning / danger / #RRGGBB）
    #[arg(long, env = "SUPERNOTIFY_SEVERITY", default_value = DEFAULT_SEVERITY)]
    pub severity: String,

    /// 渲染模式
    #[arg(long, value_enum, env = "SUPERNOTIFY_MODE", default_value_t = RenderMode::PerRecord)]
    pub mode: RenderMode,

    /// 需要通知的事件，逗号分隔（可省略 PROCESS_STATE_ 前缀）
    #[arg(long, short, env = "SUPERNOTIFY_EVENTS", default_value = "PROCESS_STATE_FATAL")]
    pub events: String,

    /// 总是通知的进程，逗号分隔；`all` 表示全部
    #[arg(long, env = "SUPERNOTIFY_WHITELIST")]
    pub whitelist: Option<String>,

    /// 从不通知的进程，逗号分隔；`all` 表示全部
    #[arg(long, env = "SUPERNOTIFY_BLACKLIST")]
    pub blacklist: Option<String>,

    /// 出站 HTTP 代理
    #[arg(long, short, env = "SUPERNOTIFY_PROXY")]
    pub proxy: Option<String>,

    /// 触发刷新的 tick 事件（TICK_5 / TICK_60 / TICK_3600）
    #[arg(long, env = "SUPERNOTIFY_TICK", default_value = DEFAULT_TICK)]
    pub tick: String,

    /// 两次刷新之间的最短间隔（秒），0 表示每个 tick 都刷新
    #[arg(long, env = "SUPERNOTIFY_FLUSH_INTERVAL", default_value = "0")]
    pub flush_interval: u64,

    /// 单次投递超时（秒），不能为 0
    #[arg(long, env = "SUPERNOTIFY_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// 单个批次最多保留的事件数
    #[arg(long, env = "SUPERNOTIFY_MAX_BATCH")]
    pub max_batch: Option<usize>,

    /// 只打印不发送
    #[arg(long)]
    pub dry_run: bool,
}

impl ListenArgs {
    /// 校验参数并生成只读配置
    pub fn validate(self) -> Result<AppConfig, ConfigError> {
        let transport = Transport::select(self.token, self.webhook)?;

        let channel = self
            .channel
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or(ConfigError::MissingChannel)?;

        let filter = FilterConfig::from_names(
            split_list(Some(self.events.as_str())),
            split_list(self.whitelist.as_deref()),
            split_list(self.blacklist.as_deref()),
        )?;

        let hostname = self
            .hostname
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(local_hostname);

        if self.timeout == 0 {
            return Err(ConfigError::InvalidTimeout);
        }

        let sink = SinkConfig {
            transport,
            identity: MessageIdentity {
                channel,
                username: self.username,
                icon: Icon::parse(&self.icon),
            },
            http: HttpOptions {
                timeout: Duration::from_secs(self.timeout),
                proxy: validate_proxy(self.proxy)?,
            },
        };

        let monitor = MonitorConfig {
            hostname,
            tick_name: normalize_tick(&self.tick)?,
            flush_interval: Duration::from_secs(self.flush_interval),
            max_batch: self.max_batch,
            filter,
            mode: self.mode,
            annotation: self.attachment.filter(|a| !a.is_empty()),
            severity: self.severity,
            dry_run: self.dry_run,
        };

        Ok(AppConfig { sink, monitor })
    }
}

/// 必须以 supervisor eventlistener 身份运行
pub fn ensure_supervisor_env() -> Result<(), ConfigError> {
    check_supervisor_env(std::env::var_os(SUPERVISOR_ENV))
}

fn check_supervisor_env(value: Option<OsString>) -> Result<(), ConfigError> {
    match value {
        Some(_) => Ok(()),
        None => Err(ConfigError::NotUnderSupervisor),
    }
}

/// 在 stdin/stdout 上运行监控循环，直到 supervisor 关闭管道
///
/// 内部使用 blocking HTTP 客户端，不能在异步上下文中直接调用。
pub fn run_listener(config: AppConfig, pending: Arc<AtomicUsize>) -> Result<()> {
    let sink = Sink::from_config(&config.sink).context("Failed to create notification sink")?;
    let dispatcher = NotificationDispatcher::new(sink).with_dry_run(config.monitor.dry_run);

    let mut monitor = EventMonitor::new(
        SupervisorProtocol::stdio(),
        dispatcher,
        &config.monitor,
        config.sink.identity.clone(),
    )
    .with_pending_counter(pending);

    monitor.run().context("Supervisor event stream failed")?;
    Ok(())
}
