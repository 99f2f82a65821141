//! 运行配置
//!
//! 命令行参数经 `cli::ListenArgs::validate` 校验后得到 `AppConfig`，之后只读。

use std::time::Duration;

use crate::error::ConfigError;
use crate::monitor::FilterConfig;
use crate::notification::channels::HttpOptions;
use crate::notification::formatter::{RenderMode, DEFAULT_SEVERITY};
use crate::notification::payload::MessageIdentity;

/// supervisor 支持的 tick 事件
pub const SUPPORTED_TICKS: [&str; 3] = ["TICK_5", "TICK_60", "TICK_3600"];

pub const DEFAULT_TICK: &str = "TICK_60";
pub const DEFAULT_USERNAME: &str = "superslacker";
pub const DEFAULT_ICON: &str = ":sos:";

/// 投递方式，启动时二选一，运行期不变
#[derive(Clone, PartialEq, Eq)]
pub enum Transport {
    /// Incoming Webhook URL
    Webhook { url: String },
    /// Bot token，走 chat.postMessage
    Token { token: String },
}

impl Transport {
    /// token 与 webhook 必须恰好设置一个；空字符串视为未设置
    pub fn select(token: Option<String>, webhook: Option<String>) -> Result<Self, ConfigError> {
        let token = token.filter(|t| !t.trim().is_empty());
        let webhook = webhook.filter(|w| !w.trim().is_empty());

        match (token, webhook) {
            (Some(token), None) => Ok(Transport::Token { token }),
            (None, Some(url)) => Ok(Transport::Webhook { url }),
            (Some(_), Some(_)) => Err(ConfigError::ConflictingTransport),
            (None, None) => Err(ConfigError::MissingTransport),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Transport::Webhook { .. } => "webhook",
            Transport::Token { .. } => "token",
        }
    }
}

impl std::fmt::Debug for Transport {
    // 凭据不进日志
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Transport::{}", self.name())
    }
}

/// 通知渠道配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkConfig {
    pub transport: Transport,
    pub identity: MessageIdentity,
    pub http: HttpOptions,
}

/// 监控循环配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// 消息中显示的主机名
    pub hostname: String,
    /// 触发刷新的 tick 事件名
    pub tick_name: String,
    /// 两次刷新之间的最短间隔，0 表示每个 tick 都刷新
    pub flush_interval: Duration,
    /// 批次上限，None 表示不限
    pub max_batch: Option<usize>,
    pub filter: FilterConfig,
    pub mode: RenderMode,
    /// 汇总模式附件文本
    pub annotation: Option<String>,
    /// 汇总模式附件颜色
    pub severity: String,
    /// 只打印不发送
    pub dry_run: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            hostname: "localhost".to_string(),
            tick_name: DEFAULT_TICK.to_string(),
            flush_interval: Duration::ZERO,
            max_batch: None,
            filter: FilterConfig::default(),
            mode: RenderMode::default(),
            annotation: None,
            severity: DEFAULT_SEVERITY.to_string(),
            dry_run: false,
        }
    }
}

/// 完整配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub sink: SinkConfig,
    pub monitor: MonitorConfig,
}

/// 规范化 tick 名：允许 `60`、`tick_60` 等写法
pub fn normalize_tick(name: &str) -> Result<String, ConfigError> {
    let upper = name.trim().to_uppercase();
    let tick = if upper.starts_with("TICK_") {
        upper
    } else {
        format!("TICK_{}", upper)
    };

    if SUPPORTED_TICKS.contains(&tick.as_str()) {
        Ok(tick)
    } else {
        Err(ConfigError::InvalidTick(name.to_string()))
    }
}

/// 拆分逗号分隔列表，去空白、去空项
pub fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// 校验代理地址
pub fn validate_proxy(address: Option<String>) -> Result<Option<String>, ConfigError> {
    let Some(address) = address.filter(|a| !a.trim().is_empty()) else {
        return Ok(None);
    };
    reqwest::Proxy::all(address.as_str()).map_err(|e| ConfigError::InvalidProxy {
        address: address.clone(),
        reason: e.to_string(),
    })?;
    Ok(Some(address))
}

/// 本机主机名，获取失败时回退为 `localhost`
pub fn local_hostname() -> String {
    sysinfo::System::host_name()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}
