//! 过滤策略 - 决定一个已分类事件是否需要通知
//!
//! 规则按顺序匹配，第一个命中的决定结果：
//! 1. 进程在白名单（或白名单含 `all`）-> 放行
//! 2. 进程在黑名单（或黑名单含 `all`）-> 拒绝
//! 3. 事件在允许列表中 -> 放行，否则拒绝

use std::collections::HashSet;

use crate::error::ConfigError;
use crate::supervisor::ProcessState;

/// 通配名单项
pub const WILDCARD: &str = "all";

/// 过滤配置（启动时构建，之后只读）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterConfig {
    pub allowed_events: HashSet<ProcessState>,
    pub whitelist: HashSet<String>,
    pub blacklist: HashSet<String>,
}

impl Default for FilterConfig {
    /// 只通知 FATAL，无黑白名单
    fn default() -> Self {
        Self {
            allowed_events: HashSet::from([ProcessState::Fatal]),
            whitelist: HashSet::new(),
            blacklist: HashSet::new(),
        }
    }
}

impl FilterConfig {
    /// 从配置里的名字构建；事件名允许省略 `PROCESS_STATE_` 前缀
    pub fn from_names<E, W, B>(events: E, whitelist: W, blacklist: B) -> Result<Self, ConfigError>
    where
        E: IntoIterator,
        E::Item: AsRef<str>,
        W: IntoIterator,
        W::Item: Into<String>,
        B: IntoIterator,
        B::Item: Into<String>,
    {
        let allowed_events = events
            .into_iter()
            .map(|name| {
                let name = name.as_ref();
                ProcessState::from_config_name(name)
                    .ok_or_else(|| ConfigError::InvalidEventKind(name.to_string()))
            })
            .collect::<Result<HashSet<_>, _>>()?;

        Ok(Self {
            allowed_events,
            whitelist: whitelist.into_iter().map(Into::into).collect(),
            blacklist: blacklist.into_iter().map(Into::into).collect(),
        })
    }
}

/// 过滤策略
#[derive(Debug, Clone)]
pub struct FilterPolicy {
    config: FilterConfig,
    whitelist_all: bool,
    blacklist_all: bool,
}

impl FilterPolicy {
    pub fn new(config: FilterConfig) -> Self {
        let has_wildcard =
            |list: &HashSet<String>| list.iter().any(|name| name.eq_ignore_ascii_case(WILDCARD));
        Self {
            whitelist_all: has_wildcard(&config.whitelist),
            blacklist_all: has_wildcard(&config.blacklist),
            config,
        }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// 是否放行
    pub fn admit(&self, process_name: &str, state: ProcessState) -> bool {
        if self.whitelist_all || self.config.whitelist.contains(process_name) {
            return true;
        }
        if self.blacklist_all || self.config.blacklist.contains(process_name) {
            return false;
        }
        self.config.allowed_events.contains(&state)
    }
}

impl Default for FilterPolicy {
    fn default() -> Self {
        Self::new(FilterConfig::default())
    }
}
