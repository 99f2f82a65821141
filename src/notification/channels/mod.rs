//! 具体渠道实现：Incoming Webhook 和 Bot Token

pub mod token;
pub mod webhook;

pub use token::{TokenSink, SLACK_API_BASE};
pub use webhook::WebhookSink;

use std::time::Duration;

use reqwest::blocking::Client;

use crate::error::DeliveryError;

/// 默认单次投递超时（秒）
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// HTTP 客户端选项，两种渠道共用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpOptions {
    /// 单次请求超时
    pub timeout: Duration,
    /// 出站代理，如 `http://proxy:3128`
    pub proxy: Option<String>,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            proxy: None,
        }
    }
}

impl HttpOptions {
    pub(crate) fn build_client(&self) -> Result<Client, DeliveryError> {
        let builder = Client::builder().timeout(self.timeout);
        // 只使用显式配置的代理，忽略 HTTP_PROXY 等环境变量
        let builder = match &self.proxy {
            Some(proxy) => builder.proxy(reqwest::Proxy::all(proxy.as_str())?),
            None => builder.no_proxy(),
        };
        Ok(builder.build()?)
    }
}
