//! 事件处理核心：分类、过滤、批次累积和监控循环

pub mod batch;
pub mod classifier;
pub mod filter;
pub mod runner;

pub use batch::PendingBatch;
pub use classifier::{classify, EventRecord, KEY_DELIMITER};
pub use filter::{FilterConfig, FilterPolicy, WILDCARD};
pub use runner::{EventMonitor, FlushReport, Flow};
