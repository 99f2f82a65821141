//! 批次累积器 - 两次 tick 之间通过过滤的记录

use super::classifier::EventRecord;

/// 待发送批次
///
/// 按到达顺序追加，不排序不去重。默认不设上限，事件风暴下内存随事件数增长，
/// 直到下一次刷新；设置 `max_len` 后超出部分被丢弃并计数。
#[derive(Debug, Default)]
pub struct PendingBatch {
    records: Vec<EventRecord>,
    max_len: Option<usize>,
    dropped: usize,
}

impl PendingBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置批次上限
    pub fn with_max_len(max_len: Option<usize>) -> Self {
        Self {
            max_len,
            ..Self::default()
        }
    }

    /// 追加一条记录；达到上限时返回 false
    pub fn append(&mut self, record: EventRecord) -> bool {
        if self.max_len.is_some_and(|max| self.records.len() >= max) {
            self.dropped += 1;
            return false;
        }
        self.records.push(record);
        true
    }

    /// 取出全部记录并清空批次
    pub fn drain(&mut self) -> Vec<EventRecord> {
        self.dropped = 0;
        std::mem::take(&mut self.records)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 自上次 drain 以来因上限被丢弃的记录数
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}
