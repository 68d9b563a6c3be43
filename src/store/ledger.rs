use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// 不良台账条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefectEntry {
    pub code: String,
    pub count: u32,
}

/// 不良台账：商品码 -> 不良件数。
///
/// 跨发票存在；计数归零即删除键，遍历顺序为首次登记顺序。
#[derive(Debug, Clone, Default)]
pub struct DefectLedger {
    counts: IndexMap<String, u32>,
}

impl DefectLedger {
    /// +1，不存在则新建，返回新计数
    pub fn add(&mut self, code: &str) -> u32 {
        let count = self.counts.entry(code.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    /// -1，归零删除；无条目时不做任何事，返回是否发生变化
    pub fn decrement(&mut self, code: &str) -> bool {
        let Some(count) = self.counts.get_mut(code) else {
            return false;
        };
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.counts.shift_remove(code);
        }
        true
    }

    /// 无条件删除，返回是否发生变化
    pub fn remove(&mut self, code: &str) -> bool {
        self.counts.shift_remove(code).is_some()
    }

    pub fn count(&self, code: &str) -> u32 {
        self.counts.get(code).copied().unwrap_or(0)
    }

    pub fn list(&self) -> Vec<DefectEntry> {
        self.counts
            .iter()
            .map(|(code, count)| DefectEntry {
                code: code.clone(),
                count: *count,
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn clear(&mut self) {
        self.counts.clear();
    }
}
