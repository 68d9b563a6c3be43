use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// 发票明细行状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub code: String,
    /// 原始需求数量 (>= 1)
    pub required: u32,
    /// 已成功扫码数量
    pub fulfilled: u32,
    /// 入库库存，仅供参考，不限制扣减
    pub incoming: u32,
    /// 发票内与本行同码的连续行数
    pub run_length: u32,
}

impl LineItem {
    pub fn new(code: String, required: u32, incoming: u32) -> Self {
        Self {
            code,
            required,
            fulfilled: 0,
            incoming,
            run_length: 1,
        }
    }

    /// 派生剩余量 = max(required - fulfilled - defect, 0)
    pub fn remain(&self, defect: u32) -> u32 {
        self.required
            .saturating_sub(self.fulfilled)
            .saturating_sub(defect)
    }

    fn fulfill_one(&mut self) {
        debug_assert!(
            self.fulfilled < self.required,
            "line item {} over-fulfilled ({}/{})",
            self.code,
            self.fulfilled,
            self.required
        );
        self.fulfilled += 1;
    }
}

/// 发票及其有序明细
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoice {
    id: String,
    items: Vec<LineItem>,
}

impl Invoice {
    pub fn new(id: String, mut items: Vec<LineItem>) -> Self {
        assign_run_lengths(&mut items);
        Self { id, items }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// 按目录顺序第一条剩余 > 0 的明细。`defects` 给出每个商品码的有效不良数。
    pub fn first_pending<F>(&self, defects: F) -> Option<&LineItem>
    where
        F: Fn(&str) -> u32,
    {
        self.items
            .iter()
            .find(|item| item.remain(defects(&item.code)) > 0)
    }

    pub fn is_complete<F>(&self, defects: F) -> bool
    where
        F: Fn(&str) -> u32,
    {
        self.first_pending(defects).is_none()
    }

    /// 某商品码在本发票内的剩余合计
    pub fn code_remain(&self, code: &str, defect: u32) -> u32 {
        self.items
            .iter()
            .filter(|item| item.code == code)
            .map(|item| item.remain(defect))
            .sum()
    }

    /// 发票内是否有商品码存在不良登记
    pub fn has_defect<F>(&self, defects: F) -> bool
    where
        F: Fn(&str) -> u32,
    {
        self.items.iter().any(|item| defects(&item.code) > 0)
    }

    /// 扣减一件：从目录顺序最早的、剩余 > 0 的同码明细扣减。
    ///
    /// 无匹配时返回 `None` 且不做任何修改。
    pub fn consume(&mut self, code: &str, defect: u32) -> Option<usize> {
        let idx = self
            .items
            .iter()
            .position(|item| item.code == code && item.remain(defect) > 0)?;
        self.items[idx].fulfill_one();
        Some(idx)
    }

    pub fn apply_incoming(&mut self, incoming: &IndexMap<String, u32>) {
        for item in &mut self.items {
            item.incoming = incoming.get(&item.code).copied().unwrap_or(0);
        }
    }
}

/// 连续同码的明细共享同一个连续长度
fn assign_run_lengths(items: &mut [LineItem]) {
    let mut start = 0;
    while start < items.len() {
        let mut end = start + 1;
        while end < items.len() && items[end].code == items[start].code {
            end += 1;
        }
        let len = (end - start) as u32;
        for item in &mut items[start..end] {
            item.run_length = len;
        }
        start = end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invoice(codes: &[(&str, u32)]) -> Invoice {
        let items = codes
            .iter()
            .map(|(code, qty)| LineItem::new(code.to_string(), *qty, 0))
            .collect();
        Invoice::new("INV1".to_string(), items)
    }

    #[test]
    fn run_lengths_count_consecutive_codes_only() {
        let inv = invoice(&[("X", 1), ("X", 1), ("Y", 1), ("X", 1)]);
        let runs: Vec<u32> = inv.items().iter().map(|i| i.run_length).collect();
        assert_eq!(runs, vec![2, 2, 1, 1]);
    }

    fn no_defects(_: &str) -> u32 {
        0
    }

    #[test]
    fn consume_walks_line_items_in_order() {
        let mut inv = invoice(&[("X", 1), ("X", 1)]);
        assert_eq!(inv.consume("X", 0), Some(0));
        assert_eq!(inv.consume("X", 0), Some(1));
        assert_eq!(inv.consume("X", 0), None);
        assert!(inv.is_complete(no_defects));
    }

    #[test]
    fn defects_reduce_remain_but_never_below_zero() {
        let inv = invoice(&[("B1", 3)]);
        assert_eq!(inv.code_remain("B1", 1), 2);
        assert_eq!(inv.code_remain("B1", 6), 0);
        assert!(inv.is_complete(|code| if code == "B1" { 6 } else { 0 }));
        assert!(inv.has_defect(|code| if code == "B1" { 1 } else { 0 }));
    }

    #[test]
    fn unknown_code_is_not_consumed() {
        let mut inv = invoice(&[("A1", 1)]);
        let before = inv.clone();
        assert_eq!(inv.consume("ZZ", 0), None);
        assert_eq!(inv, before);
    }
}
