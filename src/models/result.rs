use serde::{Deserialize, Serialize};

/// 明细视图 (含派生剩余量)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemView {
    pub code: String,
    pub name: String,
    pub option: String,
    pub required: u32,
    pub fulfilled: u32,
    pub remain: u32,
    pub run_length: u32,
    pub incoming: u32,
    pub defect: u32,
}

/// 下一件预测
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preview {
    pub invoice_id: String,
    pub code: String,
    pub name: String,
    pub option: String,
    pub remain: u32,
    pub run_length: u32,
    /// 预测落在当前发票之外
    pub other_invoice: bool,
}

/// 不良台账视图
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefectView {
    pub code: String,
    pub count: u32,
    pub name: String,
    pub option: String,
}

/// 反馈事件：驱动声音/画面提示
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedbackEvent {
    ItemOk,
    ItemWrong,
    ItemDone,
    InvoiceDone,
    InvoiceHasDefect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivateResult {
    NotFound,
    Ok,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsumeResult {
    NoInvoice,
    True,
    False,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OpResult {
    Ok,
}

/// 发票扫码结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivateOutcome {
    pub result: ActivateResult,
    pub invoice_id: String,
    pub items: Vec<LineItemView>,
    pub preview: Option<Preview>,
    pub invoice_has_defect: bool,
    pub invoice_done: bool,
    pub events: Vec<FeedbackEvent>,
}

/// 商品扫码结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumeOutcome {
    pub result: ConsumeResult,
    pub invoice_id: Option<String>,
    pub code: String,
    pub remain: u32,
    pub name: String,
    pub option: String,
    pub invoice_done: bool,
    pub items: Vec<LineItemView>,
    pub preview: Option<Preview>,
    pub events: Vec<FeedbackEvent>,
}

/// 不良台账操作结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefectOutcome {
    pub result: OpResult,
    pub code: String,
    pub defect_count: u32,
    pub changed: bool,
    pub defects: Vec<DefectView>,
    pub items: Vec<LineItemView>,
    pub preview: Option<Preview>,
}

/// 工位状态快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub result: OpResult,
    pub catalog_loaded: bool,
    pub invoice_count: usize,
    pub backlog_len: usize,
    pub current_invoice: Option<String>,
    pub invoice_done: bool,
    pub invoice_has_defect: bool,
    pub items: Vec<LineItemView>,
    pub preview: Option<Preview>,
    pub defects: Vec<DefectView>,
}

/// 统一扫码入口结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanOutcome {
    Invoice(ActivateOutcome),
    Item(ConsumeOutcome),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSummary {
    pub invoices: usize,
    pub line_items: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingSummary {
    pub codes: usize,
    pub total_qty: u64,
}
