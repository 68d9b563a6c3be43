use crate::models::result::Preview;

/// 工位会话：当前发票游标
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FulfillmentSession {
    pub active_invoice: Option<String>,
    pub invoice_done: bool,
    pub next_preview: Option<Preview>,
    /// 会话所属的目录版本，目录重新载入后失效
    pub generation: u64,
}

impl FulfillmentSession {
    pub fn reset(&mut self) {
        self.active_invoice = None;
        self.invoice_done = false;
        self.next_preview = None;
    }

    pub fn has_active(&self) -> bool {
        self.active_invoice.is_some()
    }
}
