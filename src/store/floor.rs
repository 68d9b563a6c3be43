use crate::config::FeatureConfig;
use crate::error::{ScanError, ScanResult};
use crate::models::{Catalog, DefectView, Invoice, LineItem, LineItemView, ProductDetail};
use crate::store::DefectLedger;
use indexmap::IndexMap;
use std::collections::HashSet;

/// 所有工位共享的状态：目录、积压队列、不良台账、入库库存。
///
/// 整体放在一把锁后面，每次变更是一个不含 I/O 的短临界区。
#[derive(Debug, Default)]
pub struct FloorState {
    catalog: Option<Catalog>,
    /// 已完成且操作员已离开的发票；不良台账变化使其重新有剩余时自动回到积压队列
    retired: HashSet<String>,
    ledger: DefectLedger,
    incoming: IndexMap<String, u32>,
    features: FeatureConfig,
    /// 目录版本号，每次载入 +1
    generation: u64,
}

impl FloorState {
    pub fn new(features: FeatureConfig) -> Self {
        Self {
            features,
            ..Default::default()
        }
    }

    /// 替换目录：清空不良台账与已离开记录，版本号 +1
    pub fn install_catalog(&mut self, catalog: Catalog) {
        self.retired.clear();
        self.catalog = Some(catalog);
        self.ledger.clear();
        self.generation += 1;
    }

    pub fn set_incoming(&mut self, incoming: IndexMap<String, u32>) {
        self.incoming = incoming;
        if let Some(catalog) = self.catalog.as_mut() {
            catalog.apply_incoming(&self.incoming);
        }
    }

    pub fn incoming(&self) -> &IndexMap<String, u32> {
        &self.incoming
    }

    pub fn catalog(&self) -> ScanResult<&Catalog> {
        self.catalog.as_ref().ok_or(ScanError::CatalogNotLoaded)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn ledger(&self) -> &DefectLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut DefectLedger {
        &mut self.ledger
    }

    /// 积压队列：按载入顺序，排除已完成且已离开的发票
    pub fn backlog(&self) -> impl Iterator<Item = &Invoice> {
        self.catalog
            .iter()
            .flat_map(Catalog::invoices)
            .filter(move |inv| !(self.retired.contains(inv.id()) && self.complete(inv)))
    }

    pub fn backlog_len(&self) -> usize {
        self.backlog().count()
    }

    pub fn invoice(&self, invoice_id: &str) -> Option<&Invoice> {
        self.catalog.as_ref()?.get(invoice_id)
    }

    /// 扣减一件；不良数按能力开关计入
    pub fn consume(&mut self, invoice_id: &str, code: &str) -> Option<usize> {
        let defect = self.defect_count(code);
        self.catalog
            .as_mut()?
            .get_mut(invoice_id)?
            .consume(code, defect)
    }

    pub fn first_pending<'a>(&'a self, invoice: &'a Invoice) -> Option<&'a LineItem> {
        invoice.first_pending(|code| self.defect_count(code))
    }

    fn complete(&self, invoice: &Invoice) -> bool {
        invoice.is_complete(|code| self.defect_count(code))
    }

    /// 未知发票视为未完成
    pub fn is_complete(&self, invoice_id: &str) -> bool {
        self.invoice(invoice_id)
            .map(|inv| self.complete(inv))
            .unwrap_or(false)
    }

    pub fn code_remain(&self, invoice_id: &str, code: &str) -> u32 {
        self.invoice(invoice_id)
            .map(|inv| inv.code_remain(code, self.defect_count(code)))
            .unwrap_or(0)
    }

    pub fn has_defect(&self, invoice_id: &str) -> bool {
        self.invoice(invoice_id)
            .map(|inv| inv.has_defect(|code| self.defect_count(code)))
            .unwrap_or(false)
    }

    /// 操作员离开一张已完成的发票时记为已离开，返回是否新记录
    pub fn retire_if_complete(&mut self, invoice_id: &str) -> bool {
        self.is_complete(invoice_id) && self.retired.insert(invoice_id.to_string())
    }

    pub fn product(&self, code: &str) -> ProductDetail {
        self.catalog
            .as_ref()
            .and_then(|c| c.product(code))
            .cloned()
            .unwrap_or_default()
    }

    /// 计入不良数时遵循能力开关
    pub fn defect_count(&self, code: &str) -> u32 {
        if self.features.defects {
            self.ledger.count(code)
        } else {
            0
        }
    }

    pub fn line_item_views(&self, invoice_id: &str) -> Vec<LineItemView> {
        let Some(invoice) = self.invoice(invoice_id) else {
            return Vec::new();
        };
        invoice
            .items()
            .iter()
            .map(|item| {
                let defect = self.defect_count(&item.code);
                let detail = self.product(&item.code);
                LineItemView {
                    code: item.code.clone(),
                    name: detail.name,
                    option: detail.option,
                    required: item.required,
                    fulfilled: item.fulfilled,
                    remain: item.remain(defect),
                    run_length: self.visible_run_length(item.run_length),
                    incoming: if self.features.incoming { item.incoming } else { 0 },
                    defect,
                }
            })
            .collect()
    }

    pub fn visible_run_length(&self, run_length: u32) -> u32 {
        if self.features.run_length_hints {
            run_length
        } else {
            1
        }
    }

    pub fn defect_views(&self) -> Vec<DefectView> {
        self.ledger
            .list()
            .into_iter()
            .map(|entry| {
                let detail = self.product(&entry.code);
                DefectView {
                    code: entry.code,
                    count: entry.count,
                    name: detail.name,
                    option: detail.option,
                }
            })
            .collect()
    }
}
