use crate::error::{ScanError, ScanResult};
use crate::models::invoice::{Invoice, LineItem};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 目录载入请求：外部导入组件解析表格后的结构化结果
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogLoad {
    pub invoices: Vec<InvoiceInput>,
    #[serde(default)]
    pub products: Vec<ProductInput>,
}

/// 发票 (按载入顺序)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceInput {
    pub id: String,
    pub items: Vec<LineItemInput>,
}

/// 发票明细行
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItemInput {
    pub code: String,
    pub quantity: u32,
}

/// 商品码 -> 品名/选项
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductInput {
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub option: String,
}

/// 入库库存载入请求 (商品码 -> 可用数量)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncomingLoad {
    pub counts: IndexMap<String, u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDetail {
    pub name: String,
    pub option: String,
}

/// 已载入的目录：发票按载入顺序保存，结构不可变，仅明细计数随扫码变化
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    invoices: IndexMap<String, Invoice>,
    products: HashMap<String, ProductDetail>,
}

impl Catalog {
    /// 校验并构建目录，同时预计算连续长度
    pub fn build(load: CatalogLoad, incoming: &IndexMap<String, u32>) -> ScanResult<Self> {
        let mut invoices = IndexMap::with_capacity(load.invoices.len());

        for input in load.invoices {
            let id = input.id.trim().to_string();
            if id.is_empty() {
                return Err(ScanError::invalid_catalog("invoice id is empty"));
            }
            if input.items.is_empty() {
                return Err(ScanError::invalid_catalog(format!("invoice {} has no items", id)));
            }

            let mut items = Vec::with_capacity(input.items.len());
            for item in input.items {
                let code = item.code.trim().to_string();
                if code.is_empty() {
                    return Err(ScanError::invalid_catalog(format!(
                        "invoice {} has an item without code",
                        id
                    )));
                }
                if item.quantity == 0 {
                    return Err(ScanError::invalid_catalog(format!(
                        "invoice {} item {} has quantity 0",
                        id, code
                    )));
                }
                let incoming = incoming.get(&code).copied().unwrap_or(0);
                items.push(LineItem::new(code, item.quantity, incoming));
            }

            if invoices.contains_key(&id) {
                return Err(ScanError::invalid_catalog(format!("duplicate invoice id {}", id)));
            }
            invoices.insert(id.clone(), Invoice::new(id, items));
        }

        let mut products = HashMap::with_capacity(load.products.len());
        for p in load.products {
            // 同一商品码以首次出现为准
            products
                .entry(p.code.trim().to_string())
                .or_insert(ProductDetail {
                    name: p.name.trim().to_string(),
                    option: p.option.trim().to_string(),
                });
        }

        Ok(Self { invoices, products })
    }

    pub fn get(&self, invoice_id: &str) -> Option<&Invoice> {
        self.invoices.get(invoice_id)
    }

    pub fn get_mut(&mut self, invoice_id: &str) -> Option<&mut Invoice> {
        self.invoices.get_mut(invoice_id)
    }

    pub fn contains(&self, invoice_id: &str) -> bool {
        self.invoices.contains_key(invoice_id)
    }

    /// 按载入顺序遍历
    pub fn invoices(&self) -> impl Iterator<Item = &Invoice> {
        self.invoices.values()
    }

    pub fn invoice_count(&self) -> usize {
        self.invoices.len()
    }

    pub fn line_item_count(&self) -> usize {
        self.invoices.values().map(|inv| inv.items().len()).sum()
    }

    pub fn product(&self, code: &str) -> Option<&ProductDetail> {
        self.products.get(code)
    }

    /// 刷新所有明细的入库数量
    pub fn apply_incoming(&mut self, incoming: &IndexMap<String, u32>) {
        for invoice in self.invoices.values_mut() {
            invoice.apply_incoming(incoming);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(code: &str, quantity: u32) -> LineItemInput {
        LineItemInput {
            code: code.to_string(),
            quantity,
        }
    }

    #[test]
    fn build_keeps_load_order_and_trims() {
        let load = CatalogLoad {
            invoices: vec![
                InvoiceInput { id: " 2000000002 ".into(), items: vec![item("B1", 1)] },
                InvoiceInput { id: "1000000001".into(), items: vec![item(" A1 ", 2)] },
            ],
            products: vec![],
        };
        let catalog = Catalog::build(load, &IndexMap::new()).unwrap();
        let ids: Vec<&str> = catalog.invoices().map(|inv| inv.id()).collect();
        assert_eq!(ids, vec!["2000000002", "1000000001"]);
        assert_eq!(catalog.get("1000000001").unwrap().items()[0].code, "A1");
    }

    #[test]
    fn duplicate_invoice_is_rejected() {
        let load = CatalogLoad {
            invoices: vec![
                InvoiceInput { id: "INV1".into(), items: vec![item("A1", 1)] },
                InvoiceInput { id: "INV1".into(), items: vec![item("A2", 1)] },
            ],
            products: vec![],
        };
        assert!(matches!(
            Catalog::build(load, &IndexMap::new()),
            Err(ScanError::InvalidCatalog(_))
        ));
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let load = CatalogLoad {
            invoices: vec![InvoiceInput { id: "INV1".into(), items: vec![item("A1", 0)] }],
            products: vec![],
        };
        assert!(Catalog::build(load, &IndexMap::new()).is_err());
    }

    #[test]
    fn first_product_detail_wins() {
        let load = CatalogLoad {
            invoices: vec![InvoiceInput { id: "INV1".into(), items: vec![item("A1", 1)] }],
            products: vec![
                ProductInput { code: "A1".into(), name: "Shirt".into(), option: "Red/M".into() },
                ProductInput { code: "A1".into(), name: "Other".into(), option: String::new() },
            ],
        };
        let catalog = Catalog::build(load, &IndexMap::new()).unwrap();
        assert_eq!(catalog.product("A1").unwrap().name, "Shirt");
    }

    #[test]
    fn incoming_is_attached_at_build() {
        let mut incoming = IndexMap::new();
        incoming.insert("A1".to_string(), 7);
        let load = CatalogLoad {
            invoices: vec![InvoiceInput { id: "INV1".into(), items: vec![item("A1", 1), item("B1", 1)] }],
            products: vec![],
        };
        let catalog = Catalog::build(load, &incoming).unwrap();
        let items = catalog.get("INV1").unwrap().items();
        assert_eq!(items[0].incoming, 7);
        assert_eq!(items[1].incoming, 0);
    }
}
