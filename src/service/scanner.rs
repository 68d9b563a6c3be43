use crate::config::{AppConfig, FeatureConfig, LookaheadConfig};
use crate::error::{ScanError, ScanResult};
use crate::models::{
    ActivateOutcome, ActivateResult, Catalog, CatalogLoad, CatalogSummary, ConsumeOutcome,
    ConsumeResult, DefectOutcome, DefectView, FeedbackEvent, FulfillmentSession, IncomingLoad,
    IncomingSummary, OpResult, ScanOutcome, StatusSnapshot,
};
use crate::service::classifier::{CodeNormalizer, ScanClassifier, ScanKind};
use crate::service::export;
use crate::service::feedback::{FeedbackSink, StationEvent};
use crate::service::lookahead;
use crate::store::FloorState;
use chrono::Utc;
use dashmap::mapref::one::RefMut;
use dashmap::DashMap;
use indexmap::IndexMap;
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DefectOp {
    Add,
    Decrement,
    Remove,
}

/// 拣货扫码服务
///
/// 目录、积压队列、不良台账由一把锁保护；每个工位一个会话。
/// 加锁顺序固定为 会话 -> 共享状态。
pub struct ScanService {
    floor: Mutex<FloorState>,
    sessions: DashMap<String, FulfillmentSession>,
    classifier: ScanClassifier,
    normalizer: CodeNormalizer,
    features: FeatureConfig,
    lookahead: LookaheadConfig,
    feedback: Arc<dyn FeedbackSink>,
}

impl ScanService {
    pub fn new(config: &AppConfig, feedback: Arc<dyn FeedbackSink>) -> ScanResult<Self> {
        Ok(Self {
            floor: Mutex::new(FloorState::new(config.features)),
            sessions: DashMap::new(),
            classifier: ScanClassifier::from_config(&config.scan)?,
            normalizer: CodeNormalizer::from_config(&config.scan)?,
            features: config.features,
            lookahead: config.lookahead,
            feedback,
        })
    }

    /// 载入目录：清空不良台账，所有工位会话失效
    pub fn load_catalog(&self, load: CatalogLoad) -> ScanResult<CatalogSummary> {
        let (summary, generation) = {
            let mut floor = self.floor.lock();
            let catalog = Catalog::build(load, floor.incoming())?;
            let summary = CatalogSummary {
                invoices: catalog.invoice_count(),
                line_items: catalog.line_item_count(),
            };
            floor.install_catalog(catalog);
            (summary, floor.generation())
        };

        // 不持有共享状态锁时清理旧版本会话
        let before = self.station_count();
        self.sessions.retain(|_, session| session.generation == generation);

        tracing::info!(
            "Catalog loaded: {} invoices, {} line items (generation {}, {} stale sessions dropped)",
            summary.invoices,
            summary.line_items,
            generation,
            before.saturating_sub(self.station_count())
        );
        Ok(summary)
    }

    /// 载入入库库存 (仅供参考)
    pub fn load_incoming(&self, load: IncomingLoad) -> ScanResult<IncomingSummary> {
        if !self.features.incoming {
            return Err(ScanError::FeatureDisabled("incoming"));
        }

        let mut counts: IndexMap<String, u32> = IndexMap::new();
        for (raw, qty) in load.counts {
            let code = self.normalizer.normalize(&raw);
            if code.is_empty() || qty == 0 {
                continue;
            }
            let total = counts.entry(code).or_insert(0);
            *total = total.saturating_add(qty);
        }
        let summary = IncomingSummary {
            codes: counts.len(),
            total_qty: counts.values().map(|&q| u64::from(q)).sum(),
        };

        self.floor.lock().set_incoming(counts);
        tracing::info!(
            "Incoming stock loaded: {} codes, {} units",
            summary.codes,
            summary.total_qty
        );
        Ok(summary)
    }

    /// 统一入口：先分类再分派
    pub fn scan(&self, station: &str, raw: &str) -> ScanResult<ScanOutcome> {
        let value = non_empty(raw, "value")?;
        let outcome = {
            let (mut session, mut floor) = self.lock_station(station);
            floor.catalog()?;
            match self.classifier.classify(value, session.has_active()) {
                ScanKind::Invoice => {
                    ScanOutcome::Invoice(self.activate_locked(&mut session, &mut floor, value))
                }
                ScanKind::Item => {
                    let code = self.normalizer.normalize(value);
                    ScanOutcome::Item(self.consume_locked(&mut session, &mut floor, code))
                }
            }
        };

        match &outcome {
            ScanOutcome::Invoice(o) => self.emit_activate(station, o),
            ScanOutcome::Item(o) => self.emit_consume(station, o),
        }
        Ok(outcome)
    }

    pub fn activate_invoice(&self, station: &str, raw: &str) -> ScanResult<ActivateOutcome> {
        let invoice_id = non_empty(raw, "invoice_id")?;
        let outcome = {
            let (mut session, mut floor) = self.lock_station(station);
            floor.catalog()?;
            self.activate_locked(&mut session, &mut floor, invoice_id)
        };
        self.emit_activate(station, &outcome);
        Ok(outcome)
    }

    pub fn consume_item(&self, station: &str, raw: &str) -> ScanResult<ConsumeOutcome> {
        let code = self.normalizer.normalize(non_empty(raw, "code")?);
        let outcome = {
            let (mut session, mut floor) = self.lock_station(station);
            floor.catalog()?;
            self.consume_locked(&mut session, &mut floor, code)
        };
        self.emit_consume(station, &outcome);
        Ok(outcome)
    }

    pub fn add_defect(&self, station: &str, raw: &str) -> ScanResult<DefectOutcome> {
        self.edit_defect(station, raw, DefectOp::Add)
    }

    pub fn decrement_defect(&self, station: &str, raw: &str) -> ScanResult<DefectOutcome> {
        self.edit_defect(station, raw, DefectOp::Decrement)
    }

    pub fn remove_defect(&self, station: &str, raw: &str) -> ScanResult<DefectOutcome> {
        self.edit_defect(station, raw, DefectOp::Remove)
    }

    /// 不良台账快照 (登记顺序)
    pub fn defects(&self) -> ScanResult<Vec<DefectView>> {
        let floor = self.floor.lock();
        floor.catalog()?;
        Ok(floor.defect_views())
    }

    pub fn export_defects(&self) -> ScanResult<Vec<u8>> {
        if !self.features.defects {
            return Err(ScanError::FeatureDisabled("defects"));
        }
        let defects = self.defects()?;
        if defects.is_empty() {
            return Err(ScanError::EmptyLedger);
        }
        export::defects_csv(&defects)
    }

    /// 工位快照。只读，不会为未知工位建立会话。
    pub fn status(&self, station: &str) -> ScanResult<StatusSnapshot> {
        let session = self.sessions.get(station);
        let floor = self.floor.lock();
        let Ok(catalog) = floor.catalog() else {
            return Ok(StatusSnapshot {
                result: OpResult::Ok,
                catalog_loaded: false,
                invoice_count: 0,
                backlog_len: 0,
                current_invoice: None,
                invoice_done: false,
                invoice_has_defect: false,
                items: Vec::new(),
                preview: None,
                defects: Vec::new(),
            });
        };
        let invoice_count = catalog.invoice_count();

        // 旧目录版本的会话等同于空会话
        let (active, invoice_done) = session
            .as_deref()
            .filter(|s| s.generation == floor.generation())
            .map(|s| (s.active_invoice.clone(), s.invoice_done))
            .unwrap_or((None, false));
        let invoice_has_defect = active
            .as_deref()
            .map(|id| self.invoice_has_defect(&floor, id))
            .unwrap_or(false);

        Ok(StatusSnapshot {
            result: OpResult::Ok,
            catalog_loaded: true,
            invoice_count,
            backlog_len: floor.backlog_len(),
            invoice_done,
            invoice_has_defect,
            items: active
                .as_deref()
                .map(|id| floor.line_item_views(id))
                .unwrap_or_default(),
            preview: lookahead::predict(&floor, active.as_deref(), &self.lookahead),
            defects: floor.defect_views(),
            current_invoice: active,
        })
    }

    /// 取得工位会话与共享状态的锁；目录版本变化时重置会话
    fn lock_station(
        &self,
        station: &str,
    ) -> (
        RefMut<'_, String, FulfillmentSession>,
        MutexGuard<'_, FloorState>,
    ) {
        let mut session = self.sessions.entry(station.to_string()).or_default();
        let floor = self.floor.lock();
        if session.generation != floor.generation() {
            session.reset();
            session.generation = floor.generation();
        }
        (session, floor)
    }

    fn activate_locked(
        &self,
        session: &mut FulfillmentSession,
        floor: &mut FloorState,
        invoice_id: &str,
    ) -> ActivateOutcome {
        let previous = session.active_invoice.take();
        if let Some(prev) = previous.as_deref().filter(|prev| *prev != invoice_id) {
            if floor.retire_if_complete(prev) {
                tracing::info!("Invoice {} retired from backlog", prev);
            }
        }

        let Some(invoice) = floor.invoice(invoice_id) else {
            tracing::warn!("Invoice {} not found, session reset", invoice_id);
            session.reset();
            session.next_preview = lookahead::predict(floor, None, &self.lookahead);
            return ActivateOutcome {
                result: ActivateResult::NotFound,
                invoice_id: invoice_id.to_string(),
                items: Vec::new(),
                preview: session.next_preview.clone(),
                invoice_has_defect: false,
                invoice_done: false,
                events: Vec::new(),
            };
        };

        // 重复扫同一张发票不影响已扫数量
        session.invoice_done = floor.is_complete(invoice.id());
        session.active_invoice = Some(invoice_id.to_string());

        let invoice_has_defect = self.invoice_has_defect(floor, invoice_id);
        let mut events = Vec::new();
        if invoice_has_defect {
            events.push(FeedbackEvent::InvoiceHasDefect);
        }
        session.next_preview = lookahead::predict(floor, Some(invoice_id), &self.lookahead);

        tracing::info!(
            "Invoice {} activated (done: {}, has defect: {})",
            invoice_id,
            session.invoice_done,
            invoice_has_defect
        );

        ActivateOutcome {
            result: ActivateResult::Ok,
            invoice_id: invoice_id.to_string(),
            items: floor.line_item_views(invoice_id),
            preview: session.next_preview.clone(),
            invoice_has_defect,
            invoice_done: session.invoice_done,
            events,
        }
    }

    fn consume_locked(
        &self,
        session: &mut FulfillmentSession,
        floor: &mut FloorState,
        code: String,
    ) -> ConsumeOutcome {
        let detail = floor.product(&code);

        let Some(invoice_id) = session.active_invoice.clone() else {
            return ConsumeOutcome {
                result: ConsumeResult::NoInvoice,
                invoice_id: None,
                code,
                remain: 0,
                name: detail.name,
                option: detail.option,
                invoice_done: false,
                items: Vec::new(),
                preview: None,
                events: Vec::new(),
            };
        };

        let consumed = floor.consume(&invoice_id, &code).is_some();
        let remain = floor.code_remain(&invoice_id, &code);
        let complete = floor.is_complete(&invoice_id);

        let mut events = Vec::new();
        if consumed {
            events.push(FeedbackEvent::ItemOk);
            if remain == 0 {
                events.push(FeedbackEvent::ItemDone);
            }
            if complete {
                events.push(FeedbackEvent::InvoiceDone);
                tracing::info!("Invoice {} done", invoice_id);
            }
        } else {
            events.push(FeedbackEvent::ItemWrong);
            tracing::warn!("Wrong scan {} on invoice {}", code, invoice_id);
        }
        session.invoice_done = complete;
        session.next_preview = lookahead::predict(floor, Some(&invoice_id), &self.lookahead);

        ConsumeOutcome {
            result: if consumed {
                ConsumeResult::True
            } else {
                ConsumeResult::False
            },
            items: floor.line_item_views(&invoice_id),
            invoice_id: Some(invoice_id),
            code,
            remain,
            name: detail.name,
            option: detail.option,
            invoice_done: complete,
            preview: session.next_preview.clone(),
            events,
        }
    }

    fn edit_defect(&self, station: &str, raw: &str, op: DefectOp) -> ScanResult<DefectOutcome> {
        if !self.features.defects {
            return Err(ScanError::FeatureDisabled("defects"));
        }
        let code = self.normalizer.normalize(non_empty(raw, "code")?);

        let (mut session, mut floor) = self.lock_station(station);
        floor.catalog()?;

        let ledger = floor.ledger_mut();
        let changed = match op {
            DefectOp::Add => {
                ledger.add(&code);
                true
            }
            DefectOp::Decrement => ledger.decrement(&code),
            DefectOp::Remove => ledger.remove(&code),
        };
        let defect_count = floor.ledger().count(&code);
        if changed {
            tracing::info!("Defect {:?} {} -> {}", op, code, defect_count);
        }

        let active = session.active_invoice.clone();
        if let Some(id) = active.as_deref() {
            session.invoice_done = floor.is_complete(id);
        }
        session.next_preview = lookahead::predict(&floor, active.as_deref(), &self.lookahead);

        Ok(DefectOutcome {
            result: OpResult::Ok,
            code,
            defect_count,
            changed,
            defects: floor.defect_views(),
            items: active
                .as_deref()
                .map(|id| floor.line_item_views(id))
                .unwrap_or_default(),
            preview: session.next_preview.clone(),
        })
    }

    fn invoice_has_defect(&self, floor: &FloorState, invoice_id: &str) -> bool {
        floor.has_defect(invoice_id)
    }

    /// 当前持有会话的工位数
    pub fn station_count(&self) -> usize {
        self.sessions.len()
    }

    fn emit_activate(&self, station: &str, outcome: &ActivateOutcome) {
        self.emit(station, Some(&outcome.invoice_id), None, &outcome.events);
    }

    fn emit_consume(&self, station: &str, outcome: &ConsumeOutcome) {
        self.emit(
            station,
            outcome.invoice_id.as_deref(),
            Some(&outcome.code),
            &outcome.events,
        );
    }

    fn emit(&self, station: &str, invoice_id: Option<&str>, code: Option<&str>, events: &[FeedbackEvent]) {
        let at = Utc::now();
        for &event in events {
            self.feedback.emit(&StationEvent {
                station: station.to_string(),
                event,
                invoice_id: invoice_id.map(str::to_string),
                code: code.map(str::to_string),
                at,
            });
        }
    }
}

fn non_empty<'a>(raw: &'a str, field: &'static str) -> ScanResult<&'a str> {
    let value = raw.trim();
    if value.is_empty() {
        Err(ScanError::EmptyInput(field))
    } else {
        Ok(value)
    }
}
