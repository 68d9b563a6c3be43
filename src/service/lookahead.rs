use crate::config::LookaheadConfig;
use crate::models::{Invoice, LineItem, Preview};
use crate::store::FloorState;

/// 下一件预测。只读，相同状态必然得到相同结果。
///
/// 1. 当前发票中目录顺序最早的剩余 > 0 明细；
/// 2. 否则按载入顺序扫描积压队列 (排除当前发票)，取第一张有剩余的发票的第一条；
/// 3. 都没有则为空。
///
/// 无当前发票时不做预测。
pub fn predict(
    floor: &FloorState,
    active_invoice: Option<&str>,
    options: &LookaheadConfig,
) -> Option<Preview> {
    let active_id = active_invoice?;

    if let Some(item) = floor
        .invoice(active_id)
        .and_then(|inv| floor.first_pending(inv))
    {
        return Some(preview(floor, active_id, item, false));
    }

    floor
        .backlog()
        .filter(|inv| inv.id() != active_id)
        .find_map(|inv| cross_invoice_candidate(floor, inv, options))
}

fn cross_invoice_candidate(
    floor: &FloorState,
    invoice: &Invoice,
    options: &LookaheadConfig,
) -> Option<Preview> {
    let item = floor.first_pending(invoice)?;
    if let Some(limit) = options.skip_run_length_at {
        // 大批量连续码另行处理，不作为跨发票预测
        if item.run_length >= limit {
            return None;
        }
    }
    Some(preview(floor, invoice.id(), item, true))
}

fn preview(floor: &FloorState, invoice_id: &str, item: &LineItem, other_invoice: bool) -> Preview {
    let detail = floor.product(&item.code);
    Preview {
        invoice_id: invoice_id.to_string(),
        code: item.code.clone(),
        name: detail.name,
        option: detail.option,
        remain: item.remain(floor.defect_count(&item.code)),
        run_length: floor.visible_run_length(item.run_length),
        other_invoice,
    }
}
